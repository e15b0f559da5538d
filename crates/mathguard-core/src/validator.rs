//! Validation of every math span in a text.
//!
//! Two strategies are provided:
//!
//! - [`Validator::validate`] scans the text directly. It is authoritative: every open
//!   marker is accounted for, unclosed delimiters are reported, and positions are
//!   exact byte offsets of the open marker.
//! - [`Validator::validate_segmented`] runs [`segment`](crate::segment::segment) first
//!   and renders each math span. Its positions are a running sum of segment lengths and
//!   are only approximate; it cannot see unclosed delimiters because segmentation stops
//!   at the first one.
//!
//! The engine always receives the text between the markers from the direct strategy.
//! The segmented strategy hands environments (`\begin{..}..\end{..}`) over whole, so
//! the two can disagree on them: `a &= b` is rejected on its own while
//! `\begin{align}a &= b\end{align}` is accepted.

use crate::compare::StrategyComparison;
use crate::delimiters::{CloseMarker, DelimiterTable};
use crate::scanner::find_span_close;
use crate::segment::{Segment, SegmentError, Segments};
use log::{debug, trace};
use mathguard_engine::{MacroMap, RenderEngine, RenderError, RenderOptions};
use serde::{Deserialize, Serialize};
use std::fmt;

const EXCERPT_CHARS: usize = 50;

/// The category of a [`ValidationError`]. Serialized with the wire names used by the
/// JSON responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "unclosed")]
    UnclosedDelimiter,
    #[serde(rename = "katex_error")]
    EngineSyntaxError,
    #[serde(rename = "invalid_syntax")]
    SegmentationFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UnclosedDelimiter => "unclosed",
            ErrorKind::EngineSyntaxError => "katex_error",
            ErrorKind::SegmentationFailure => "invalid_syntax",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem found in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub message: String,
    /// Byte offset into the source text.
    pub position: usize,
    /// Byte length of the offending construct.
    pub length: usize,
    #[serde(rename = "latex")]
    pub excerpt: String,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl ValidationError {
    fn unclosed(text: &str, position: usize, open: &str) -> Self {
        let mut excerpt: String = text[position..].chars().take(EXCERPT_CHARS).collect();
        excerpt.push_str("...");
        Self {
            message: format!("Unclosed LaTeX delimiter: \"{open}\" at position {position}"),
            position,
            length: open.len(),
            excerpt,
            kind: ErrorKind::UnclosedDelimiter,
        }
    }

    fn engine(error: &RenderError, position: usize, raw: &str) -> Self {
        Self {
            message: format!("Invalid LaTeX syntax: {}", error.message),
            position,
            length: raw.len(),
            excerpt: raw.to_string(),
            kind: ErrorKind::EngineSyntaxError,
        }
    }

    fn segmentation(text: &str, error: &SegmentError) -> Self {
        Self {
            message: format!("Parsing error: {error}"),
            position: 0,
            length: text.len(),
            excerpt: text.to_string(),
            kind: ErrorKind::SegmentationFailure,
        }
    }
}

/// Outcome of a validation call. `is_valid` holds exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validation settings: an engine, a delimiter table and optional macros.
///
/// A `Validator` holds only borrows and is cheap to copy. Every call is independent.
///
/// ```
/// use mathguard_core::{KatexEngine, Validator};
///
/// let engine = KatexEngine;
/// let validator = Validator::new(&engine);
/// assert!(validator.is_valid(r"This is valid LaTeX: \(x = \frac{a}{b}\)"));
///
/// let result = validator.validate(r"\(x = \frac{a{b}\)");
/// assert_eq!(result.errors.len(), 1);
/// assert_eq!(result.errors[0].excerpt, r"\(x = \frac{a{b}\)");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    engine: &'a dyn RenderEngine,
    table: &'a DelimiterTable,
    macros: Option<&'a MacroMap>,
}

impl<'a> Validator<'a> {
    /// A validator using the shared default delimiter table and no macros.
    pub fn new(engine: &'a dyn RenderEngine) -> Self {
        Self {
            engine,
            table: DelimiterTable::shared(),
            macros: None,
        }
    }

    pub fn with_table(mut self, table: &'a DelimiterTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_macros(mut self, macros: Option<&'a MacroMap>) -> Self {
        self.macros = macros;
        self
    }

    pub fn table(&self) -> &'a DelimiterTable {
        self.table
    }

    fn render(&self, content: &str, display_mode: bool) -> Result<(), RenderError> {
        trace!(
            "rendering {} bytes with {} (display={})",
            content.len(),
            self.engine.name(),
            display_mode
        );
        let options = RenderOptions {
            display_mode,
            macros: self.macros,
        };
        self.engine.render(content, &options)
    }

    /// Validates `text` by scanning it directly for open markers.
    ///
    /// Errors come out in left-to-right order. After an unclosed delimiter the scan
    /// resumes just past its open marker, so delimiters nested inside it are still
    /// checked.
    pub fn validate(&self, text: &str) -> ValidationResult {
        let mut errors = Vec::new();
        let mut position = 0;

        while let Some(open_at) = self.table.find_open(text, position) {
            let Some(spec) = self.table.spec_at(text, open_at) else {
                position = open_at + 1;
                continue;
            };
            let content_start = open_at + spec.open.len();

            let close = match &spec.close {
                CloseMarker::SelfTerminating => {
                    position = content_start;
                    continue;
                }
                CloseMarker::Paired(close) => close,
            };

            let Some(close_at) = find_span_close(close, text, content_start) else {
                debug!("Unclosed delimiter {:?} at byte {}", spec.open, open_at);
                errors.push(ValidationError::unclosed(text, open_at, &spec.open));
                position = content_start;
                continue;
            };

            let end = close_at + close.len();
            let raw = &text[open_at..end];
            let content = &text[content_start..close_at];

            if let Err(error) = self.render(content, spec.display_mode) {
                debug!("Engine rejected span at byte {}: {}", open_at, error);
                errors.push(ValidationError::engine(&error, open_at, raw));
            }
            position = end;
        }

        ValidationResult::from_errors(errors)
    }

    /// Validates `text` span by span over its segmentation.
    ///
    /// Error positions are the sum of the raw lengths of the preceding segments.
    pub fn validate_segmented(&self, text: &str) -> ValidationResult {
        self.validate_segments(text, Segments::new(text, self.table))
    }

    /// Renders the math spans of `segments`, a segmentation of `text`.
    ///
    /// A segmentation error ends the walk with a single `invalid_syntax` error covering
    /// the whole text. [`Segments`] only fails when the table's own open pattern
    /// disagrees with its specs.
    fn validate_segments<'t>(
        &self,
        text: &str,
        segments: impl IntoIterator<Item = Result<Segment<'t>, SegmentError>>,
    ) -> ValidationResult {
        let mut errors = Vec::new();
        let mut position = 0;

        for segment in segments {
            let segment = match segment {
                Ok(segment) => segment,
                Err(error) => {
                    debug!("Segmentation failed: {}", error);
                    errors.push(ValidationError::segmentation(text, &error));
                    break;
                }
            };

            if let Segment::MathSpan {
                content,
                raw,
                display_mode,
            } = segment
            {
                if let Err(error) = self.render(content, display_mode) {
                    debug!("Engine rejected segment at byte {}: {}", position, error);
                    errors.push(ValidationError::engine(&error, position, raw));
                }
            }
            position += segment.raw().len();
        }

        ValidationResult::from_errors(errors)
    }

    pub fn is_valid(&self, text: &str) -> bool {
        self.validate(text).is_valid
    }

    /// Runs both strategies over `text`.
    pub fn compare(&self, text: &str) -> StrategyComparison {
        StrategyComparison::new(self.validate(text), self.validate_segmented(text))
    }
}

/// [`Validator::validate`] with the default table and no macros.
pub fn validate(text: &str, engine: &dyn RenderEngine) -> ValidationResult {
    Validator::new(engine).validate(text)
}

/// [`Validator::validate_segmented`] with the default table and no macros.
pub fn validate_segmented(text: &str, engine: &dyn RenderEngine) -> ValidationResult {
    Validator::new(engine).validate_segmented(text)
}

pub fn is_valid(text: &str, engine: &dyn RenderEngine) -> bool {
    Validator::new(engine).is_valid(text)
}

/// [`Validator::compare`] with the default table and no macros.
pub fn compare_strategies(text: &str, engine: &dyn RenderEngine) -> StrategyComparison {
    Validator::new(engine).compare(text)
}

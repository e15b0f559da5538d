//! Splitting text into plain-text and math-span segments.

use crate::delimiters::{CloseMarker, DelimiterTable};
use crate::scanner::find_span_close;
use serde::Serialize;
use std::iter::FusedIterator;
use thiserror::Error;

const ENVIRONMENT_PREFIX: &str = "\\begin{";

/// One piece of the partition of a source text.
///
/// Concatenating [`Segment::raw`] over all segments reproduces the source exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Segment<'a> {
    #[serde(rename = "text")]
    PlainText { content: &'a str },
    #[serde(rename = "math")]
    MathSpan {
        /// What the rendering engine sees: the inner text, or the whole raw span for
        /// `\begin{..}` environments.
        content: &'a str,
        #[serde(rename = "rawContent")]
        raw: &'a str,
        #[serde(rename = "displayMode")]
        display_mode: bool,
    },
    /// An occurrence of a self-terminating delimiter such as `\item`.
    #[serde(rename = "marker")]
    Marker { raw: &'a str },
}

impl<'a> Segment<'a> {
    /// The exact source slice this segment covers.
    pub fn raw(&self) -> &'a str {
        match *self {
            Segment::PlainText { content } => content,
            Segment::MathSpan { raw, .. } => raw,
            Segment::Marker { raw } => raw,
        }
    }

    pub fn is_math(&self) -> bool {
        matches!(self, Segment::MathSpan { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("no delimiter matches the open marker found at byte {position}")]
    UnresolvedMarker { position: usize },
}

/// Lazy segmentation of a text. See [`segment`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    table: &'a DelimiterTable,
    position: usize,
    pending: Option<Result<Segment<'a>, SegmentError>>,
    done: bool,
}

impl<'a> Segments<'a> {
    pub fn new(text: &'a str, table: &'a DelimiterTable) -> Self {
        Self {
            text,
            table,
            position: 0,
            pending: None,
            done: false,
        }
    }

    /// Resolves the delimiter opening at `open_at`.
    ///
    /// `Ok(None)` means the delimiter never closes; the caller then treats the rest
    /// of the text as plain.
    fn delimited_at(&mut self, open_at: usize) -> Result<Option<Segment<'a>>, SegmentError> {
        let text = self.text;
        let spec = self
            .table
            .spec_at(text, open_at)
            .ok_or(SegmentError::UnresolvedMarker { position: open_at })?;
        let content_start = open_at + spec.open.len();

        let close = match &spec.close {
            CloseMarker::SelfTerminating => {
                self.position = content_start;
                return Ok(Some(Segment::Marker {
                    raw: &text[open_at..content_start],
                }));
            }
            CloseMarker::Paired(close) => close,
        };

        let Some(close_at) = find_span_close(close, text, content_start) else {
            return Ok(None);
        };
        let end = close_at + close.len();
        let raw = &text[open_at..end];
        let content = if raw.starts_with(ENVIRONMENT_PREFIX) {
            raw
        } else {
            &text[content_start..close_at]
        };

        self.position = end;
        Ok(Some(Segment::MathSpan {
            content,
            raw,
            display_mode: spec.display_mode,
        }))
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Result<Segment<'a>, SegmentError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(pending) = self.pending.take() {
            return Some(pending);
        }
        if self.done || self.position >= self.text.len() {
            self.done = true;
            return None;
        }

        let start = self.position;
        let Some(open_at) = self.table.find_open(self.text, start) else {
            self.done = true;
            return Some(Ok(Segment::PlainText {
                content: &self.text[start..],
            }));
        };

        let next = match self.delimited_at(open_at) {
            Ok(Some(segment)) => Ok(segment),
            Ok(None) => {
                self.done = true;
                Ok(Segment::PlainText {
                    content: &self.text[open_at..],
                })
            }
            Err(error) => {
                self.done = true;
                Err(error)
            }
        };

        if open_at > start {
            self.pending = Some(next);
            Some(Ok(Segment::PlainText {
                content: &self.text[start..open_at],
            }))
        } else {
            Some(next)
        }
    }
}

impl FusedIterator for Segments<'_> {}

/// Splits `text` into a total partition of plain text, math spans and markers.
///
/// Segmentation stops at the first open marker that never closes: the plain text
/// before it is emitted as usual, then everything from the marker to the end of the
/// text becomes one final [`Segment::PlainText`]. Detecting that condition is left to
/// the validator.
///
/// ```
/// use mathguard_core::delimiters::DelimiterTable;
/// use mathguard_core::segment::{segment, Segment};
///
/// let segments = segment(r"Display math: \[E = mc^2\]", DelimiterTable::shared())?;
/// assert_eq!(
///     segments,
///     vec![
///         Segment::PlainText { content: "Display math: " },
///         Segment::MathSpan { content: "E = mc^2", raw: r"\[E = mc^2\]", display_mode: true },
///     ]
/// );
/// # Ok::<(), mathguard_core::segment::SegmentError>(())
/// ```
pub fn segment<'a>(
    text: &'a str,
    table: &'a DelimiterTable,
) -> Result<Vec<Segment<'a>>, SegmentError> {
    Segments::new(text, table).collect()
}

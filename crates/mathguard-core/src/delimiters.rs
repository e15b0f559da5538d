//! The delimiter table: which markers open and close a math span.
//!
//! ## Priority
//!
//! The table is an explicit total order. When several open markers could start at the
//! same position, the first entry in the table wins. [`default_delimiters`] is a
//! committed ordering: an environment such as `\begin{align*}` is listed before any
//! entry that could shadow it, and `\section*{` precedes `\section{`.
//!
//! ## Self-terminating markers
//!
//! A marker with no closing counterpart (`\item`) is modelled as
//! [`CloseMarker::SelfTerminating`] rather than as an empty close string. It marks a
//! position, carries no content, and is never validated.
//!
//! ## Currency
//!
//! A bare `$` is deliberately *not* a delimiter in the default table, so prose like
//! `The price is $5` never produces a math span.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Contract violations in a delimiter table.
#[derive(Debug, Error)]
pub enum DelimiterTableError {
    #[error("delimiter table is empty")]
    Empty,
    #[error("delimiter open marker must not be empty")]
    EmptyOpen,
    #[error("duplicate open marker {0:?}")]
    DuplicateOpen(String),
    #[error("failed to build open-marker search: {0}")]
    Pattern(#[from] regex::Error),
}

/// How a math span ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseMarker {
    /// The span ends at the first matching occurrence of this marker.
    Paired(String),
    /// The open marker stands alone and has no content.
    SelfTerminating,
}

impl CloseMarker {
    /// The marker text; empty for [`CloseMarker::SelfTerminating`].
    pub fn as_str(&self) -> &str {
        match self {
            CloseMarker::Paired(close) => close,
            CloseMarker::SelfTerminating => "",
        }
    }
}

/// One (open, close, display mode) entry of a [`DelimiterTable`].
///
/// In JSON a spec is written `{ "open": "\\(", "close": "\\)", "displayMode": false }`;
/// `left`, `right` and `display` are accepted as aliases. An empty `close` means the
/// marker is self-terminating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDelimiterSpec", into = "RawDelimiterSpec")]
pub struct DelimiterSpec {
    pub open: String,
    pub close: CloseMarker,
    pub display_mode: bool,
}

impl DelimiterSpec {
    /// Creates a spec; an empty `close` makes it self-terminating.
    pub fn new(open: impl Into<String>, close: impl Into<String>, display_mode: bool) -> Self {
        let close = close.into();
        Self {
            open: open.into(),
            close: if close.is_empty() {
                CloseMarker::SelfTerminating
            } else {
                CloseMarker::Paired(close)
            },
            display_mode,
        }
    }

    pub fn self_terminating(open: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: CloseMarker::SelfTerminating,
            display_mode: false,
        }
    }

    pub fn is_self_terminating(&self) -> bool {
        self.close == CloseMarker::SelfTerminating
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDelimiterSpec {
    #[serde(alias = "left")]
    open: String,
    #[serde(alias = "right", default)]
    close: String,
    #[serde(alias = "display", default)]
    display_mode: bool,
}

impl TryFrom<RawDelimiterSpec> for DelimiterSpec {
    type Error = DelimiterTableError;

    fn try_from(raw: RawDelimiterSpec) -> Result<Self, Self::Error> {
        if raw.open.is_empty() {
            return Err(DelimiterTableError::EmptyOpen);
        }
        Ok(DelimiterSpec::new(raw.open, raw.close, raw.display_mode))
    }
}

impl From<DelimiterSpec> for RawDelimiterSpec {
    fn from(spec: DelimiterSpec) -> Self {
        let close = spec.close.as_str().to_string();
        Self {
            open: spec.open,
            close,
            display_mode: spec.display_mode,
        }
    }
}

/// The built-in delimiters, in priority order.
pub fn default_delimiters() -> Vec<DelimiterSpec> {
    let environment = |name: &str| {
        DelimiterSpec::new(
            format!("\\begin{{{name}}}"),
            format!("\\end{{{name}}}"),
            false,
        )
    };
    let argument = |open: &str| DelimiterSpec::new(open, "}", false);

    let mut specs = vec![
        DelimiterSpec::new("\\(", "\\)", false),
        DelimiterSpec::new("\\[", "\\]", true),
    ];
    specs.extend(
        [
            "equation", "align", "align*", "cases", "matrix", "bmatrix", "pmatrix", "array",
        ]
        .map(environment),
    );
    specs.extend(
        [
            "\\section*{",
            "\\section{",
            "\\subsection*{",
            "\\subsection{",
            "\\textbf{",
        ]
        .map(argument),
    );
    specs.extend(["enumerate", "itemize"].map(environment));
    specs.push(DelimiterSpec::self_terminating("\\item"));
    specs.extend(["\\textit{", "\\textrm{", "\\text{"].map(argument));
    specs.extend(
        [
            "theorem",
            "proof",
            "definition",
            "example",
            "table",
            "tabular",
        ]
        .map(environment),
    );
    specs.extend(["\\frac{", "\\hat{", "\\vec{", "\\overline{"].map(argument));
    specs
}

static DEFAULT_TABLE: Lazy<DelimiterTable> = Lazy::new(|| {
    DelimiterTable::new(default_delimiters()).expect("built-in delimiter table is valid")
});

/// An ordered, validated list of [`DelimiterSpec`]s with a precompiled open-marker
/// search.
///
/// # Examples
///
/// ```
/// use mathguard_core::delimiters::{DelimiterSpec, DelimiterTable};
///
/// let table = DelimiterTable::new(vec![DelimiterSpec::new("$$", "$$", true)])?;
/// assert_eq!(table.find_open("cost: $$x$$", 0), Some(6));
/// assert!(table.spec_at("cost: $$x$$", 6).unwrap().display_mode);
/// # Ok::<(), mathguard_core::delimiters::DelimiterTableError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DelimiterTable {
    specs: Vec<DelimiterSpec>,
    open_pattern: Regex,
}

impl DelimiterTable {
    /// Validates `specs` and builds the table. A caller-supplied table replaces the
    /// default one wholesale.
    ///
    /// # Errors
    ///
    /// Fails if the table is empty, an open marker is empty, or two entries share
    /// the same open marker.
    pub fn new(specs: Vec<DelimiterSpec>) -> Result<Self, DelimiterTableError> {
        if specs.is_empty() {
            return Err(DelimiterTableError::Empty);
        }

        let mut seen = HashSet::new();
        for spec in &specs {
            if spec.open.is_empty() {
                return Err(DelimiterTableError::EmptyOpen);
            }
            if !seen.insert(spec.open.as_str()) {
                return Err(DelimiterTableError::DuplicateOpen(spec.open.clone()));
            }
        }

        // Leftmost position first; at equal positions the earlier alternative wins.
        let alternation = specs
            .iter()
            .map(|spec| regex::escape(&spec.open))
            .collect::<Vec<_>>()
            .join("|");
        let open_pattern = Regex::new(&alternation)?;

        debug!("Built delimiter table with {} entries", specs.len());
        Ok(Self {
            specs,
            open_pattern,
        })
    }

    /// The process-wide default table.
    pub fn shared() -> &'static DelimiterTable {
        &DEFAULT_TABLE
    }

    pub fn specs(&self) -> &[DelimiterSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Byte offset of the earliest open marker at or after `from`.
    pub fn find_open(&self, text: &str, from: usize) -> Option<usize> {
        if from > text.len() {
            return None;
        }
        self.open_pattern.find_at(text, from).map(|m| m.start())
    }

    /// The first spec, in table order, whose open marker starts at `position`.
    pub fn spec_at(&self, text: &str, position: usize) -> Option<&DelimiterSpec> {
        let rest = text.get(position..)?;
        self.specs
            .iter()
            .find(|spec| rest.starts_with(spec.open.as_str()))
    }
}

impl Default for DelimiterTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

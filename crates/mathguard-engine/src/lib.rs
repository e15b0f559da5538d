//! The math-rendering engine boundary.
//!
//! Validation never interprets math grammar itself. It hands every span to a
//! [`RenderEngine`] and reports whatever the engine reports. The engine is treated as a
//! stateless function from (content, options) to success or a [`RenderError`]; macro
//! definitions travel with every call in [`RenderOptions`] instead of being registered
//! in shared engine state.
//!
//! Two engines ship with the crate:
//!
//! - [`KatexEngine`] renders with KaTeX (the `katex` crate) and fails with KaTeX's
//!   parse error.
//! - [`NoOpEngine`] accepts everything; useful when only delimiter matching matters.
//!
//! ```
//! use mathguard_engine::{KatexEngine, RenderEngine, RenderOptions};
//!
//! let engine = KatexEngine;
//! assert!(engine.render(r"E = mc^2", &RenderOptions::inline()).is_ok());
//!
//! let err = engine.render(r"\foo", &RenderOptions::inline()).unwrap_err();
//! assert!(err.message.contains(r"Undefined control sequence: \foo"));
//! ```

mod katex_engine;

pub use crate::katex_engine::{KatexEngine, MAX_NESTING, nesting_depth};

use std::collections::BTreeMap;
use thiserror::Error;

/// Macro definitions keyed by control sequence (`"\\RR"` or `"RR"`).
pub type MacroMap = BTreeMap<String, String>;

/// Per-call rendering options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions<'a> {
    pub display_mode: bool,
    pub macros: Option<&'a MacroMap>,
}

impl<'a> RenderOptions<'a> {
    pub fn inline() -> Self {
        Self::default()
    }

    pub fn display() -> Self {
        Self {
            display_mode: true,
            macros: None,
        }
    }

    pub fn with_macros(mut self, macros: Option<&'a MacroMap>) -> Self {
        self.macros = macros;
        self
    }
}

/// A syntax error raised by an engine.
///
/// `message` is human readable and is the only field callers rely on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RenderError {
    pub message: String,
    /// Byte offset into the rendered string, when the engine knows it.
    pub position: Option<usize>,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }
}

/// A math-rendering engine.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Validation still calls the engine
/// sequentially, one span at a time.
pub trait RenderEngine: std::fmt::Debug + Send + Sync {
    /// Renders (or just checks) `math`, failing with the engine's syntax error.
    fn render(&self, math: &str, options: &RenderOptions<'_>) -> Result<(), RenderError>;

    /// Returns a short name for this engine (e.g., "katex").
    fn name(&self) -> &'static str;
}

/// An engine that accepts every input.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpEngine;

impl RenderEngine for NoOpEngine {
    fn render(&self, _math: &str, _options: &RenderOptions<'_>) -> Result<(), RenderError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

//! Validation of LaTeX math embedded in prose.
//!
//! `mathguard-core` finds every math span in a text using a table of delimiters
//! (`\(..\)`, `\[..\]`, `\begin{equation}..\end{equation}`, `\frac{..}`, ...), hands
//! each span to a [`RenderEngine`] and collects what goes wrong:
//!
//! - open delimiters that never close,
//! - spans the engine rejects.
//!
//! Validation never fails on malformed text. Errors are collected, ordered left to
//! right, and carry byte offsets into the source.
//!
//! ```
//! use mathguard_core::{ErrorKind, KatexEngine, validate};
//!
//! let result = validate(r"The price is $5 and \(x = \frac{a}{b}\)", &KatexEngine);
//! assert!(result.is_valid);
//!
//! let result = validate(r"Oops: \(x + 1", &KatexEngine);
//! assert_eq!(result.errors[0].kind, ErrorKind::UnclosedDelimiter);
//! assert_eq!(result.errors[0].position, 6);
//! ```

pub mod compare;
pub mod config;
pub mod delimiters;
pub mod report;
pub mod request;
pub mod scanner;
pub mod segment;
pub mod validator;

pub use compare::{StrategyComparison, StrategyDisagreement};
pub use config::{ConfigError, ValidatorConfig};
pub use delimiters::{
    CloseMarker, DelimiterSpec, DelimiterTable, DelimiterTableError, default_delimiters,
};
pub use mathguard_engine::{
    KatexEngine, MacroMap, NoOpEngine, RenderEngine, RenderError, RenderOptions,
};
pub use report::{check, format_errors};
pub use request::{
    RequestError, ValidationRequest, ValidationResponse, handle_request, respond,
};
pub use scanner::{find_matching_close, find_span_close};
pub use segment::{Segment, SegmentError, Segments, segment};
pub use validator::{
    ErrorKind, ValidationError, ValidationResult, Validator, compare_strategies, is_valid,
    validate, validate_segmented,
};

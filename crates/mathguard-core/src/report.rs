//! Human-readable error reports.

use crate::validator::{ValidationError, ValidationResult, validate};
use mathguard_engine::RenderEngine;

/// Returned by [`format_errors`] for an empty error list.
pub const NO_ERRORS: &str = "✓ No LaTeX errors found";

/// Returned by [`check`] for valid text.
pub const VALID: &str = "✅ LaTeX formatting is valid!";

const INDENT: &str = "   ";

/// A 1-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

/// Finds the line containing byte `position`.
///
/// A position equal to a line's length (the newline itself) belongs to that line.
/// Returns `None` past the end of the text.
pub fn locate(text: &str, position: usize) -> Option<LineColumn> {
    let mut line_start = 0;
    for (index, line) in text.split('\n').enumerate() {
        if line_start + line.len() >= position {
            return Some(LineColumn {
                line: index + 1,
                column: position - line_start + 1,
            });
        }
        line_start += line.len() + 1;
    }
    None
}

/// Renders `errors` against the `text` they were found in.
///
/// ```
/// use mathguard_core::{NoOpEngine, report::format_errors, validate};
///
/// let text = "line one\nsee \\(x";
/// let report = format_errors(text, &validate(text, &NoOpEngine).errors);
/// assert!(report.starts_with("Found 1 LaTeX error(s):\n"));
/// assert!(report.contains("Error at line 2, column 5:"));
/// assert!(report.ends_with("       ^^"));
/// ```
pub fn format_errors(text: &str, errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return NO_ERRORS.to_string();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = vec![format!("Found {} LaTeX error(s):\n", errors.len())];

    for error in errors {
        let location = locate(text, error.position);
        let (line, column) = location.map_or((0, 0), |at| (at.line, at.column));

        out.push(format!("\n❌ Error at line {line}, column {column}:"));
        out.push(format!("{INDENT}Type: {}", error.kind));
        out.push(format!("{INDENT}Message: {}", error.message));
        out.push(format!("{INDENT}LaTeX: {}", error.excerpt));

        let Some(at) = location else { continue };
        let Some(source) = lines.get(at.line - 1) else {
            continue;
        };
        let remaining = (source.len() + 1).saturating_sub(at.column);
        out.push(format!("{INDENT}{source}"));
        out.push(format!(
            "{}{}{}",
            " ".repeat(at.column - 1),
            INDENT,
            "^".repeat(error.length.min(remaining))
        ));
    }

    out.join("\n")
}

/// Validates `text` and renders the outcome: [`VALID`] or the formatted errors.
pub fn check(text: &str, engine: &dyn RenderEngine) -> (ValidationResult, String) {
    let result = validate(text, engine);
    let report = if result.is_valid {
        VALID.to_string()
    } else {
        format_errors(text, &result.errors)
    };
    (result, report)
}

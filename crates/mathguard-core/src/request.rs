//! JSON request and response shapes for serving validation over a wire.
//!
//! A request is `{ "text": "...", "delimiters": [...]?, "macros": {...}? }`. A response
//! is `{ "valid": true }` or `{ "valid": false, "errors": [...], "error": "summary" }`.
//! Requests without a string `text` are rejected before any validation runs.

use crate::delimiters::{DelimiterSpec, DelimiterTable, DelimiterTableError};
use crate::validator::{ValidationError, ValidationResult, Validator};
use mathguard_engine::{MacroMap, RenderEngine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Text is required and must be a string")]
    MissingText,
    #[error("Invalid delimiters: {0}")]
    InvalidDelimiters(#[from] DelimiterTableError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiters: Option<Vec<DelimiterSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macros: Option<MacroMap>,
}

impl ValidationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            delimiters: None,
            macros: None,
        }
    }

    /// Parses a request body.
    ///
    /// # Errors
    ///
    /// [`RequestError::MissingText`] when `text` is absent or not a string, and
    /// [`RequestError::InvalidJson`] for anything else that does not parse.
    pub fn from_json(body: &str) -> Result<Self, RequestError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        if !value.get("text").is_some_and(serde_json::Value::is_string) {
            return Err(RequestError::MissingText);
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResponse {
    /// The response for a request that never reached validation.
    pub fn rejected(error: &RequestError) -> Self {
        Self {
            valid: false,
            errors: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

impl From<ValidationResult> for ValidationResponse {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            return Self {
                valid: true,
                errors: Vec::new(),
                error: None,
            };
        }

        let messages: Vec<&str> = result
            .errors
            .iter()
            .map(|error| error.message.as_str())
            .collect();
        let summary = format!(
            "Found {} LaTeX error(s): {}",
            result.errors.len(),
            messages.join("; ")
        );
        Self {
            valid: false,
            errors: result.errors,
            error: Some(summary),
        }
    }
}

/// Validates a request with the direct scan strategy.
///
/// A request table replaces the default table; request macros are passed to every
/// engine call.
pub fn handle_request(
    request: &ValidationRequest,
    engine: &dyn RenderEngine,
) -> Result<ValidationResponse, RequestError> {
    let custom = request
        .delimiters
        .clone()
        .map(DelimiterTable::new)
        .transpose()?;
    let table = match &custom {
        Some(table) => table,
        None => DelimiterTable::shared(),
    };

    let result = Validator::new(engine)
        .with_table(table)
        .with_macros(request.macros.as_ref())
        .validate(&request.text);
    Ok(result.into())
}

/// Parses and handles a raw body, turning every rejection into a response.
pub fn respond(body: &str, engine: &dyn RenderEngine) -> ValidationResponse {
    ValidationRequest::from_json(body)
        .and_then(|request| handle_request(&request, engine))
        .unwrap_or_else(|error| ValidationResponse::rejected(&error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathguard_engine::{KatexEngine, NoOpEngine};
    use serde_json::json;

    #[test]
    fn test_rejects_missing_or_non_string_text() {
        for body in [r#"{}"#, r#"{"text": 3}"#, r#"{"text": null}"#, r#"[]"#] {
            assert!(
                matches!(ValidationRequest::from_json(body), Err(RequestError::MissingText)),
                "{body}"
            );
        }
        assert!(matches!(
            ValidationRequest::from_json("{"),
            Err(RequestError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_empty_text_is_valid() {
        let request = ValidationRequest::from_json(r#"{"text": ""}"#).unwrap();
        let response = handle_request(&request, &KatexEngine).unwrap();
        assert_eq!(serde_json::to_value(&response).unwrap(), json!({ "valid": true }));
    }

    #[test]
    fn test_invalid_response_shape() {
        let response = respond(r#"{"text": "a \\(x"}"#, &NoOpEngine);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "valid": false,
                "errors": [{
                    "message": "Unclosed LaTeX delimiter: \"\\(\" at position 2",
                    "position": 2,
                    "length": 2,
                    "latex": "\\(x...",
                    "type": "unclosed",
                }],
                "error": "Found 1 LaTeX error(s): Unclosed LaTeX delimiter: \"\\(\" at position 2",
            })
        );
    }

    #[test]
    fn test_request_delimiters_and_macros() {
        let body = json!({
            "text": "$\\pair{a}{b}$ and $\\pair{a}$",
            "delimiters": [{ "left": "$", "right": "$", "display": false }],
            "macros": { "\\pair": "(#1, #2)" },
        })
        .to_string();
        let response = respond(&body, &KatexEngine);
        assert!(!response.valid);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].excerpt, "$\\pair{a}$");
        assert_eq!(response.errors[0].position, 18);
    }

    #[test]
    fn test_duplicate_delimiters_are_rejected() {
        let body = json!({
            "text": "x",
            "delimiters": [
                { "open": "$", "close": "$" },
                { "open": "$", "close": "$$" },
            ],
        })
        .to_string();
        let response = respond(&body, &KatexEngine);
        assert_eq!(
            response.error.as_deref(),
            Some("Invalid delimiters: duplicate open marker \"$\"")
        );
    }
}

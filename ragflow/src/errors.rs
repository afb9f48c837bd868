//! Error types for ragflow.
//!
//! Library code returns [`RagflowError`]; pipeline construction returns
//! [`PipelineValidationError`] carrying a [`ContractErrorInfo`] for diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, RagflowError>;

/// The main error type for ragflow operations.
#[derive(Debug, Error)]
pub enum RagflowError {
    /// A required input was missing from the request.
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// Configuration was missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP transport failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An external service answered with a non-success status.
    #[error("{service} returned status {status}: {body}")]
    Service {
        /// Service name (e.g. "opensearch", "bedrock").
        service: String,
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// A service response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The similarity search failed.
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Text generation failed.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A local file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagflowError {
    /// Creates a service error, truncating long bodies.
    #[must_use]
    pub fn service(service: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        const MAX_BODY: usize = 512;
        let mut body = body.into();
        if body.len() > MAX_BODY {
            let mut cut = MAX_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("...");
        }
        Self::Service {
            service: service.into(),
            status,
            body,
        }
    }

    /// Returns true if the error is caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingInput(_))
    }
}

impl From<serde_json::Error> for RagflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for RagflowError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "PIPELINE-EMPTY").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when pipeline validation fails.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the contract error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_info_creation() {
        let info = ContractErrorInfo::new("PIPELINE-EMPTY", "Test error")
            .with_fix_hint("Add a stage")
            .with_context_entry("pipeline", "product");

        assert_eq!(info.code, "PIPELINE-EMPTY");
        assert_eq!(info.fix_hint, Some("Add a stage".to_string()));
        assert_eq!(info.context.get("pipeline"), Some(&"product".to_string()));
    }

    #[test]
    fn test_validation_error_code() {
        let err = PipelineValidationError::new("bad")
            .with_stages(vec!["a".to_string()])
            .with_error_info(ContractErrorInfo::new("PIPELINE-DUPLICATE", "dup"));

        assert_eq!(err.code(), Some("PIPELINE-DUPLICATE"));
        assert_eq!(err.to_string(), "bad");
    }

    #[test]
    fn test_service_error_truncates_body() {
        let err = RagflowError::service("opensearch", 503, "x".repeat(2000));
        match err {
            RagflowError::Service { status, ref body, .. } => {
                assert_eq!(status, 503);
                assert!(body.len() <= 515);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_service_error_display() {
        let err = RagflowError::service("bedrock", 400, "ValidationException");
        assert_eq!(err.to_string(), "bedrock returned status 400: ValidationException");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(RagflowError::MissingInput("query".into()).is_client_error());
        assert!(!RagflowError::Retrieval("down".into()).is_client_error());
    }

    #[test]
    fn test_from_serde_error() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: RagflowError = parse.unwrap_err().into();
        assert!(matches!(err, RagflowError::Serialization(_)));
    }
}

//! Serverless entry point: turns a request event into a status code and a
//! JSON body.

use crate::config::{PipelineConfig, Variant};
use crate::errors::{RagflowError, Result};
use crate::pipeline::Pipeline;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Error body text for a request without a query.
pub const MISSING_QUERY: &str = "Query parameter is required";

/// A serverless-style response: status code plus a JSON-encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerResponse {
    /// HTTP status code.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON body, encoded as a string.
    pub body: String,
}

impl HandlerResponse {
    fn json(status_code: u16, body: &Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    /// `400` with an error body.
    #[must_use]
    pub fn bad_request(message: &str) -> Self {
        Self::json(400, &json!({ "error": message }))
    }

    /// `500` with an error body.
    #[must_use]
    pub fn internal_error(message: &str) -> Self {
        Self::json(500, &json!({ "error": message }))
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decodes the body.
    pub fn body_json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Runs a workflow for each incoming event.
#[derive(Debug, Clone)]
pub struct RecommendationHandler {
    pipeline: Pipeline,
    variant: Variant,
    default_query: String,
}

impl RecommendationHandler {
    /// Creates a handler for a pipeline built from `config`.
    #[must_use]
    pub fn new(pipeline: Pipeline, config: &PipelineConfig) -> Self {
        Self {
            pipeline,
            variant: config.variant,
            default_query: config.default_query.clone(),
        }
    }

    /// Handles one event of the form `{"query": "..."}`.
    pub async fn handle(&self, event: &Value) -> HandlerResponse {
        let query = match self.extract_query(event) {
            Ok(query) => query,
            Err(err) if err.is_client_error() => {
                warn!(error = %err, "rejecting request");
                return HandlerResponse::bad_request(MISSING_QUERY);
            }
            Err(err) => return HandlerResponse::internal_error(&err.to_string()),
        };

        let state = self.pipeline.invoke(query.clone()).await;
        if let Some(error) = state.error() {
            return HandlerResponse::internal_error(error);
        }

        info!(variant = %self.variant, "request served");
        let mut body = json!({
            "recommendations": state.result,
            "query": query,
        });
        if self.variant == Variant::Customer {
            body["summary"] = json!(state.summary);
        }
        HandlerResponse::json(200, &body)
    }

    /// Pulls the query out of the event.
    ///
    /// The product workflow requires a non-empty string. The customer
    /// workflow uses its default query only when the key is absent; a
    /// present string is taken as is.
    pub fn extract_query(&self, event: &Value) -> Result<String> {
        let missing = || RagflowError::MissingInput("query".to_string());
        match (event.get("query"), self.variant) {
            (None, Variant::Customer) => Ok(self.default_query.clone()),
            (Some(Value::String(query)), Variant::Customer) => Ok(query.clone()),
            (Some(Value::String(query)), Variant::Product) if !query.is_empty() => Ok(query.clone()),
            _ => Err(missing()),
        }
    }
}

//! Generator response type.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// LLM response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Generated text.
    pub content: String,
    /// Model id that produced the text.
    pub model: String,
    /// Provider name.
    pub provider: String,
    /// Prompt tokens, when the provider reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    /// Completion tokens, when the provider reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    /// Round-trip latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    /// Why generation stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    /// Creates a response with just content, model and provider.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        model: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            model: model.into(),
            provider: provider.into(),
            ..Self::default()
        }
    }

    /// Sets the latency.
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: f64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    /// Returns total tokens.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.unwrap_or(0) + self.output_tokens.unwrap_or(0)
    }

    /// Converts to span attributes.
    #[must_use]
    pub fn to_span_attributes(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("llm.model".to_string(), serde_json::json!(self.model));
        map.insert("llm.provider".to_string(), serde_json::json!(self.provider));
        map.insert("llm.total_tokens".to_string(), serde_json::json!(self.total_tokens()));
        if let Some(l) = self.latency_ms { map.insert("llm.latency_ms".to_string(), serde_json::json!(l)); }
        if let Some(ref r) = self.finish_reason { map.insert("llm.finish_reason".to_string(), serde_json::json!(r)); }
        map
    }
}

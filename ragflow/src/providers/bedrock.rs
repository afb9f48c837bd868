//! Bedrock runtime adapters.

use super::http::{build_client, read_json};
use crate::config::{BedrockConfig, EmbeddingConfig, LlmConfig};
use crate::errors::{RagflowError, Result};
use crate::observability::SpanTimer;
use crate::ports::{Embedder, Generator, LlmResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "bedrock";
const PROVIDER: &str = "bedrock";
const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

/// Thin client for `POST /model/{id}/invoke`.
#[derive(Clone)]
pub struct BedrockClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for BedrockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl BedrockClient {
    /// Creates a client for the configured region or endpoint.
    pub fn new(config: &BedrockConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
        })
    }

    /// Returns the invoke URL for a model.
    #[must_use]
    pub fn invoke_url(&self, model_id: &str) -> String {
        format!("{}/model/{model_id}/invoke", self.base_url)
    }

    /// Invokes a model with a JSON body and returns the JSON answer.
    pub async fn invoke(&self, model_id: &str, body: &Value) -> Result<Value> {
        let mut request = self
            .http
            .post(self.invoke_url(model_id))
            .header("accept", "application/json")
            .json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }
        read_json(SERVICE, request.send().await?).await
    }
}

/// Titan text embeddings.
#[derive(Debug, Clone)]
pub struct BedrockEmbedder {
    client: BedrockClient,
    model_id: String,
}

impl BedrockEmbedder {
    /// Creates the embedder.
    #[must_use]
    pub fn new(client: BedrockClient, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            model_id: config.model_id.clone(),
        }
    }
}

fn embedding_request(text: &str) -> Value {
    json!({ "inputText": text })
}

#[allow(clippy::cast_possible_truncation)]
fn parse_embedding(body: &Value) -> Result<Vec<f32>> {
    body.get("embedding")
        .and_then(Value::as_array)
        .ok_or_else(|| RagflowError::Decode("bedrock: response has no 'embedding' array".to_string()))?
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| RagflowError::Decode("bedrock: non-numeric embedding value".to_string()))
        })
        .collect()
}

#[async_trait]
impl Embedder for BedrockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = self.client.invoke(&self.model_id, &embedding_request(text)).await?;
        parse_embedding(&body)
    }
}

/// Request/response shape of an Anthropic model on Bedrock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnthropicApi {
    /// Legacy `prompt`/`completion` body (Claude v2, Claude Instant).
    TextCompletion,
    /// `messages` body (Claude 3 and later).
    Messages,
}

impl AnthropicApi {
    /// Picks the API a model id speaks.
    #[must_use]
    pub fn for_model(model_id: &str) -> Self {
        if model_id.contains("claude-v2") || model_id.contains("claude-instant") {
            Self::TextCompletion
        } else {
            Self::Messages
        }
    }

    /// Builds the invoke body.
    #[must_use]
    pub fn request(self, prompt: &str, llm: &LlmConfig) -> Value {
        match self {
            Self::TextCompletion => json!({
                "prompt": format!("\n\nHuman: {prompt}\n\nAssistant:"),
                "max_tokens_to_sample": llm.max_tokens,
                "temperature": llm.temperature,
            }),
            Self::Messages => json!({
                "anthropic_version": ANTHROPIC_VERSION,
                "max_tokens": llm.max_tokens,
                "temperature": llm.temperature,
                "messages": [{
                    "role": "user",
                    "content": [{ "type": "text", "text": prompt }],
                }],
            }),
        }
    }

    /// Reads the generated text and usage out of the invoke answer.
    pub fn parse(self, body: &Value, model_id: &str) -> Result<LlmResponse> {
        let content = match self {
            Self::TextCompletion => body
                .get("completion")
                .and_then(Value::as_str)
                .map(str::to_string),
            Self::Messages => body.get("content").and_then(Value::as_array).map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("")
            }),
        }
        .ok_or_else(|| RagflowError::Decode(format!("bedrock: no generated text in {model_id} response")))?;

        let usage = |key: &str| {
            body.get("usage")
                .and_then(|u| u.get(key))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
        };

        let mut response = LlmResponse::new(content, model_id, PROVIDER);
        response.input_tokens = usage("input_tokens");
        response.output_tokens = usage("output_tokens");
        response.finish_reason = body
            .get("stop_reason")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(response)
    }
}

/// Anthropic text generation.
#[derive(Debug, Clone)]
pub struct BedrockGenerator {
    client: BedrockClient,
    llm: LlmConfig,
    api: AnthropicApi,
}

impl BedrockGenerator {
    /// Creates the generator, picking the body format from the model id.
    #[must_use]
    pub fn new(client: BedrockClient, llm: LlmConfig) -> Self {
        let api = AnthropicApi::for_model(&llm.model_id);
        Self { client, llm, api }
    }
}

#[async_trait]
impl Generator for BedrockGenerator {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse> {
        let timer = SpanTimer::start(&self.llm.model_id);
        let body = self
            .client
            .invoke(&self.llm.model_id, &self.api.request(prompt, &self.llm))
            .await?;
        let response = self.api.parse(&body, &self.llm.model_id)?.with_latency_ms(timer.finish());
        debug!(attributes = ?response.to_span_attributes(), "bedrock generation");
        Ok(response)
    }
}

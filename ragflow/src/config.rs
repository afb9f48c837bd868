//! Configuration for the workflows and their service adapters.
//!
//! Every struct deserializes with defaults, so a partial JSON document is a
//! valid config. [`PipelineConfig::from_env`] builds one from the process
//! environment.

use crate::errors::{RagflowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which workflow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Product search followed by LLM recommendations.
    #[default]
    Product,
    /// Customer profile search, LLM summary and a fixed recommendation list.
    Customer,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl FromStr for Variant {
    type Err = RagflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" | "products" => Ok(Self::Product),
            "customer" | "customers" | "customer_profile" => Ok(Self::Customer),
            other => Err(RagflowError::Config(format!("unknown variant '{other}'"))),
        }
    }
}

/// Vector store (OpenSearch) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Host name or URL of the domain.
    #[serde(default)]
    pub endpoint: String,
    /// Index name.
    #[serde(default = "default_product_index")]
    pub index: String,
    /// Field holding the document text.
    #[serde(default = "default_text_field")]
    pub text_field: String,
    /// Field holding the embedding.
    #[serde(default = "default_vector_field")]
    pub vector_field: String,
    /// Embedding dimension used for the index mapping.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Number of snippets to retrieve.
    #[serde(default = "default_product_top_k")]
    pub top_k: usize,
    /// Basic-auth user.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_product_index() -> String {
    "product-recommendations".to_string()
}

fn default_customer_index() -> String {
    "customer-profiles".to_string()
}

fn default_text_field() -> String {
    "description".to_string()
}

fn default_vector_field() -> String {
    "vector".to_string()
}

// Field names LangChain's OpenSearch vector store writes by default.
fn default_customer_text_field() -> String {
    "text".to_string()
}

fn default_customer_vector_field() -> String {
    "vector_field".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_product_top_k() -> usize {
    5
}

fn default_customer_top_k() -> usize {
    3
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index: default_product_index(),
            text_field: default_text_field(),
            vector_field: default_vector_field(),
            dimension: default_dimension(),
            top_k: default_product_top_k(),
            username: None,
            password: None,
        }
    }
}

impl VectorStoreConfig {
    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the index.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Sets basic-auth credentials.
    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Returns the base URL, adding `https://` to a bare host.
    #[must_use]
    pub fn base_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("https://{endpoint}")
        }
    }
}

/// Bedrock runtime connection settings shared by embedding and generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockConfig {
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Runtime endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bearer API key.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            api_key: None,
        }
    }
}

impl BedrockConfig {
    /// Returns the runtime URL for the configured region.
    #[must_use]
    pub fn base_url(&self) -> String {
        match self.endpoint {
            Some(ref endpoint) => endpoint.trim().trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model id.
    #[serde(default = "default_embedding_model")]
    pub model_id: String,
}

fn default_embedding_model() -> String {
    "amazon.titan-embed-text-v1".to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: default_embedding_model(),
        }
    }
}

/// Text generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model id.
    #[serde(default = "default_product_llm")]
    pub model_id: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum tokens to generate.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_product_llm() -> String {
    "anthropic.claude-v2".to_string()
}

fn default_customer_llm() -> String {
    "anthropic.claude-3-sonnet-20240229-v1:0".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model_id: default_product_llm(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Workflow variant.
    #[serde(default)]
    pub variant: Variant,
    /// Vector store settings.
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    /// Bedrock connection settings.
    #[serde(default)]
    pub bedrock: BedrockConfig,
    /// Embedding model settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Generation settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Items written by the customer workflow's recommendation stage.
    #[serde(default = "default_recommendations")]
    pub recommendations: Vec<String>,
    /// Query used by the customer workflow when the request has none.
    #[serde(default = "default_customer_query")]
    pub default_query: String,
    /// Per-request timeout for service calls, in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: f64,
}

fn default_recommendations() -> Vec<String> {
    vec![
        "Nike Running Shoes".to_string(),
        "Under Armour T-shirt".to_string(),
        "Apple Watch Series 9".to_string(),
    ]
}

fn default_customer_query() -> String {
    "preferences of customer".to_string()
}

fn default_timeout() -> f64 {
    30.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_variant(Variant::Product)
    }
}

impl PipelineConfig {
    /// Creates the default configuration for a variant.
    #[must_use]
    pub fn for_variant(variant: Variant) -> Self {
        let mut vector_store = VectorStoreConfig::default();
        let mut llm = LlmConfig::default();
        if variant == Variant::Customer {
            vector_store.index = default_customer_index();
            vector_store.text_field = default_customer_text_field();
            vector_store.vector_field = default_customer_vector_field();
            vector_store.top_k = default_customer_top_k();
            llm.model_id = default_customer_llm();
        }

        Self {
            variant,
            vector_store,
            bedrock: BedrockConfig::default(),
            embedding: EmbeddingConfig::default(),
            llm,
            recommendations: default_recommendations(),
            default_query: default_customer_query(),
            request_timeout_seconds: default_timeout(),
        }
    }

    /// Builds a configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unset or blank keys keep the variant's defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let variant = get("RAGFLOW_VARIANT")
            .map(|v| v.parse::<Variant>())
            .transpose()?
            .unwrap_or_default();
        let mut config = Self::for_variant(variant);

        if let Some(region) = get("AWS_REGION") {
            config.bedrock.region = region;
        }
        config.bedrock.endpoint = get("BEDROCK_ENDPOINT");
        config.bedrock.api_key = get("BEDROCK_API_KEY");

        if let Some(endpoint) = get("OPENSEARCH_ENDPOINT") {
            config.vector_store.endpoint = endpoint;
        }
        if let Some(index) = get("OPENSEARCH_INDEX") {
            config.vector_store.index = index;
        }
        if let Some(field) = get("OPENSEARCH_TEXT_FIELD") {
            config.vector_store.text_field = field;
        }
        if let Some(field) = get("OPENSEARCH_VECTOR_FIELD") {
            config.vector_store.vector_field = field;
        }
        config.vector_store.username = get("OPENSEARCH_USERNAME");
        config.vector_store.password = get("OPENSEARCH_PASSWORD");
        if let Some(top_k) = get("RAGFLOW_TOP_K") {
            config.vector_store.top_k = top_k
                .parse()
                .map_err(|_| RagflowError::Config(format!("RAGFLOW_TOP_K is not a number: '{top_k}'")))?;
        }

        if let Some(model) = get("EMBEDDING_MODEL_ID") {
            config.embedding.model_id = model;
        }
        if let Some(model) = get("LLM_MODEL_ID") {
            config.llm.model_id = model;
        }

        Ok(config)
    }

    /// Sets the vector store settings.
    #[must_use]
    pub fn with_vector_store(mut self, vector_store: VectorStoreConfig) -> Self {
        self.vector_store = vector_store;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.request_timeout_seconds = seconds;
        self
    }

    /// Gets the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_seconds.max(0.0))
    }

    /// Checks the settings the HTTP adapters depend on.
    pub fn validate(&self) -> Result<()> {
        if self.vector_store.endpoint.trim().is_empty() {
            return Err(RagflowError::Config("OPENSEARCH_ENDPOINT is required".to_string()));
        }
        if self.vector_store.index.trim().is_empty() {
            return Err(RagflowError::Config("vector store index must not be empty".to_string()));
        }
        if self.vector_store.top_k == 0 {
            return Err(RagflowError::Config("top_k must be at least 1".to_string()));
        }
        if !(self.request_timeout_seconds > 0.0) {
            return Err(RagflowError::Config("request timeout must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(RagflowError::Config("temperature must be within 0.0..=1.0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_product_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.variant, Variant::Product);
        assert_eq!(config.vector_store.index, "product-recommendations");
        assert_eq!(config.vector_store.top_k, 5);
        assert_eq!(config.llm.model_id, "anthropic.claude-v2");
        assert_eq!(config.embedding.model_id, "amazon.titan-embed-text-v1");
        assert_eq!(config.vector_store.text_field, "description");
        assert_eq!(config.vector_store.vector_field, "vector");
        assert!((config.llm.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.llm.max_tokens, 1000);
    }

    #[test]
    fn test_customer_defaults() {
        let config = PipelineConfig::for_variant(Variant::Customer);
        assert_eq!(config.vector_store.index, "customer-profiles");
        assert_eq!(config.vector_store.top_k, 3);
        assert_eq!(config.vector_store.text_field, "text");
        assert_eq!(config.vector_store.vector_field, "vector_field");
        assert_eq!(config.recommendations.len(), 3);
        assert_eq!(config.default_query, "preferences of customer");
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("RAGFLOW_VARIANT", "customer"),
            ("AWS_REGION", "eu-west-1"),
            ("OPENSEARCH_ENDPOINT", "search.example.com"),
            ("OPENSEARCH_INDEX", "profiles-v2"),
            ("RAGFLOW_TOP_K", "7"),
            ("LLM_MODEL_ID", "anthropic.claude-v2:1"),
        ]))
        .unwrap();

        assert_eq!(config.variant, Variant::Customer);
        assert_eq!(config.vector_store.index, "profiles-v2");
        assert_eq!(config.vector_store.top_k, 7);
        assert_eq!(config.llm.model_id, "anthropic.claude-v2:1");
        assert_eq!(config.bedrock.base_url(), "https://bedrock-runtime.eu-west-1.amazonaws.com");
        assert_eq!(config.vector_store.base_url(), "https://search.example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_field_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("RAGFLOW_VARIANT", "customer"),
            ("OPENSEARCH_TEXT_FIELD", "profile"),
            ("OPENSEARCH_VECTOR_FIELD", "embedding"),
        ]))
        .unwrap();
        assert_eq!(config.vector_store.text_field, "profile");
        assert_eq!(config.vector_store.vector_field, "embedding");

        let config = PipelineConfig::from_lookup(lookup(&[("RAGFLOW_VARIANT", "customer")])).unwrap();
        assert_eq!(config.vector_store.text_field, "text");
        assert_eq!(config.vector_store.vector_field, "vector_field");
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(PipelineConfig::from_lookup(lookup(&[("RAGFLOW_TOP_K", "many")])).is_err());
        assert!(PipelineConfig::from_lookup(lookup(&[("RAGFLOW_VARIANT", "weather")])).is_err());
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = PipelineConfig::from_lookup(lookup(&[("OPENSEARCH_INDEX", "  ")])).unwrap();
        assert_eq!(config.vector_store.index, "product-recommendations");
    }

    #[test]
    fn test_validate() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_err());

        let config = config.with_vector_store(VectorStoreConfig::default().with_endpoint("localhost:9200"));
        assert!(config.validate().is_ok());
        assert!(config.clone().with_timeout(0.0).validate().is_err());

        let mut zero_k = config;
        zero_k.vector_store.top_k = 0;
        assert!(zero_k.validate().is_err());
    }

    #[test]
    fn test_base_url_keeps_scheme() {
        let store = VectorStoreConfig::default().with_endpoint("http://localhost:9200/");
        assert_eq!(store.base_url(), "http://localhost:9200");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"vector_store": {"endpoint": "os.local"}}"#).unwrap();
        assert_eq!(config.vector_store.endpoint, "os.local");
        assert_eq!(config.vector_store.top_k, 5);
        assert_eq!(config.request_timeout_seconds, 30.0);
    }

    #[test]
    fn test_variant_parse_and_display() {
        assert_eq!("Customer".parse::<Variant>().unwrap(), Variant::Customer);
        assert_eq!(Variant::Product.to_string(), "product");
    }
}

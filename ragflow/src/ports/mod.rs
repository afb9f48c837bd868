//! Ports: the traits standing between the pipeline and external services.
//!
//! Stages only see these traits, so the vector store, embedding model and
//! LLM can be swapped for HTTP adapters (see `providers`) or test doubles
//! (see `testing`).

mod response;

pub use response::LlmResponse;

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A document returned by a similarity search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The text content.
    pub page_content: String,
    /// Any other fields the store returned.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Document {
    /// Creates a document with no metadata.
    #[must_use]
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Nearest-neighbour search over embedded text.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to `k` documents most similar to `query`, best first.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>>;
}

/// Text generation from a single prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<LlmResponse>;
}

/// Text embedding.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds `text` into a vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// A writable vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns true if the index already exists.
    async fn index_exists(&self) -> Result<bool>;

    /// Creates the index with the given mapping.
    async fn create_index(&self, mapping: &serde_json::Value) -> Result<()>;

    /// Stores a document under `id`, replacing any previous version.
    async fn index_document(&self, id: &str, document: &serde_json::Value) -> Result<()>;
}

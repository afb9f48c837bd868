//! Similarity-search stage.

use super::Stage;
use crate::core::{PipelineState, StageKind};
use crate::errors::Result;
use crate::ports::Retriever;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Queries a [`Retriever`] and stores the snippet texts in `state.context`.
pub struct RetrieveStage {
    name: String,
    retriever: Arc<dyn Retriever>,
    top_k: usize,
    error_prefix: String,
}

impl RetrieveStage {
    /// Creates a retrieval stage returning up to `top_k` snippets.
    pub fn new(name: impl Into<String>, retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        Self {
            name: name.into(),
            retriever,
            top_k,
            error_prefix: "Error retrieving documents".to_string(),
        }
    }

    /// Sets the error prefix.
    #[must_use]
    pub fn with_error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.error_prefix = prefix.into();
        self
    }

    /// Returns the configured result count.
    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

impl fmt::Debug for RetrieveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrieveStage")
            .field("name", &self.name)
            .field("top_k", &self.top_k)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for RetrieveStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Enrich
    }

    fn error_prefix(&self) -> &str {
        &self.error_prefix
    }

    async fn execute(&self, state: &mut PipelineState) -> Result<()> {
        let documents = self.retriever.similarity_search(&state.query, self.top_k).await?;
        debug!(stage = %self.name, hits = documents.len(), "similarity search returned");
        state.context = documents.into_iter().map(|d| d.page_content).collect();
        Ok(())
    }
}

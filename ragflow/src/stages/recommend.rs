//! Fixed recommendation list stage.

use super::Stage;
use crate::core::{PipelineResult, PipelineState};
use crate::errors::Result;
use async_trait::async_trait;

/// Writes a configured list of items into `state.result`.
#[derive(Debug, Clone)]
pub struct RecommendStage {
    name: String,
    items: Vec<String>,
}

impl RecommendStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(name: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

#[async_trait]
impl Stage for RecommendStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn error_prefix(&self) -> &str {
        "Error recommending items"
    }

    async fn execute(&self, state: &mut PipelineState) -> Result<()> {
        state.result = Some(PipelineResult::Items(self.items.clone()));
        Ok(())
    }
}

//! Prompt composition and generation stage.

use super::Stage;
use crate::core::{PipelineResult, PipelineState, StageKind};
use crate::errors::Result;
use crate::observability::SpanTimer;
use crate::ports::Generator;
use crate::prompt::PromptTemplate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Where the generated text goes in the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTarget {
    /// `state.result`, as text.
    #[default]
    Result,
    /// `state.summary`.
    Summary,
}

/// Composes a prompt from the state and stores the generator's answer.
pub struct GenerateStage {
    name: String,
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
    target: GenerationTarget,
    error_prefix: String,
}

impl GenerateStage {
    /// Creates a generation stage writing into `state.result`.
    pub fn new(
        name: impl Into<String>,
        generator: Arc<dyn Generator>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            name: name.into(),
            generator,
            template,
            target: GenerationTarget::Result,
            error_prefix: "Error generating text".to_string(),
        }
    }

    /// Sets where the generated text is stored.
    #[must_use]
    pub fn with_target(mut self, target: GenerationTarget) -> Self {
        self.target = target;
        self
    }

    /// Sets the error prefix.
    #[must_use]
    pub fn with_error_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.error_prefix = prefix.into();
        self
    }
}

impl fmt::Debug for GenerateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateStage")
            .field("name", &self.name)
            .field("template", &self.template)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for GenerateStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    fn error_prefix(&self) -> &str {
        &self.error_prefix
    }

    async fn execute(&self, state: &mut PipelineState) -> Result<()> {
        let prompt = self.template.compose(&state.query, &state.context);
        state.prompt = Some(prompt.clone());

        let timer = SpanTimer::start(&self.name);
        let response = self.generator.generate(&prompt).await?;
        debug!(
            stage = %self.name,
            model = %response.model,
            chars = response.content.len(),
            elapsed_ms = timer.finish(),
            "generation finished"
        );

        match self.target {
            GenerationTarget::Result => state.result = Some(PipelineResult::Text(response.content)),
            GenerationTarget::Summary => state.summary = Some(response.content),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::testing::MockGenerator;
    use pretty_assertions::assert_eq;

    fn state_with_context() -> PipelineState {
        let mut state = PipelineState::new("noise cancelling");
        state.context = vec!["Headphones A".into(), "Headphones B".into()];
        state
    }

    #[tokio::test]
    async fn test_stores_text_result() {
        let generator = Arc::new(MockGenerator::new("Buy Headphones A"));
        let stage = GenerateStage::new("generate_recommendations", generator.clone(), PromptTemplate::ProductRecommendation);

        let mut state = state_with_context();
        assert_eq!(stage.run(&mut state).await, StageStatus::Ok);

        assert_eq!(state.result, Some(PipelineResult::Text("Buy Headphones A".into())));
        let prompts = generator.recorded_prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(state.prompt.as_deref(), Some(prompts[0].as_str()));
        assert!(prompts[0].contains("noise cancelling"));
        assert!(prompts[0].contains("Headphones A\nHeadphones B"));
    }

    #[tokio::test]
    async fn test_summary_target() {
        let generator = Arc::new(MockGenerator::new("- likes running"));
        let stage = GenerateStage::new("summarize", generator, PromptTemplate::CustomerSummary)
            .with_target(GenerationTarget::Summary);

        let mut state = state_with_context();
        stage.run(&mut state).await;

        assert_eq!(state.summary.as_deref(), Some("- likes running"));
        assert!(state.result.is_none());
    }

    #[tokio::test]
    async fn test_failure_leaves_result_unset() {
        let generator = Arc::new(MockGenerator::failing("throttled"));
        let stage = GenerateStage::new("generate_recommendations", generator, PromptTemplate::ProductRecommendation)
            .with_error_prefix("Error generating recommendations");

        let mut state = state_with_context();
        assert_eq!(stage.run(&mut state).await, StageStatus::Fail);

        assert!(state.result.is_none());
        assert_eq!(
            state.error(),
            Some("Error generating recommendations: Generation failed: throttled")
        );
    }
}

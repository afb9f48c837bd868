//! Stage trait and the stages the workflows are assembled from.
//!
//! A stage mutates the shared [`PipelineState`]. Failures are returned from
//! [`Stage::execute`] and turned into the state's error string by
//! [`Stage::run`], which is what the pipeline calls.

mod generate;
mod recommend;
mod retrieve;

pub use generate::{GenerateStage, GenerationTarget};
pub use recommend::RecommendStage;
pub use retrieve::RetrieveStage;

use crate::core::{PipelineState, StageKind, StageStatus};
use crate::errors::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Returns the kind of work the stage performs.
    fn kind(&self) -> StageKind {
        StageKind::Work
    }

    /// Prefix for the error string recorded when the stage fails.
    fn error_prefix(&self) -> &str;

    /// Executes the stage against the state.
    async fn execute(&self, state: &mut PipelineState) -> Result<()>;

    /// Executes the stage and records any failure in the state.
    async fn run(&self, state: &mut PipelineState) -> StageStatus {
        match self.execute(state).await {
            Ok(()) => StageStatus::Ok,
            Err(err) => {
                state.fail(format!("{}: {err}", self.error_prefix()));
                StageStatus::Fail
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RagflowError;

    #[derive(Debug)]
    struct Exploding;

    #[async_trait]
    impl Stage for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        fn error_prefix(&self) -> &str {
            "Error exploding"
        }

        async fn execute(&self, _state: &mut PipelineState) -> Result<()> {
            Err(RagflowError::Decode("kaboom".into()))
        }
    }

    #[tokio::test]
    async fn test_run_records_prefixed_error() {
        let mut state = PipelineState::new("q");
        let status = Exploding.run(&mut state).await;

        assert_eq!(status, StageStatus::Fail);
        assert_eq!(state.error(), Some("Error exploding: Decode error: kaboom"));
        assert_eq!(Exploding.kind(), StageKind::Work);
    }
}

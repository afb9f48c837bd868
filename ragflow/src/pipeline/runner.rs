//! Sequential pipeline execution.

use super::routing::{should_continue, Route};
use crate::core::{PipelineRun, PipelineState, StageRecord, StageStatus};
use crate::events::{names, EventSink, NoOpEventSink};
use crate::observability::SpanTimer;
use crate::stages::Stage;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// A validated, linear list of stages.
///
/// Built with [`PipelineBuilder`](super::PipelineBuilder). Stages run one at
/// a time in insertion order; once the state carries an error every
/// remaining stage is skipped.
#[derive(Clone)]
pub struct Pipeline {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub(super) fn new(
        name: String,
        stages: Vec<Arc<dyn Stage>>,
        event_sink: Option<Arc<dyn EventSink>>,
    ) -> Self {
        Self {
            name,
            stages,
            event_sink: event_sink.unwrap_or_else(|| Arc::new(NoOpEventSink)),
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs a fresh state for `query` and returns the final state.
    pub async fn invoke(&self, query: impl Into<String>) -> PipelineState {
        self.run(PipelineState::new(query)).await.into_state()
    }

    /// Runs every stage against `state`.
    pub async fn run(&self, state: PipelineState) -> PipelineRun {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", name = %self.name, %run_id);
        self.run_inner(run_id, state).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, mut state: PipelineState) -> PipelineRun {
        let timer = SpanTimer::start(&self.name);
        self.event_sink
            .emit(
                names::PIPELINE_STARTED,
                Some(json!({"pipeline": self.name, "run_id": run_id, "query": state.query})),
            )
            .await;

        let mut records = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            if should_continue(&state) == Route::End {
                debug!(stage = stage.name(), "skipping stage after earlier error");
                self.event_sink
                    .emit(names::STAGE_SKIPPED, Some(json!({"stage": stage.name()})))
                    .await;
                records.push(StageRecord::skipped(stage.name()));
                continue;
            }

            let started_at = Utc::now();
            self.event_sink
                .emit(
                    names::STAGE_STARTED,
                    Some(json!({"stage": stage.name(), "kind": stage.kind()})),
                )
                .await;

            let record = match stage.run(&mut state).await {
                StageStatus::Ok => StageRecord::completed(stage.name(), started_at),
                StageStatus::Fail => {
                    let error = state.error().unwrap_or_default().to_string();
                    StageRecord::failed(stage.name(), started_at, error)
                }
                StageStatus::Skip => StageRecord::skipped(stage.name()),
            };

            if let Some(ref error) = record.error {
                warn!(stage = stage.name(), %error, "stage failed");
                self.event_sink
                    .emit(names::STAGE_FAILED, Some(json!({"stage": stage.name(), "error": error})))
                    .await;
            } else {
                debug!(stage = stage.name(), duration_ms = record.duration_ms(), "stage completed");
                self.event_sink
                    .emit(
                        names::STAGE_COMPLETED,
                        Some(json!({"stage": stage.name(), "duration_ms": record.duration_ms()})),
                    )
                    .await;
            }
            records.push(record);
        }

        let duration_ms = timer.finish();
        let success = !state.has_error();
        info!(success, duration_ms, "pipeline finished");
        self.event_sink
            .emit(
                names::PIPELINE_COMPLETED,
                Some(json!({"pipeline": self.name, "run_id": run_id, "success": success, "duration_ms": duration_ms})),
            )
            .await;

        PipelineRun {
            run_id,
            pipeline: self.name.clone(),
            state,
            stages: records,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineResult;
    use crate::events::CollectingEventSink;
    use crate::pipeline::PipelineBuilder;
    use crate::prompt::PromptTemplate;
    use crate::stages::{GenerateStage, RetrieveStage};
    use crate::testing::{MockGenerator, MockRetriever};
    use pretty_assertions::assert_eq;

    fn pipeline(
        retriever: Arc<MockRetriever>,
        generator: Arc<MockGenerator>,
        sink: Arc<CollectingEventSink>,
    ) -> Pipeline {
        PipelineBuilder::new("test")
            .stage(Arc::new(RetrieveStage::new("retrieve", retriever, 2)))
            .stage(Arc::new(GenerateStage::new(
                "generate",
                generator,
                PromptTemplate::ProductRecommendation,
            )))
            .event_sink(sink)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_successful_run() {
        let retriever = Arc::new(MockRetriever::with_snippets(["one", "two", "three"]));
        let generator = Arc::new(MockGenerator::new("recommendation"));
        let sink = Arc::new(CollectingEventSink::new());

        let run = pipeline(retriever, generator, sink.clone()).run(PipelineState::new("q")).await;

        assert!(run.is_success());
        assert_eq!(run.state.context, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(run.state.result, Some(PipelineResult::Text("recommendation".into())));
        assert_eq!(run.stages.len(), 2);
        assert!(run.stages.iter().all(|r| r.status == StageStatus::Ok));
        assert_eq!(
            sink.event_types(),
            vec![
                "pipeline.started",
                "stage.started",
                "stage.completed",
                "stage.started",
                "stage.completed",
                "pipeline.completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_retrieval_failure_skips_generation() {
        let retriever = Arc::new(MockRetriever::failing("index missing"));
        let generator = Arc::new(MockGenerator::new("unused"));
        let sink = Arc::new(CollectingEventSink::new());

        let run = pipeline(retriever, generator.clone(), sink.clone())
            .run(PipelineState::new("q"))
            .await;

        assert!(!run.is_success());
        assert_eq!(generator.call_count(), 0);
        assert!(run.state.result.is_none());
        assert_eq!(run.stage("retrieve").map(|r| r.status), Some(StageStatus::Fail));
        assert_eq!(run.stage("generate").map(|r| r.status), Some(StageStatus::Skip));
        assert_eq!(sink.events_of_type("stage.skipped").len(), 1);
        assert_eq!(sink.events_of_type("stage.failed").len(), 1);
    }

    #[tokio::test]
    async fn test_preexisting_error_skips_everything() {
        let retriever = Arc::new(MockRetriever::with_snippets(["one"]));
        let generator = Arc::new(MockGenerator::new("unused"));
        let mut state = PipelineState::new("q");
        state.fail("rejected upstream");

        let run = pipeline(retriever.clone(), generator, Arc::new(CollectingEventSink::new()))
            .run(state)
            .await;

        assert_eq!(retriever.call_count(), 0);
        assert!(run.stages.iter().all(|r| r.status == StageStatus::Skip));
        assert_eq!(run.state.error(), Some("rejected upstream"));
    }

    #[tokio::test]
    async fn test_invoke_returns_state() {
        let p = pipeline(
            Arc::new(MockRetriever::with_snippets(["x"])),
            Arc::new(MockGenerator::new("y")),
            Arc::new(CollectingEventSink::new()),
        );
        let state = p.invoke("query text").await;

        assert_eq!(state.query, "query text");
        assert_eq!(p.name(), "test");
        assert!(format!("{p:?}").contains("retrieve"));
    }
}

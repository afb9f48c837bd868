//! Pipeline builder with validation.

use super::Pipeline;
use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::events::EventSink;
use crate::stages::Stage;
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for creating validated pipelines.
#[derive(Clone)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
    event_sink: Option<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("has_event_sink", &self.event_sink.is_some())
            .finish()
    }
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            event_sink: None,
        }
    }

    /// Appends a stage. Stages run in the order they are added.
    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the sink that receives lifecycle events.
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no stages or two stages share a name.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no stages")
                .with_error_info(
                    ContractErrorInfo::new("PIPELINE-EMPTY", "Cannot build an empty pipeline")
                        .with_context_entry("pipeline", &self.name)
                        .with_fix_hint("Add at least one stage to the pipeline before building."),
                ));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name()) {
                return Err(PipelineValidationError::new(format!(
                    "Duplicate stage name '{}'",
                    stage.name()
                ))
                .with_stages(vec![stage.name().to_string()])
                .with_error_info(
                    ContractErrorInfo::new(
                        "PIPELINE-DUPLICATE",
                        format!("Stage '{}' is defined more than once", stage.name()),
                    )
                    .with_fix_hint("Give every stage a unique name."),
                ));
            }
        }

        Ok(Pipeline::new(self.name, self.stages, self.event_sink))
    }
}

//! Lifecycle events emitted while a pipeline runs.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names.
pub mod names {
    /// A run began.
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    /// A run finished, successfully or not.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// A stage began.
    pub const STAGE_STARTED: &str = "stage.started";
    /// A stage finished without error.
    pub const STAGE_COMPLETED: &str = "stage.completed";
    /// A stage recorded an error.
    pub const STAGE_FAILED: &str = "stage.failed";
    /// A stage was not run because an earlier one failed.
    pub const STAGE_SKIPPED: &str = "stage.skipped";
}

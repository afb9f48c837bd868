//! Core types: the pipeline state record and per-stage outcomes.

mod record;
mod state;
mod status;

pub use record::{PipelineRun, StageRecord};
pub use state::{PipelineResult, PipelineState};
pub use status::{StageKind, StageStatus};

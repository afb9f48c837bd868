//! Per-stage records and the report returned from a pipeline run.

use super::{PipelineState, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one stage in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// Stage status.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageRecord {
    /// Creates a completed stage record.
    #[must_use]
    pub fn completed(name: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            status: StageStatus::Ok,
            started_at,
            ended_at: Utc::now(),
            error: None,
        }
    }

    /// Creates a failed stage record.
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: StageStatus::Fail,
            started_at,
            ended_at: Utc::now(),
            error: Some(error.into()),
        }
    }

    /// Creates a record for a stage that never ran.
    #[must_use]
    pub fn skipped(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            status: StageStatus::Skip,
            started_at: now,
            ended_at: now,
            error: None,
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }
}

/// Everything a caller gets back from [`Pipeline::run`](crate::pipeline::Pipeline::run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique id of this run.
    pub run_id: uuid::Uuid,
    /// Name of the pipeline that ran.
    pub pipeline: String,
    /// Final state.
    pub state: PipelineState,
    /// One record per stage, in execution order.
    pub stages: Vec<StageRecord>,
    /// Wall-clock duration of the run.
    pub duration_ms: f64,
}

impl PipelineRun {
    /// Returns true if no stage failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.state.has_error()
    }

    /// Returns the record for a stage by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|r| r.name == name)
    }

    /// Consumes the run and returns the final state.
    #[must_use]
    pub fn into_state(self) -> PipelineState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_record() {
        let record = StageRecord::completed("search_products", Utc::now());
        assert_eq!(record.status, StageStatus::Ok);
        assert!(record.error.is_none());
        assert!(record.duration_ms() >= 0.0);
    }

    #[test]
    fn test_failed_record() {
        let record = StageRecord::failed("generate", Utc::now(), "timeout");
        assert!(record.status.is_failure());
        assert_eq!(record.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_skipped_record_has_zero_duration() {
        let record = StageRecord::skipped("recommend");
        assert_eq!(record.status, StageStatus::Skip);
        assert!(record.duration_ms().abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_lookup() {
        let run = PipelineRun {
            run_id: uuid::Uuid::new_v4(),
            pipeline: "product".into(),
            state: PipelineState::new("q"),
            stages: vec![StageRecord::completed("a", Utc::now()), StageRecord::skipped("b")],
            duration_ms: 1.0,
        };

        assert!(run.is_success());
        assert_eq!(run.stage("b").map(|r| r.status), Some(StageStatus::Skip));
        assert!(run.stage("c").is_none());
        assert_eq!(run.into_state().query, "q");
    }
}

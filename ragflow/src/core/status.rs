//! Stage status and kind enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of work a stage performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Adds context to the state (similarity search).
    Enrich,
    /// Turns context into model output (prompt + LLM).
    Transform,
    /// Writes a result without calling a service.
    #[default]
    Work,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enrich => write!(f, "enrich"),
            Self::Transform => write!(f, "transform"),
            Self::Work => write!(f, "work"),
        }
    }
}

/// The outcome of a stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage was skipped because an earlier stage failed.
    Skip,
    /// Stage failed and recorded an error in the state.
    Fail,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Skip => write!(f, "skip"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_display() {
        assert_eq!(StageKind::Enrich.to_string(), "enrich");
        assert_eq!(StageKind::Transform.to_string(), "transform");
        assert_eq!(StageKind::default().to_string(), "work");
    }

    #[test]
    fn test_stage_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Skip).unwrap();
        assert_eq!(json, r#""skip""#);

        let deserialized: StageStatus = serde_json::from_str(r#""fail""#).unwrap();
        assert!(deserialized.is_failure());
    }
}

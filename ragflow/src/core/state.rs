//! The mutable record threaded through every stage of a run.

use serde::{Deserialize, Serialize};

/// What a run produced: generated text or a fixed list of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineResult {
    /// Text returned by the generator.
    Text(String),
    /// A list of items written without calling a model.
    Items(Vec<String>),
}

impl PipelineResult {
    /// Returns the text if this is a text result.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Items(_) => None,
        }
    }

    /// Returns the items if this is a list result.
    #[must_use]
    pub fn as_items(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::Items(items) => Some(items),
        }
    }
}

/// State for a single pipeline invocation.
///
/// Created fresh per request, passed by `&mut` through each stage and handed
/// back to the caller once the run terminates. An error implies that every
/// stage after the failing one was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    /// The user query.
    pub query: String,
    /// Retrieved snippets, in the order the store returned them.
    #[serde(default)]
    pub context: Vec<String>,
    /// The last prompt sent to the generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Generated summary (customer profile workflow).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// The final result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<PipelineResult>,
    /// Error recorded by the failing stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineState {
    /// Creates a fresh state for a query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Returns the recorded error, treating an empty string as unset.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// Returns true if a stage recorded an error.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error().is_some()
    }

    /// Records an error.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_state_is_empty() {
        let state = PipelineState::new("running shoes");
        assert_eq!(state.query, "running shoes");
        assert!(state.context.is_empty());
        assert!(state.result.is_none());
        assert!(!state.has_error());
    }

    #[test]
    fn test_empty_error_is_unset() {
        let mut state = PipelineState::new("q");
        state.error = Some(String::new());
        assert!(!state.has_error());

        state.fail("boom");
        assert_eq!(state.error(), Some("boom"));
    }

    #[test]
    fn test_result_serializes_untagged() {
        let text = serde_json::to_value(PipelineResult::Text("buy these".into())).unwrap();
        assert_eq!(text, serde_json::json!("buy these"));

        let items = serde_json::to_value(PipelineResult::Items(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(items, serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_result_accessors() {
        let text = PipelineResult::Text("x".into());
        assert_eq!(text.as_text(), Some("x"));
        assert!(text.as_items().is_none());

        let items = PipelineResult::Items(vec!["y".into()]);
        assert_eq!(items.as_items(), Some(&["y".to_string()][..]));
    }

    #[test]
    fn test_state_skips_unset_fields() {
        let json = serde_json::to_value(PipelineState::new("q")).unwrap();
        assert_eq!(json, serde_json::json!({"query": "q", "context": []}));
    }
}

//! The single routing decision between stages.

use crate::core::PipelineState;
use serde::{Deserialize, Serialize};

/// Where the run goes after a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Run the next stage, or finish if there is none.
    Continue,
    /// Stop now.
    End,
}

/// Ends the run as soon as the state carries an error.
#[must_use]
pub fn should_continue(state: &PipelineState) -> Route {
    if state.has_error() {
        Route::End
    } else {
        Route::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_on_error() {
        let mut state = PipelineState::new("q");
        assert_eq!(should_continue(&state), Route::Continue);

        state.error = Some(String::new());
        assert_eq!(should_continue(&state), Route::Continue);

        state.fail("Error searching products: timeout");
        assert_eq!(should_continue(&state), Route::End);
    }
}

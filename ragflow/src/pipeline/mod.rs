//! Pipeline building and execution.
//!
//! This module provides:
//! - A builder that validates stage lists
//! - The sequential runner with its error short-circuit
//! - Ready-made product and customer workflows

mod builder;
mod routing;
mod runner;
pub mod workflows;

pub use builder::PipelineBuilder;
pub use routing::{should_continue, Route};
pub use runner::Pipeline;

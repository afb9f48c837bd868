//! # Ragflow
//!
//! Retrieval-augmented pipelines that pull documents from a vector store and
//! hand them to a language model.
//!
//! Two workflows are provided:
//!
//! - **Product recommendation**: similarity search over product
//!   descriptions, then an LLM writes personalised recommendations.
//! - **Customer profile**: similarity search over customer profiles, an LLM
//!   summary, then a fixed list of recommended items.
//!
//! Both run as a short linear pipeline over a single mutable
//! [`PipelineState`](core::PipelineState). A stage that fails writes an error
//! string into the state and every later stage is skipped.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragflow::prelude::*;
//!
//! let config = PipelineConfig::from_env()?;
//! let services = Services::from_config(&config)?;
//! let pipeline = workflows::build(services.retriever, services.generator, &config, None)?;
//!
//! let handler = RecommendationHandler::new(pipeline, &config);
//! let response = handler.handle(&serde_json::json!({"query": "running shoes"})).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod handler;
pub mod indexing;
pub mod observability;
pub mod pipeline;
pub mod ports;
pub mod prompt;
pub mod stages;
pub mod testing;

#[cfg(feature = "http")]
pub mod providers;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{PipelineConfig, Variant, VectorStoreConfig};
    pub use crate::core::{PipelineResult, PipelineRun, PipelineState, StageRecord, StageStatus};
    pub use crate::errors::{PipelineValidationError, RagflowError, Result};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::handler::{HandlerResponse, RecommendationHandler};
    pub use crate::indexing::{Product, ProductIndexer};
    pub use crate::pipeline::{should_continue, workflows, Pipeline, PipelineBuilder, Route};
    pub use crate::ports::{Document, Embedder, Generator, LlmResponse, Retriever, VectorIndex};
    pub use crate::prompt::PromptTemplate;
    pub use crate::stages::Stage;

    #[cfg(feature = "http")]
    pub use crate::providers::Services;
}

//! The two workflows: product recommendation and customer profile summary.

use super::{Pipeline, PipelineBuilder};
use crate::config::{PipelineConfig, Variant};
use crate::errors::PipelineValidationError;
use crate::events::EventSink;
use crate::ports::{Generator, Retriever};
use crate::prompt::PromptTemplate;
use crate::stages::{GenerateStage, GenerationTarget, RecommendStage, RetrieveStage};
use std::sync::Arc;

/// Stage name: product similarity search.
pub const SEARCH_PRODUCTS: &str = "search_products";
/// Stage name: product recommendation generation.
pub const GENERATE_RECOMMENDATIONS: &str = "generate_recommendations";
/// Stage name: customer profile search.
pub const PROFILE: &str = "profile";
/// Stage name: customer profile summary.
pub const SUMMARIZE: &str = "summarize";
/// Stage name: fixed recommendation list.
pub const RECOMMEND: &str = "recommend";

/// `search_products` → `generate_recommendations`.
pub fn product_recommendation(
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    config: &PipelineConfig,
) -> PipelineBuilder {
    PipelineBuilder::new("product_recommendation")
        .stage(Arc::new(
            RetrieveStage::new(SEARCH_PRODUCTS, retriever, config.vector_store.top_k)
                .with_error_prefix("Error searching products"),
        ))
        .stage(Arc::new(
            GenerateStage::new(
                GENERATE_RECOMMENDATIONS,
                generator,
                PromptTemplate::ProductRecommendation,
            )
            .with_error_prefix("Error generating recommendations"),
        ))
}

/// `profile` → `summarize` → `recommend`.
pub fn customer_profile(
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    config: &PipelineConfig,
) -> PipelineBuilder {
    PipelineBuilder::new("customer_profile")
        .stage(Arc::new(
            RetrieveStage::new(PROFILE, retriever, config.vector_store.top_k)
                .with_error_prefix("Error retrieving customer profile"),
        ))
        .stage(Arc::new(
            GenerateStage::new(SUMMARIZE, generator, PromptTemplate::CustomerSummary)
                .with_target(GenerationTarget::Summary)
                .with_error_prefix("Error summarizing customer profile"),
        ))
        .stage(Arc::new(RecommendStage::new(
            RECOMMEND,
            config.recommendations.clone(),
        )))
}

/// Builds the workflow selected by `config.variant`.
pub fn build(
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    config: &PipelineConfig,
    event_sink: Option<Arc<dyn EventSink>>,
) -> Result<Pipeline, PipelineValidationError> {
    let builder = match config.variant {
        Variant::Product => product_recommendation(retriever, generator, config),
        Variant::Customer => customer_profile(retriever, generator, config),
    };
    match event_sink {
        Some(sink) => builder.event_sink(sink).build(),
        None => builder.build(),
    }
}

//! HTTP adapters for the ports: Bedrock for embedding and generation,
//! OpenSearch for similarity search and indexing.
//!
//! Request signing (SigV4) is not performed. Bedrock calls use an optional
//! bearer API key; OpenSearch calls use optional basic auth.

mod bedrock;
mod http;
mod opensearch;

pub use bedrock::{AnthropicApi, BedrockClient, BedrockEmbedder, BedrockGenerator};
pub use opensearch::{OpenSearchClient, OpenSearchIndex, OpenSearchRetriever};

use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::ports::Embedder;
use std::sync::Arc;

/// Adapters wired from one configuration.
#[derive(Clone)]
pub struct Services {
    /// Similarity search over the configured index.
    pub retriever: Arc<OpenSearchRetriever>,
    /// Text generation.
    pub generator: Arc<BedrockGenerator>,
    /// Embedding model, shared with the retriever.
    pub embedder: Arc<BedrockEmbedder>,
    /// Writable handle on the configured index.
    pub index: Arc<OpenSearchIndex>,
}

impl Services {
    /// Validates `config` and builds every adapter.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let timeout = config.timeout();

        let bedrock = BedrockClient::new(&config.bedrock, timeout)?;
        let embedder = Arc::new(BedrockEmbedder::new(bedrock.clone(), &config.embedding));
        let generator = Arc::new(BedrockGenerator::new(bedrock, config.llm.clone()));

        let opensearch = OpenSearchClient::new(&config.vector_store, timeout)?;
        let retriever = Arc::new(OpenSearchRetriever::new(
            opensearch.clone(),
            embedder.clone() as Arc<dyn Embedder>,
            &config.vector_store,
        ));
        let index = Arc::new(OpenSearchIndex::new(opensearch));

        Ok(Self {
            retriever,
            generator,
            embedder,
            index,
        })
    }
}

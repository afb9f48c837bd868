//! OpenSearch k-NN adapters.

use super::http::{build_client, read_json};
use crate::config::VectorStoreConfig;
use crate::errors::{RagflowError, Result};
use crate::ports::{Document, Embedder, Retriever, VectorIndex};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "opensearch";

/// Connection to one index on an OpenSearch domain.
#[derive(Clone)]
pub struct OpenSearchClient {
    http: Client,
    base_url: String,
    index: String,
    username: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for OpenSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchClient")
            .field("base_url", &self.base_url)
            .field("index", &self.index)
            .field("has_auth", &self.username.is_some())
            .finish()
    }
}

impl OpenSearchClient {
    /// Creates a client for the configured domain and index.
    pub fn new(config: &VectorStoreConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: config.base_url(),
            index: config.index.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Returns the index name.
    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Returns the URL of `segments` under the index.
    ///
    /// Each segment is percent-encoded on its own, so a document id holding
    /// `/`, `?` or `#` stays a single path segment.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|err| {
            RagflowError::Config(format!("invalid OpenSearch endpoint '{}': {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                RagflowError::Config(format!("OpenSearch endpoint '{}' cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .push(&self.index)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let request = self.http.request(method, self.url(segments)?);
        Ok(match self.username {
            Some(ref user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        })
    }
}

/// Builds a k-NN search body returning the `k` nearest documents.
#[must_use]
pub(crate) fn knn_query(vector_field: &str, vector: &[f32], k: usize) -> Value {
    let mut field = Map::new();
    field.insert(vector_field.to_string(), json!({ "vector": vector, "k": k }));
    json!({
        "size": k,
        "query": { "knn": Value::Object(field) },
        "_source": { "excludes": [vector_field] },
    })
}

/// Turns search hits into documents, best first.
pub(crate) fn parse_hits(body: &Value, text_field: &str, vector_field: &str) -> Result<Vec<Document>> {
    let hits = body
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| RagflowError::Decode("opensearch: response has no hits".to_string()))?;

    hits.iter()
        .map(|hit| {
            let mut source = hit
                .get("_source")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let text = match source.remove(text_field) {
                Some(Value::String(text)) => text,
                _ => {
                    let id = hit.get("_id").and_then(Value::as_str).unwrap_or("?");
                    return Err(RagflowError::Decode(format!(
                        "opensearch: hit '{id}' has no text field '{text_field}'"
                    )));
                }
            };
            source.remove(vector_field);
            if let Some(score) = hit.get("_score") {
                source.insert("_score".to_string(), score.clone());
            }
            Ok(Document {
                page_content: text,
                metadata: source,
            })
        })
        .collect()
}

/// Embeds the query and runs a k-NN search.
pub struct OpenSearchRetriever {
    client: OpenSearchClient,
    embedder: Arc<dyn Embedder>,
    text_field: String,
    vector_field: String,
}

impl std::fmt::Debug for OpenSearchRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSearchRetriever")
            .field("client", &self.client)
            .field("text_field", &self.text_field)
            .field("vector_field", &self.vector_field)
            .finish_non_exhaustive()
    }
}

impl OpenSearchRetriever {
    /// Creates the retriever.
    pub fn new(client: OpenSearchClient, embedder: Arc<dyn Embedder>, config: &VectorStoreConfig) -> Self {
        Self {
            client,
            embedder,
            text_field: config.text_field.clone(),
            vector_field: config.vector_field.clone(),
        }
    }
}

#[async_trait]
impl Retriever for OpenSearchRetriever {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let vector = self.embedder.embed(query).await?;
        let body = knn_query(&self.vector_field, &vector, k);

        let response = self.client.request(Method::POST, &["_search"])?.json(&body).send().await?;
        let answer = read_json(SERVICE, response).await?;
        let documents = parse_hits(&answer, &self.text_field, &self.vector_field)?;
        debug!(index = self.client.index(), k, hits = documents.len(), "knn search");
        Ok(documents)
    }
}

/// Index management and document writes.
#[derive(Debug, Clone)]
pub struct OpenSearchIndex {
    client: OpenSearchClient,
}

impl OpenSearchIndex {
    /// Creates the handle.
    #[must_use]
    pub fn new(client: OpenSearchClient) -> Self {
        Self { client }
    }

    /// Returns the index name.
    #[must_use]
    pub fn index_name(&self) -> &str {
        self.client.index()
    }
}

#[async_trait]
impl VectorIndex for OpenSearchIndex {
    async fn index_exists(&self) -> Result<bool> {
        let response = self.client.request(Method::HEAD, &[])?.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(RagflowError::service(SERVICE, status.as_u16(), String::new())),
        }
    }

    async fn create_index(&self, mapping: &Value) -> Result<()> {
        let response = self.client.request(Method::PUT, &[])?.json(mapping).send().await?;
        read_json(SERVICE, response).await?;
        Ok(())
    }

    async fn index_document(&self, id: &str, document: &Value) -> Result<()> {
        let response = self
            .client
            .request(Method::PUT, &["_doc", id])?
            .json(document)
            .send()
            .await?;
        read_json(SERVICE, response).await?;
        Ok(())
    }
}

//! Mock ports that record their calls.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{RagflowError, Result};
use crate::ports::{Document, Generator, LlmResponse, Retriever};

/// A retriever returning canned documents, or failing every call.
#[derive(Debug, Default)]
pub struct MockRetriever {
    documents: Vec<Document>,
    failure: Option<String>,
    call_count: AtomicUsize,
    calls: Mutex<Vec<(String, usize)>>,
}

impl MockRetriever {
    /// Creates a retriever returning `documents` (truncated to `k`).
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// Creates a retriever returning one document per snippet.
    #[must_use]
    pub fn with_snippets<I, S>(snippets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(snippets.into_iter().map(Document::new).collect())
    }

    /// Creates a retriever whose every call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Returns `(query, k)` for every call.
    #[must_use]
    pub fn recorded_calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push((query.to_string(), k));

        if let Some(ref message) = self.failure {
            return Err(RagflowError::Retrieval(message.clone()));
        }
        Ok(self.documents.iter().take(k).cloned().collect())
    }
}

/// A generator returning a canned response, or failing every call.
#[derive(Debug, Default)]
pub struct MockGenerator {
    response: String,
    failure: Option<String>,
    call_count: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// Creates a generator answering every prompt with `response`.
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    /// Creates a generator whose every call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Returns every prompt received.
    #[must_use]
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        match self.failure {
            Some(ref message) => Err(RagflowError::Generation(message.clone())),
            None => Ok(LlmResponse::new(self.response.clone(), "mock-model", "mock")),
        }
    }
}

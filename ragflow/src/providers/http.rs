//! Shared reqwest plumbing.

use crate::errors::{RagflowError, Result};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagflowError::Http(format!("failed to build HTTP client: {e}")))
}

/// Reads the body, mapping non-2xx statuses to [`RagflowError::Service`].
pub(crate) async fn read_json(service: &str, response: Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(RagflowError::service(service, status.as_u16(), body));
    }
    serde_json::from_str(&body).map_err(|e| RagflowError::Decode(format!("{service}: {e}")))
}

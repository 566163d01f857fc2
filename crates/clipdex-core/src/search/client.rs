//! OpenSearch-compatible REST client.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{SearchError, SearchResult};
use crate::config::SearchConfig;

/// Minimal index operations the pipeline needs from the search backend.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Whether the named index exists.
    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    /// Create an index with the given settings and mappings. Idempotent:
    /// losing a creation race to a concurrent writer reports success.
    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()>;

    /// Insert or replace a document by id.
    async fn put_document(&self, index: &str, id: &str, document: &Value) -> SearchResult<()>;
}

/// REST client for an OpenSearch-compatible backend.
pub struct OpenSearchClient {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl OpenSearchClient {
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::ConnectionFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }
        request
    }
}

#[async_trait]
impl SearchIndex for OpenSearchClient {
    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        let response = self
            .request(Method::HEAD, &format!("/{}", index))
            .send()
            .await
            .map_err(|e| SearchError::ConnectionFailed(e.to_string()))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SearchError::ConnectionFailed(format!(
                "index existence check returned {}",
                status
            ))),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> SearchResult<()> {
        let response = self
            .request(Method::PUT, &format!("/{}", index))
            .json(body)
            .send()
            .await
            .map_err(|e| SearchError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        if is_already_exists_error(&text) {
            // A concurrent first invocation won the creation race; the
            // index is there, which is all ensure_index needs.
            debug!("Index {} was created concurrently", index);
            return Ok(());
        }

        Err(SearchError::IndexCreationFailed(format!(
            "{}: {}",
            status,
            truncate(&text)
        )))
    }

    async fn put_document(&self, index: &str, id: &str, document: &Value) -> SearchResult<()> {
        let response = self
            .request(Method::PUT, &format!("/{}/_doc/{}", index, id))
            .json(document)
            .send()
            .await
            .map_err(|e| SearchError::DocumentWriteFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SearchError::DocumentWriteFailed(format!(
                "{}: {}",
                status,
                truncate(&text)
            )));
        }

        debug!("Indexed document {} into {}", id, index);
        Ok(())
    }
}

/// True when an index-creation failure is the benign already-exists race.
fn is_already_exists_error(body: &str) -> bool {
    body.contains("resource_already_exists_exception")
}

fn truncate(body: &str) -> String {
    body.chars().take(500).collect()
}

//! Object Storage Access
//!
//! The pipeline reads the embedding payload and the source video from, and
//! writes thumbnails to, an object store. The [`ObjectStore`] trait is the
//! seam; the shipped implementation targets an S3-compatible HTTP gateway
//! with path-style URLs.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::StorageConfig;

/// Storage error types.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid object URI: {0}")]
    InvalidUri(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Parse an `s3://bucket/key` URI into (bucket, key).
///
/// The key may be empty (a bare bucket URI); the bucket may not.
pub fn parse_object_uri(uri: &str) -> StorageResult<(String, String)> {
    let rest = uri
        .strip_prefix("s3://")
        .ok_or_else(|| StorageError::InvalidUri(uri.to_string()))?;

    let (bucket, key) = match rest.split_once('/') {
        Some((bucket, key)) => (bucket, key),
        None => (rest, ""),
    };

    if bucket.is_empty() {
        return Err(StorageError::InvalidUri(uri.to_string()));
    }

    Ok((bucket.to_string(), key.to_string()))
}

/// Build the canonical `s3://` locator for an object.
pub fn object_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

/// Backend-agnostic object operations used by the pipeline.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object fully into memory.
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>>;

    /// Stream an object to a local file, returning the byte count.
    async fn download_to_file(&self, bucket: &str, key: &str, dest: &Path) -> StorageResult<u64>;

    /// Store an object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;
}

/// S3-compatible object store addressed path-style over HTTP.
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::RequestFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket, key)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder, uri: &str) -> StorageResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(format!("{}: {}", uri, e)))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            reqwest::StatusCode::NOT_FOUND => Err(StorageError::NotFound(uri.to_string())),
            status => Err(StorageError::RequestFailed(format!("{}: {}", uri, status))),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let uri = object_uri(bucket, key);
        let request = self.request(reqwest::Method::GET, self.object_url(bucket, key));
        let response = self.send(request, &uri).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::RequestFailed(format!("{}: {}", uri, e)))?;

        debug!("Fetched {} ({} bytes)", uri, bytes.len());
        Ok(bytes.to_vec())
    }

    async fn download_to_file(&self, bucket: &str, key: &str, dest: &Path) -> StorageResult<u64> {
        let uri = object_uri(bucket, key);
        let request = self.request(reqwest::Method::GET, self.object_url(bucket, key));
        let mut response = self.send(request, &uri).await?;

        // Stream to disk so large videos never sit in memory whole.
        let mut file = tokio::fs::File::create(dest).await?;
        let mut total_bytes: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| StorageError::RequestFailed(format!("{}: {}", uri, e)))?
        {
            total_bytes = total_bytes.saturating_add(chunk.len() as u64);
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("Downloaded {} to {} ({} bytes)", uri, dest.display(), total_bytes);
        Ok(total_bytes)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        let uri = object_uri(bucket, key);
        let request = self
            .request(reqwest::Method::PUT, self.object_url(bucket, key))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        self.send(request, &uri).await?;

        debug!("Stored {}", uri);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bucket_and_key() {
        let (bucket, key) = parse_object_uri("s3://embeddings/runs/part-0").unwrap();
        assert_eq!(bucket, "embeddings");
        assert_eq!(key, "runs/part-0");
    }

    #[test]
    fn parses_bare_bucket() {
        let (bucket, key) = parse_object_uri("s3://embeddings").unwrap();
        assert_eq!(bucket, "embeddings");
        assert_eq!(key, "");
    }

    #[test]
    fn rejects_non_s3_schemes_and_empty_buckets() {
        assert!(matches!(
            parse_object_uri("http://embeddings/runs"),
            Err(StorageError::InvalidUri(_))
        ));
        assert!(matches!(
            parse_object_uri("s3:///runs"),
            Err(StorageError::InvalidUri(_))
        ));
    }

    #[test]
    fn object_uri_round_trips() {
        let uri = object_uri("thumbs", "thumbnails/abc.jpg");
        assert_eq!(uri, "s3://thumbs/thumbnails/abc.jpg");
        let (bucket, key) = parse_object_uri(&uri).unwrap();
        assert_eq!(bucket, "thumbs");
        assert_eq!(key, "thumbnails/abc.jpg");
    }

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        let store = HttpObjectStore::new(&StorageConfig {
            endpoint: "http://localhost:9000/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            store.object_url("videos", "raw/demo.mp4"),
            "http://localhost:9000/videos/raw/demo.mp4"
        );
    }
}

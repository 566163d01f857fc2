//! Pipeline Configuration
//!
//! Every backend client is constructed from one of these structs. Nothing
//! in the library reads the process environment or keeps global client
//! state; the caller builds a [`PipelineConfig`] and passes it in, which is
//! also how tests inject fakes.

use std::path::PathBuf;
use std::time::Duration;

/// Default embedding vector dimensionality.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 512;

/// Default clip index name.
pub const DEFAULT_INDEX_NAME: &str = "video_clips";

/// Key prefix for uploaded thumbnails.
pub const DEFAULT_THUMBNAIL_PREFIX: &str = "thumbnails/";

/// Default timeout for object storage and search backend requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on a single ffmpeg invocation.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Search backend connection and index settings.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base URL of the OpenSearch-compatible backend.
    pub endpoint: String,
    /// Name of the clip index.
    pub index_name: String,
    /// Optional basic-auth username.
    pub username: Option<String>,
    /// Optional basic-auth password.
    pub password: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9200".to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            username: None,
            password: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Object storage connection settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base URL of the S3-compatible gateway. Objects are addressed
    /// path-style as `{endpoint}/{bucket}/{key}`.
    pub endpoint: String,
    /// Optional bearer token sent with every request.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            token: None,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// Bucket receiving extracted frames. `None` disables uploads, which
    /// leaves every clip's `thumbnail_path` null.
    pub bucket: Option<String>,
    /// Key prefix under which thumbnails are stored.
    pub key_prefix: String,
    /// Output frame size (width, height).
    pub scale: (u32, u32),
    /// Bound on a single ffmpeg invocation.
    pub extraction_timeout: Duration,
    /// Explicit ffmpeg binary path. `None` means search `PATH`.
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            key_prefix: DEFAULT_THUMBNAIL_PREFIX.to_string(),
            scale: (640, 360),
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
            ffmpeg_path: None,
        }
    }
}

/// Complete configuration for one pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub search: SearchConfig,
    pub storage: StorageConfig,
    pub thumbnails: ThumbnailConfig,
    /// Expected embedding dimensionality; segments with any other vector
    /// length are rejected.
    pub embedding_dimension: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            storage: StorageConfig::default(),
            thumbnails: ThumbnailConfig::default(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let config = PipelineConfig::default();
        assert_eq!(config.embedding_dimension, 512);
        assert_eq!(config.search.index_name, DEFAULT_INDEX_NAME);
        assert_eq!(config.thumbnails.key_prefix, "thumbnails/");
        assert_eq!(config.thumbnails.scale, (640, 360));
        assert!(config.thumbnails.bucket.is_none());
    }
}

//! Thumbnail Generation
//!
//! Extracts a representative frame per clip from the already-downloaded
//! source video and stores it durably, returning a stable locator.
//! Thumbnails are best-effort: every failure path logs, returns `None`,
//! and must never abort indexing of the owning clip.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ThumbnailConfig;
use crate::ffmpeg::FrameExtractor;
use crate::storage::{object_uri, ObjectStore};

/// Thumbnail service for indexed clips.
pub struct ThumbnailService {
    extractor: FrameExtractor,
    store: Arc<dyn ObjectStore>,
    bucket: Option<String>,
    key_prefix: String,
}

impl ThumbnailService {
    pub fn new(extractor: FrameExtractor, store: Arc<dyn ObjectStore>, config: &ThumbnailConfig) -> Self {
        Self {
            extractor,
            store,
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.clone(),
        }
    }

    /// Extract a frame at `timestamp` and upload it, returning the durable
    /// locator, or `None` on any failure. Intermediate frame files live in
    /// a scoped temporary directory removed on every path.
    pub async fn generate(&self, video_path: &Path, timestamp: f64) -> Option<String> {
        let bucket = match &self.bucket {
            Some(bucket) => bucket.clone(),
            None => {
                warn!("Thumbnail bucket not configured, skipping upload");
                return None;
            }
        };

        let temp_dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Failed to create thumbnail scratch directory: {}", e);
                return None;
            }
        };
        let frame_path = temp_dir.path().join("thumbnail_frame.jpg");

        if let Err(e) = self.extractor.extract_frame(video_path, timestamp, &frame_path).await {
            warn!("Frame extraction at {:.2}s failed: {}", timestamp, e);
            return None;
        }

        let frame = match tokio::fs::read(&frame_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read extracted frame: {}", e);
                return None;
            }
        };

        let key = format!("{}{}.jpg", self.key_prefix, Uuid::new_v4());
        match self.store.put_object(&bucket, &key, frame, "image/jpeg").await {
            Ok(()) => {
                let uri = object_uri(&bucket, &key);
                debug!("Uploaded thumbnail {}", uri);
                Some(uri)
            }
            Err(e) => {
                warn!("Thumbnail upload failed: {}", e);
                None
            }
        }
        // temp_dir drops here, deleting the frame on success and failure alike.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, StorageResult};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<HashMap<(String, String), Vec<u8>>>,
        fail_puts: bool,
    }

    #[async_trait::async_trait]
    impl ObjectStore for MemoryStore {
        async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
            self.objects
                .lock()
                .unwrap()
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| StorageError::NotFound(object_uri(bucket, key)))
        }

        async fn download_to_file(
            &self,
            bucket: &str,
            key: &str,
            dest: &Path,
        ) -> StorageResult<u64> {
            let bytes = self.get_object(bucket, key).await?;
            std::fs::write(dest, &bytes)?;
            Ok(bytes.len() as u64)
        }

        async fn put_object(
            &self,
            bucket: &str,
            key: &str,
            body: Vec<u8>,
            _content_type: &str,
        ) -> StorageResult<()> {
            if self.fail_puts {
                return Err(StorageError::RequestFailed("injected failure".to_string()));
            }
            self.objects
                .lock()
                .unwrap()
                .insert((bucket.to_string(), key.to_string()), body);
            Ok(())
        }
    }

    fn config(bucket: Option<&str>) -> ThumbnailConfig {
        ThumbnailConfig {
            bucket: bucket.map(str::to_string),
            ..Default::default()
        }
    }

    #[cfg(unix)]
    fn stub_extractor(dir: &Path, script: &str) -> FrameExtractor {
        use std::os::unix::fs::PermissionsExt;
        let stub = dir.join("ffmpeg-stub");
        std::fs::write(&stub, script).unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
        FrameExtractor::new(stub)
    }

    /// Stub that writes its last argument (the output frame path).
    #[cfg(unix)]
    const WRITING_STUB: &str = "#!/bin/sh\nfor arg in \"$@\"; do out=\"$arg\"; done\nprintf 'jpeg-bytes' > \"$out\"\n";

    #[tokio::test]
    async fn missing_tool_yields_none() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("video.mp4");
        std::fs::write(&video, b"stub").unwrap();

        let store = Arc::new(MemoryStore::default());
        let service = ThumbnailService::new(
            FrameExtractor::new("/nonexistent/bin/ffmpeg"),
            store.clone(),
            &config(Some("thumbs")),
        );

        assert!(service.generate(&video, 1.0).await.is_none());
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unconfigured_bucket_yields_none() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("video.mp4");
        std::fs::write(&video, b"stub").unwrap();

        let store = Arc::new(MemoryStore::default());
        let service =
            ThumbnailService::new(FrameExtractor::new("ffmpeg"), store, &config(None));
        assert!(service.generate(&video, 1.0).await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_extraction_uploads_and_returns_locator() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("video.mp4");
        std::fs::write(&video, b"stub").unwrap();

        let store = Arc::new(MemoryStore::default());
        let service = ThumbnailService::new(
            stub_extractor(temp.path(), WRITING_STUB),
            store.clone(),
            &config(Some("thumbs")),
        );

        let locator = service.generate(&video, 2.5).await.unwrap();
        assert!(locator.starts_with("s3://thumbs/thumbnails/"));
        assert!(locator.ends_with(".jpg"));

        let objects = store.objects.lock().unwrap();
        assert_eq!(objects.len(), 1);
        let ((bucket, key), body) = objects.iter().next().unwrap();
        assert_eq!(bucket, "thumbs");
        assert!(key.starts_with("thumbnails/"));
        assert_eq!(body, b"jpeg-bytes");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn locators_are_unique_per_invocation() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("video.mp4");
        std::fs::write(&video, b"stub").unwrap();

        let store = Arc::new(MemoryStore::default());
        let service = ThumbnailService::new(
            stub_extractor(temp.path(), WRITING_STUB),
            store,
            &config(Some("thumbs")),
        );

        let first = service.generate(&video, 0.0).await.unwrap();
        let second = service.generate(&video, 0.0).await.unwrap();
        assert_ne!(first, second);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn upload_failure_yields_none() {
        let temp = tempfile::tempdir().unwrap();
        let video = temp.path().join("video.mp4");
        std::fs::write(&video, b"stub").unwrap();

        let store = Arc::new(MemoryStore {
            fail_puts: true,
            ..Default::default()
        });
        let service = ThumbnailService::new(
            stub_extractor(temp.path(), WRITING_STUB),
            store,
            &config(Some("thumbs")),
        );
        assert!(service.generate(&video, 1.0).await.is_none());
    }
}

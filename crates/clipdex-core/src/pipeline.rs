//! Indexing Pipeline
//!
//! End-to-end orchestration: load the embedding payload, consolidate
//! segments into clips, download the source video once, attach thumbnails,
//! and upsert one document per clip. Document writes are independent; a
//! failed clip is logged and skipped, never aborting the remaining writes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::clip::VideoContext;
use crate::config::PipelineConfig;
use crate::consolidate::consolidate_segments;
use crate::error::{PipelineError, PipelineResult};
use crate::ffmpeg::FrameExtractor;
use crate::search::{IndexManager, OpenSearchClient, SearchIndex};
use crate::segment::EmbeddingPayload;
use crate::storage::{object_uri, parse_object_uri, HttpObjectStore, ObjectStore, StorageError};
use crate::thumbnail::ThumbnailService;

/// Source video location in object storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoLocation {
    pub bucket: String,
    pub key: String,
}

/// Input for one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingRequest {
    /// Location of the embedding output; `output.json` is read beneath it.
    pub output_location: String,
    /// Caller-supplied shard index.
    pub part: i32,
    /// Source video to thumbnail.
    pub original_video: VideoLocation,
    /// Categories attached to every clip.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
}

fn default_categories() -> Vec<String> {
    vec!["Uncategorized".to_string()]
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingReport {
    pub part: i32,
    pub video_id: String,
    pub clips_indexed: usize,
}

/// The consolidation and indexing pipeline.
///
/// Backends are injected: production wiring comes from
/// [`IndexingPipeline::from_config`], tests pass in-memory fakes through
/// [`IndexingPipeline::new`].
pub struct IndexingPipeline {
    store: Arc<dyn ObjectStore>,
    search: Arc<dyn SearchIndex>,
    index_manager: IndexManager,
    thumbnails: ThumbnailService,
    index_name: String,
    embedding_dimension: usize,
}

impl IndexingPipeline {
    /// Build a pipeline with HTTP-backed storage and search clients.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        let store: Arc<dyn ObjectStore> = Arc::new(HttpObjectStore::new(&config.storage)?);
        let search: Arc<dyn SearchIndex> = Arc::new(OpenSearchClient::new(&config.search)?);
        Ok(Self::new(store, search, config))
    }

    /// Build a pipeline over explicit backends.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        search: Arc<dyn SearchIndex>,
        config: &PipelineConfig,
    ) -> Self {
        let extractor = FrameExtractor::from_config(&config.thumbnails);
        let thumbnails = ThumbnailService::new(extractor, store.clone(), &config.thumbnails);
        let index_manager = IndexManager::new(
            search.clone(),
            config.search.index_name.clone(),
            config.embedding_dimension,
        );

        Self {
            store,
            search,
            index_manager,
            thumbnails,
            index_name: config.search.index_name.clone(),
            embedding_dimension: config.embedding_dimension,
        }
    }

    /// Run the pipeline once.
    ///
    /// Fatal errors (missing payload, unreachable backend) propagate to the
    /// caller for upstream retry; per-segment and per-clip failures degrade
    /// to a partial result. A fresh `video_id` is generated per run, so
    /// concurrent invocations never collide on clip identities.
    pub async fn run(&self, request: &IndexingRequest) -> PipelineResult<IndexingReport> {
        let video_id = Uuid::new_v4().to_string();
        info!(
            part = request.part,
            video_id = %video_id,
            "Processing embeddings from {}",
            request.output_location
        );

        self.index_manager.ensure_index().await?;

        let payload = self.load_payload(&request.output_location).await?;

        let context = VideoContext {
            video_id: video_id.clone(),
            video_path: object_uri(&request.original_video.bucket, &request.original_video.key),
            video_name: video_name_from_key(&request.original_video.key),
            part: request.part,
            categories: request.categories.clone(),
        };

        let consolidation =
            consolidate_segments(&payload.data, &context, self.embedding_dimension);
        info!(
            "Consolidated {} segments into {} clips ({} skipped)",
            payload.data.len(),
            consolidation.clips.len(),
            consolidation.skipped.len()
        );

        // One shared download serves every clip's thumbnail. The scratch
        // directory (and the video in it) is removed when this run returns,
        // on every path.
        let scratch = tempfile::tempdir()?;
        let video_path = scratch.path().join("video.mp4");
        let local_video = match self
            .store
            .download_to_file(
                &request.original_video.bucket,
                &request.original_video.key,
                &video_path,
            )
            .await
        {
            Ok(bytes) => {
                info!("Downloaded source video ({} bytes)", bytes);
                Some(video_path)
            }
            Err(e) => {
                warn!("Cannot download source video, skipping thumbnails for this run: {}", e);
                None
            }
        };

        let total_clips = consolidation.clips.len();
        let mut clips_indexed = 0;
        for (clip_id, mut clip) in consolidation.clips {
            clip.thumbnail_path = match &local_video {
                Some(path) => self.thumbnails.generate(path, clip.timestamp_start).await,
                None => None,
            };

            let document = serde_json::to_value(&clip)?;
            match self.search.put_document(&self.index_name, &clip_id, &document).await {
                Ok(()) => {
                    clips_indexed += 1;
                    info!(
                        "Indexed clip {} ({:.2}s, modalities: {:?})",
                        clip_id,
                        clip.clip_duration,
                        clip.modalities()
                    );
                }
                Err(e) => {
                    warn!("Failed to index clip {}: {}", clip_id, e);
                }
            }
        }

        info!(
            part = request.part,
            "Indexed {}/{} consolidated clips",
            clips_indexed,
            total_clips
        );

        Ok(IndexingReport {
            part: request.part,
            video_id,
            clips_indexed,
        })
    }

    /// Load and parse the embedding payload. Absence or unparseable content
    /// is fatal to the run.
    async fn load_payload(&self, output_location: &str) -> PipelineResult<EmbeddingPayload> {
        let (bucket, prefix) = parse_object_uri(output_location)?;
        let key = if prefix.is_empty() {
            "output.json".to_string()
        } else {
            format!("{}/output.json", prefix.trim_end_matches('/'))
        };

        let bytes = self.store.get_object(&bucket, &key).await.map_err(|e| match e {
            StorageError::NotFound(uri) => PipelineError::PayloadMissing(uri),
            other => PipelineError::Storage(other),
        })?;

        serde_json::from_slice(&bytes).map_err(|e| PipelineError::PayloadInvalid(e.to_string()))
    }
}

/// Display name for a video, derived from the final component of its key.
fn video_name_from_key(key: &str) -> String {
    key.rsplit('/')
        .next()
        .unwrap_or(key)
        .replace(['-', '_'], " ")
}

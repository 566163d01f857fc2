//! Clip index schema and lifecycle.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};

use super::{SearchIndex, SearchResult};

/// HNSW search breadth, fixed at index creation.
const EF_SEARCH: u32 = 512;
/// HNSW construction breadth.
const EF_CONSTRUCTION: u32 = 512;
/// HNSW graph degree.
const HNSW_M: u32 = 32;

/// Build the fixed settings and mappings for the clip index.
///
/// Keyword fields for identifiers and paths, numeric fields for timing, and
/// one `knn_vector` field per modality using an HNSW graph with cosine
/// similarity. The schema is append-only for the lifetime of the index.
pub fn clip_index_mapping(dimension: usize) -> Value {
    json!({
        "settings": {
            "index": {
                "knn": true,
                "knn.algo_param.ef_search": EF_SEARCH,
                "number_of_shards": 1,
                "number_of_replicas": 1,
                "refresh_interval": "5s"
            }
        },
        "mappings": {
            "properties": {
                "video_id": {"type": "keyword"},
                "video_path": {"type": "keyword"},
                "video_name": {"type": "text"},
                "video_duration_sec": {"type": "float"},
                "clip_id": {"type": "keyword"},
                "part": {"type": "integer"},
                "timestamp_start": {"type": "float"},
                "timestamp_end": {"type": "float"},
                "clip_duration": {"type": "float"},
                "clip_text": {"type": "text"},
                "thumbnail_path": {"type": "keyword"},
                "created_at": {"type": "date"},
                "categories": {"type": "keyword"},
                "emb_visual": knn_vector_field(dimension),
                "emb_audio": knn_vector_field(dimension),
                "emb_transcription": knn_vector_field(dimension)
            }
        }
    })
}

fn knn_vector_field(dimension: usize) -> Value {
    json!({
        "type": "knn_vector",
        "dimension": dimension,
        "method": {
            "name": "hnsw",
            "space_type": "cosinesimil",
            "engine": "lucene",
            "parameters": {
                "ef_construction": EF_CONSTRUCTION,
                "m": HNSW_M
            }
        }
    })
}

/// Guarantees the clip index exists with the fixed schema before writes.
pub struct IndexManager {
    backend: Arc<dyn SearchIndex>,
    index_name: String,
    dimension: usize,
}

impl IndexManager {
    pub fn new(backend: Arc<dyn SearchIndex>, index_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            backend,
            index_name: index_name.into(),
            dimension,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Create the clip index if it does not exist.
    ///
    /// Idempotent: a no-op when the index is already present. Existing
    /// indices are never migrated; schema changes require a new index.
    pub async fn ensure_index(&self) -> SearchResult<()> {
        if self.backend.index_exists(&self.index_name).await? {
            debug!("Index {} already exists", self.index_name);
            return Ok(());
        }

        let body = clip_index_mapping(self.dimension);
        self.backend.create_index(&self.index_name, &body).await?;
        info!("Created clip index {}", self.index_name);
        Ok(())
    }
}

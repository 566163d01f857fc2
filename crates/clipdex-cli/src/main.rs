//! Clipdex CLI — headless, single-shot consolidation and indexing runs.
//!
//! One invocation is one pipeline run: the flags mirror the invocation
//! input the upstream workflow passes to this stage, and the run result is
//! printed as JSON on stdout for the orchestrator to consume.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use clipdex_core::{
    IndexingPipeline, IndexingRequest, PipelineConfig, SearchConfig, StorageConfig,
    ThumbnailConfig, VideoLocation,
};

#[derive(Parser, Debug)]
#[command(
    name = "clipdex",
    version,
    about = "Consolidate per-modality video embeddings into a k-NN search index"
)]
struct Cli {
    /// Embedding payload location (`s3://bucket/prefix`; `output.json` is
    /// read beneath it)
    #[arg(long)]
    output_location: String,

    /// Shard index of this run
    #[arg(long, default_value_t = 0)]
    part: i32,

    /// Bucket holding the source video
    #[arg(long)]
    video_bucket: String,

    /// Key of the source video within its bucket
    #[arg(long)]
    video_key: String,

    /// Categories attached to every clip
    #[arg(long, value_delimiter = ',', default_value = "Uncategorized")]
    categories: Vec<String>,

    /// Search backend endpoint
    #[arg(long, env = "CLIPDEX_SEARCH_ENDPOINT", default_value = "http://localhost:9200")]
    search_endpoint: String,

    /// Basic-auth username for the search backend
    #[arg(long, env = "CLIPDEX_SEARCH_USERNAME")]
    search_username: Option<String>,

    /// Basic-auth password for the search backend
    #[arg(long, env = "CLIPDEX_SEARCH_PASSWORD", hide_env_values = true)]
    search_password: Option<String>,

    /// Clip index name
    #[arg(long, default_value = "video_clips")]
    index_name: String,

    /// Object storage gateway endpoint
    #[arg(long, env = "CLIPDEX_STORAGE_ENDPOINT", default_value = "http://localhost:9000")]
    storage_endpoint: String,

    /// Bearer token for the object storage gateway
    #[arg(long, env = "CLIPDEX_STORAGE_TOKEN", hide_env_values = true)]
    storage_token: Option<String>,

    /// Bucket receiving generated thumbnails; omit to disable thumbnails
    #[arg(long, env = "CLIPDEX_THUMBNAIL_BUCKET")]
    thumbnail_bucket: Option<String>,

    /// Explicit ffmpeg binary path (defaults to PATH discovery)
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Embedding vector dimensionality
    #[arg(long, default_value_t = 512)]
    dimension: usize,

    /// Timeout in seconds for storage and search requests
    #[arg(long, default_value_t = 30)]
    http_timeout: u64,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            search: SearchConfig {
                endpoint: self.search_endpoint.clone(),
                index_name: self.index_name.clone(),
                username: self.search_username.clone(),
                password: self.search_password.clone(),
                timeout: Duration::from_secs(self.http_timeout),
            },
            storage: StorageConfig {
                endpoint: self.storage_endpoint.clone(),
                token: self.storage_token.clone(),
                timeout: Duration::from_secs(self.http_timeout),
            },
            thumbnails: ThumbnailConfig {
                bucket: self.thumbnail_bucket.clone(),
                ffmpeg_path: self.ffmpeg.clone(),
                ..Default::default()
            },
            embedding_dimension: self.dimension,
        }
    }

    fn request(&self) -> IndexingRequest {
        IndexingRequest {
            output_location: self.output_location.clone(),
            part: self.part,
            original_video: VideoLocation {
                bucket: self.video_bucket.clone(),
                key: self.video_key.clone(),
            },
            categories: self.categories.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting indexing run for part {}", cli.part);

    let pipeline = IndexingPipeline::from_config(&cli.pipeline_config())
        .context("failed to build indexing pipeline")?;

    let report = pipeline
        .run(&cli.request())
        .await
        .context("indexing run failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

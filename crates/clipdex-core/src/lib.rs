//! Clipdex Core Engine
//!
//! Consolidates per-modality embedding segments produced for an uploaded
//! video into unified, multi-modal clip documents in a k-NN search index,
//! with ffmpeg-extracted thumbnails stored in object storage.
//!
//! One invocation is one pipeline run: load the embedding payload, group
//! segments into clips, download the source video once, attach thumbnails,
//! and upsert one document per clip.

pub mod clip;
pub mod config;
pub mod consolidate;
pub mod ffmpeg;
pub mod pipeline;
pub mod search;
pub mod segment;
pub mod storage;
pub mod thumbnail;

// Re-export common types
mod error;
pub use error::*;

pub use clip::{clip_identity, Clip, ClipId, VideoContext};
pub use config::{PipelineConfig, SearchConfig, StorageConfig, ThumbnailConfig};
pub use pipeline::{IndexingPipeline, IndexingReport, IndexingRequest, VideoLocation};

//! Clipdex Error Definitions
//!
//! Run-level error types. Only failures that abort a whole pipeline run
//! surface here; per-segment and per-clip failures are reported through
//! explicit outcome types and logged where they occur.

use thiserror::Error;

/// Errors that end a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Embedding payload not found: {0}")]
    PayloadMissing(String),

    #[error("Embedding payload unreadable: {0}")]
    PayloadInvalid(String),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("Search backend error: {0}")]
    Search(#[from] crate::search::SearchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pipeline result type.
pub type PipelineResult<T> = Result<T, PipelineError>;

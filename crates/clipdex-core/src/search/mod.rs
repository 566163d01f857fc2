//! Search Index Integration
//!
//! Talks to an OpenSearch-compatible backend holding the clip index: three
//! k-NN vector fields (one per modality) alongside exact-match metadata
//! fields. [`SearchIndex`] is the seam the pipeline writes through;
//! [`IndexManager`] guarantees the index and its schema exist before any
//! write.

mod client;
mod schema;

pub use client::{OpenSearchClient, SearchIndex};
pub use schema::{clip_index_mapping, IndexManager};

use thiserror::Error;

/// Errors from the search backend.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Failed to reach the backend at all.
    #[error("Failed to connect to search backend: {0}")]
    ConnectionFailed(String),

    /// Failed to create the clip index.
    #[error("Failed to create index: {0}")]
    IndexCreationFailed(String),

    /// Failed to write a single document.
    #[error("Failed to write document: {0}")]
    DocumentWriteFailed(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

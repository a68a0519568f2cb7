//! Search error types.

use thiserror::Error;

/// Search engine error type.
///
/// Expected data-shape irregularities (unloaded chunks, unresolvable
/// states, empty queues) are absorbed inside the engine and never surface
/// here; consumers only ever see "no results yet" for those. This type
/// covers environment failures at construction time.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The shared background worker pool could not be built.
    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

//! Shared background worker pool.

use crate::error::SearchResult;

/// Process-wide pool that runs chunk scans.
///
/// Deliberately tiny: the pool size is fixed and independent of the number
/// of live searchers, so search work can lag arbitrarily without starving
/// the rest of the application. Scans are fire-and-forget; completion is
/// observed through each searcher's result channel.
pub struct SearchWorkers {
    pool: rayon::ThreadPool,
}

impl SearchWorkers {
    /// Default pool size.
    pub const DEFAULT_WORKERS: usize = 2;

    pub fn new(workers: usize) -> SearchResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("scry-search-{i}"))
            .build()?;
        Ok(Self { pool })
    }

    pub fn with_default_size() -> SearchResult<Self> {
        Self::new(Self::DEFAULT_WORKERS)
    }

    /// Schedule a scan body; returns immediately.
    pub fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        self.pool.spawn(job);
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }
}

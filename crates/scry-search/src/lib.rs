//! Incremental asynchronous chunk search.
//!
//! Scans a moving window of chunks for blocks matching a predicate, keeps
//! per-chunk results live against a stream of block mutations, and exposes
//! a versioned result set that consumers can poll without ever blocking.
//!
//! # Tick Model
//!
//! The coordinator is driven from a single thread, once per time step:
//!
//! ```text
//! Tick N:
//! ┌────────────────────────────────────────────────────────────┐
//! │  Phase 1: Drain mutation feed (block changes, invalidates) │
//! │  Phase 2: Remove stale searchers (cancel + removal hook)   │
//! │  Phase 3: Start searchers for newly covered chunks         │
//! │  Phase 4: Route block changes to owning searchers          │
//! │  Phase 5: Observe readiness, materialize finished scans    │
//! │  Phase 6: Bump result version once if anything changed     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scan bodies run on a small shared worker pool; each searcher hands its
//! hit list back over a bounded channel and the driver materializes it
//! lazily. Mutations arriving before materialization are buffered and
//! replayed in order, so no update is ever lost to the race between "scan
//! finishes" and "mutation arrives".

pub mod coordinator;
pub mod error;
pub mod feed;
pub mod predicate;
pub mod searcher;
pub mod workers;

pub use coordinator::SearchCoordinator;
pub use error::{SearchError, SearchResult};
pub use feed::{ChangeFeed, MutationEvent};
pub use predicate::{BlockPredicate, StateSetPredicate};
pub use searcher::{ChunkSearcher, SearchHit, SearchState};
pub use workers::SearchWorkers;

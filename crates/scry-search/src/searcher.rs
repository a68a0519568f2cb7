//! Per-chunk asynchronous search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use smallvec::SmallVec;

use scry_spatial::{BlockPos, BlockState, ChunkPos, ChunkSnapshot, DimensionId, WorldView};

use crate::predicate::BlockPredicate;
use crate::workers::SearchWorkers;

/// One matching position and the state that matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchHit {
    pub pos: BlockPos,
    pub state: BlockState,
}

/// Lifecycle of a [`ChunkSearcher`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    NotStarted,
    Running,
    Done,
    Cancelled,
}

/// Driver-side state behind the per-searcher lock.
///
/// The worker thread never touches this directly; it hands its hit list
/// over the result channel and the driver pulls it in under the lock.
struct Inner {
    /// Materialized exactly once; afterwards only patched in place.
    results: Option<Vec<SearchHit>>,
    /// Mutations that arrived before materialization, in submission order.
    pending: SmallVec<[(BlockPos, BlockState); 4]>,
    /// Hand-off from the worker; dropped once materialized.
    scan_rx: Option<Receiver<Vec<SearchHit>>>,
}

/// Scans one chunk once, then keeps its result list consistent with a
/// trickle of mutation events. Never blocks the caller.
///
/// The scan body runs on the shared worker pool against an immutable
/// snapshot, so it never races the live world. Results are materialized
/// lazily on the first readiness probe after completion; mutations that
/// raced the scan are replayed, in order, at that moment.
pub struct ChunkSearcher {
    pos: ChunkPos,
    dimension: DimensionId,
    predicate: Arc<dyn BlockPredicate>,
    cancelled: Arc<AtomicBool>,
    started: bool,
    inner: Mutex<Inner>,
}

impl ChunkSearcher {
    #[must_use]
    pub fn new(pos: ChunkPos, dimension: DimensionId, predicate: Arc<dyn BlockPredicate>) -> Self {
        Self {
            pos,
            dimension,
            predicate,
            cancelled: Arc::new(AtomicBool::new(false)),
            started: false,
            inner: Mutex::new(Inner {
                results: None,
                pending: SmallVec::new(),
                scan_rx: None,
            }),
        }
    }

    #[must_use]
    pub const fn pos(&self) -> ChunkPos {
        self.pos
    }

    #[must_use]
    pub const fn dimension(&self) -> DimensionId {
        self.dimension
    }

    /// Capture a snapshot and schedule the scan; returns without blocking.
    ///
    /// An unloaded chunk is not an error: the searcher completes
    /// immediately with zero results and no scan is scheduled.
    ///
    /// # Panics
    ///
    /// Panics if called twice or after [`cancel`](Self::cancel); both
    /// indicate the coordinator violated the one-searcher-per-chunk
    /// invariant.
    pub fn start(&mut self, view: &dyn WorldView, workers: &SearchWorkers) {
        assert!(!self.started, "searcher for {:?} started twice", self.pos);
        assert!(
            !self.cancelled.load(Ordering::Relaxed),
            "searcher for {:?} started after cancellation",
            self.pos
        );
        self.started = true;

        let Some(snapshot) = view.snapshot(self.pos) else {
            self.inner.get_mut().results = Some(Vec::new());
            return;
        };

        let (tx, rx) = crossbeam_channel::bounded(1);
        self.inner.get_mut().scan_rx = Some(rx);

        let predicate = Arc::clone(&self.predicate);
        let cancelled = Arc::clone(&self.cancelled);
        workers.spawn(move || {
            let hits = scan_snapshot(&snapshot, &*predicate, &cancelled);
            // The receiver is dropped when the searcher is discarded; a
            // stale in-flight completion then goes nowhere.
            let _ = tx.send(hits);
        });
    }

    /// Request cooperative cancellation. Idempotent; never blocks.
    ///
    /// The scan observes the flag between positions and returns early.
    /// Results already materialized before cancellation stay readable;
    /// results completing afterwards are never pulled in.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        if self.is_cancelled() {
            return SearchState::Cancelled;
        }
        if !self.started {
            return SearchState::NotStarted;
        }
        if self.inner.lock().results.is_some() {
            SearchState::Done
        } else {
            SearchState::Running
        }
    }

    /// Cheap probe: has the scan produced a result list, materialized or
    /// still sitting in the hand-off channel?
    #[must_use]
    pub fn is_done(&self) -> bool {
        let inner = self.inner.lock();
        inner.results.is_some() || inner.scan_rx.as_ref().is_some_and(|rx| !rx.is_empty())
    }

    /// Whether results are materialized, pulling a finished scan into the
    /// materialized slot on first observation.
    ///
    /// Materialization happens exactly once, under the lock; buffered
    /// mutations are replayed in submission order at that point. After
    /// cancellation no new results are pulled in.
    pub fn has_results_ready(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.results.is_some() {
            return true;
        }
        if self.is_cancelled() {
            return false;
        }
        let Some(rx) = &inner.scan_rx else {
            return false;
        };
        let Ok(hits) = rx.try_recv() else {
            return false;
        };
        Self::materialize(&mut inner, hits, &*self.predicate);
        true
    }

    /// Block until the scan completes, then materialize. Test/forced-join
    /// path only; the driver's per-tick path never calls this.
    pub fn block_until_ready(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.results.is_some() {
            return true;
        }
        if self.is_cancelled() {
            return false;
        }
        let Some(rx) = &inner.scan_rx else {
            return false;
        };
        let Ok(hits) = rx.recv() else {
            return false;
        };
        Self::materialize(&mut inner, hits, &*self.predicate);
        true
    }

    fn materialize(inner: &mut Inner, hits: Vec<SearchHit>, predicate: &dyn BlockPredicate) {
        debug_assert!(inner.results.is_none(), "results materialized twice");
        let mut results = hits;
        for (pos, state) in inner.pending.drain(..) {
            apply_one(&mut results, predicate, pos, state);
        }
        inner.results = Some(results);
        inner.scan_rx = None;
    }

    /// Apply a batch of single-position mutations.
    ///
    /// Before materialization the events are buffered and replayed when
    /// results land, so no mutation is lost to the completion race. After
    /// materialization each event re-evaluates the predicate against the
    /// new state and appends, replaces, or removes the hit in place.
    ///
    /// Returns whether the visible result set actually changed.
    pub fn apply_mutations(
        &self,
        events: impl IntoIterator<Item = (BlockPos, BlockState)>,
    ) -> bool {
        let mut inner = self.inner.lock();
        match &mut inner.results {
            None => {
                inner.pending.extend(events);
                false
            }
            Some(results) => {
                let mut changed = false;
                for (pos, state) in events {
                    changed |= apply_one(results, &*self.predicate, pos, state);
                }
                changed
            }
        }
    }

    /// Point-in-time copy of the materialized results.
    ///
    /// Empty while results are not yet materialized; never blocks.
    #[must_use]
    pub fn ready_matches(&self) -> Vec<SearchHit> {
        self.inner.lock().results.clone().unwrap_or_default()
    }

    /// Whether the materialized result list is non-empty.
    #[must_use]
    pub fn has_matches(&self) -> bool {
        self.inner
            .lock()
            .results
            .as_ref()
            .is_some_and(|r| !r.is_empty())
    }
}

/// Patch one mutation into a materialized result list.
fn apply_one(
    results: &mut Vec<SearchHit>,
    predicate: &dyn BlockPredicate,
    pos: BlockPos,
    state: BlockState,
) -> bool {
    let matches = predicate.matches(pos, state);
    let existing = results.iter().position(|hit| hit.pos == pos);
    match (existing, matches) {
        (Some(i), true) => {
            if results[i].state == state {
                false
            } else {
                results[i].state = state;
                true
            }
        }
        (Some(i), false) => {
            results.remove(i);
            true
        }
        (None, true) => {
            results.push(SearchHit { pos, state });
            true
        }
        (None, false) => false,
    }
}

/// Sweep every position in the snapshot through the predicate.
///
/// Checks the cancellation flag between positions and returns the partial
/// list immediately when it trips. An unresolvable state is skipped and
/// warned about once per chunk; the predicate never sees it.
fn scan_snapshot(
    snapshot: &ChunkSnapshot,
    predicate: &dyn BlockPredicate,
    cancelled: &AtomicBool,
) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    let mut warned = false;
    for pos in snapshot.positions() {
        if cancelled.load(Ordering::Relaxed) {
            return hits;
        }
        let Some(state) = snapshot.state_at(pos) else {
            if !warned {
                tracing::warn!(chunk = ?snapshot.pos(), ?pos, "unresolvable state in snapshot, skipping");
                warned = true;
            }
            continue;
        };
        if predicate.matches(pos, state) {
            hits.push(SearchHit { pos, state });
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use scry_spatial::RadiusCoverage;

    use super::*;
    use crate::predicate::StateSetPredicate;

    const DIM: DimensionId = DimensionId(0);
    const ORE: BlockState = BlockState(42);

    /// Fixed single-chunk world backed by a prebuilt snapshot.
    struct OneChunkView {
        snapshot_blocks: Vec<(BlockPos, BlockState)>,
        loaded: bool,
    }

    impl WorldView for OneChunkView {
        fn dimension(&self) -> DimensionId {
            DIM
        }

        fn covered_chunks(&self) -> Vec<ChunkPos> {
            RadiusCoverage::new(ChunkPos::new(0, 0), 0).chunks()
        }

        fn snapshot(&self, pos: ChunkPos) -> Option<ChunkSnapshot> {
            if !self.loaded {
                return None;
            }
            let mut snapshot = ChunkSnapshot::new(pos, 0, 1);
            for &(block, state) in &self.snapshot_blocks {
                snapshot.set_state(block, state);
            }
            Some(snapshot)
        }
    }

    fn ore_predicate() -> Arc<dyn BlockPredicate> {
        Arc::new(StateSetPredicate::new([ORE]))
    }

    fn view_with(blocks: &[(i32, i32, i32)]) -> OneChunkView {
        OneChunkView {
            snapshot_blocks: blocks
                .iter()
                .map(|&(x, y, z)| (BlockPos::new(x, y, z), ORE))
                .collect(),
            loaded: true,
        }
    }

    #[test]
    fn test_scan_finds_exactly_the_matching_positions() {
        let view = view_with(&[(1, 2, 3), (0, 0, 0), (15, 15, 15)]);
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());

        assert_eq!(searcher.state(), SearchState::NotStarted);
        searcher.start(&view, &workers);
        assert!(searcher.block_until_ready());
        assert!(searcher.is_done());

        let mut positions: Vec<_> = searcher.ready_matches().iter().map(|h| h.pos).collect();
        positions.sort_by_key(|p| (p.y, p.z, p.x));
        assert_eq!(
            positions,
            vec![
                BlockPos::new(0, 0, 0),
                BlockPos::new(1, 2, 3),
                BlockPos::new(15, 15, 15),
            ]
        );
        assert_eq!(searcher.state(), SearchState::Done);
    }

    #[test]
    fn test_scan_skips_unresolvable_positions() {
        let view = OneChunkView {
            snapshot_blocks: vec![
                (BlockPos::new(1, 1, 1), ORE),
                (BlockPos::new(2, 2, 2), BlockState::UNRESOLVED),
                (BlockPos::new(3, 3, 3), ORE),
            ],
            loaded: true,
        };
        let workers = SearchWorkers::new(1).unwrap();
        // Matches anything resolvable, so an unresolvable state leaking
        // into the predicate would surface as a third hit.
        let predicate: Arc<dyn BlockPredicate> =
            Arc::new(|_: BlockPos, state: BlockState| !state.is_air());
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, predicate);

        searcher.start(&view, &workers);
        assert!(searcher.block_until_ready());

        let mut positions: Vec<_> = searcher.ready_matches().iter().map(|h| h.pos).collect();
        positions.sort_by_key(|p| (p.y, p.z, p.x));
        assert_eq!(
            positions,
            vec![BlockPos::new(1, 1, 1), BlockPos::new(3, 3, 3)]
        );
    }

    #[test]
    fn test_unloaded_chunk_completes_empty_immediately() {
        let view = OneChunkView {
            snapshot_blocks: Vec::new(),
            loaded: false,
        };
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());

        searcher.start(&view, &workers);

        assert!(searcher.has_results_ready());
        assert!(searcher.ready_matches().is_empty());
    }

    #[test]
    #[should_panic(expected = "started twice")]
    fn test_double_start_panics() {
        let view = view_with(&[]);
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());

        searcher.start(&view, &workers);
        searcher.start(&view, &workers);
    }

    #[test]
    #[should_panic(expected = "after cancellation")]
    fn test_start_after_cancel_panics() {
        let view = view_with(&[]);
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());

        searcher.cancel();
        searcher.start(&view, &workers);
    }

    #[test]
    fn test_mutations_buffered_before_materialization_are_replayed() {
        // Three matches at scan start; before the driver observes
        // completion, one match turns off and a new one appears.
        let view = view_with(&[(1, 1, 1), (2, 2, 2), (3, 3, 3)]);
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());

        searcher.start(&view, &workers);
        let changed = searcher.apply_mutations([
            (BlockPos::new(2, 2, 2), BlockState::AIR),
            (BlockPos::new(4, 4, 4), ORE),
        ]);
        // Not visible yet: results have not materialized.
        assert!(!changed);

        assert!(searcher.block_until_ready());
        let mut positions: Vec<_> = searcher.ready_matches().iter().map(|h| h.pos).collect();
        positions.sort_by_key(|p| (p.y, p.z, p.x));
        assert_eq!(
            positions,
            vec![
                BlockPos::new(1, 1, 1),
                BlockPos::new(3, 3, 3),
                BlockPos::new(4, 4, 4),
            ]
        );
    }

    #[test]
    fn test_live_mutations_append_replace_remove() {
        let view = view_with(&[(5, 5, 5)]);
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());
        let predicate_any = Arc::new(|_: BlockPos, state: BlockState| !state.is_air());
        let mut any_searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, predicate_any);

        searcher.start(&view, &workers);
        any_searcher.start(&view, &workers);
        assert!(searcher.block_until_ready());
        assert!(any_searcher.block_until_ready());

        // Remove.
        assert!(searcher.apply_mutations([(BlockPos::new(5, 5, 5), BlockState::AIR)]));
        assert!(searcher.ready_matches().is_empty());

        // Append.
        assert!(searcher.apply_mutations([(BlockPos::new(6, 6, 6), ORE)]));
        assert_eq!(searcher.ready_matches().len(), 1);

        // Replace in place: still matching, different state.
        assert!(any_searcher.apply_mutations([(BlockPos::new(5, 5, 5), BlockState(7))]));
        assert_eq!(
            any_searcher.ready_matches(),
            vec![SearchHit {
                pos: BlockPos::new(5, 5, 5),
                state: BlockState(7),
            }]
        );

        // No-op: same state again.
        assert!(!any_searcher.apply_mutations([(BlockPos::new(5, 5, 5), BlockState(7))]));
        // No-op: non-matching state at absent position.
        assert!(!searcher.apply_mutations([(BlockPos::new(9, 9, 9), BlockState::AIR)]));
    }

    #[test]
    fn test_idempotent_mutation_replay() {
        let view = view_with(&[(1, 1, 1)]);
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());

        searcher.start(&view, &workers);
        assert!(searcher.block_until_ready());

        let events = [
            (BlockPos::new(1, 1, 1), BlockState::AIR),
            (BlockPos::new(2, 2, 2), ORE),
        ];
        searcher.apply_mutations(events);
        let after_once = searcher.ready_matches();

        // Same final state per position: replay changes nothing.
        assert!(!searcher.apply_mutations(events));
        assert_eq!(searcher.ready_matches(), after_once);
    }

    #[test]
    fn test_cancel_before_pull_suppresses_results() {
        let view = view_with(&[(1, 1, 1)]);
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());

        searcher.start(&view, &workers);
        searcher.cancel();
        searcher.cancel(); // idempotent

        // Reads starting after cancellation never materialize new results.
        assert!(!searcher.has_results_ready());
        assert!(searcher.ready_matches().is_empty());
        assert_eq!(searcher.state(), SearchState::Cancelled);
    }

    #[test]
    fn test_cancel_after_materialization_keeps_results() {
        let view = view_with(&[(1, 1, 1)]);
        let workers = SearchWorkers::new(1).unwrap();
        let mut searcher = ChunkSearcher::new(ChunkPos::new(0, 0), DIM, ore_predicate());

        searcher.start(&view, &workers);
        assert!(searcher.block_until_ready());
        searcher.cancel();

        // No implicit discard on cancel.
        assert!(searcher.has_results_ready());
        assert_eq!(searcher.ready_matches().len(), 1);
    }
}

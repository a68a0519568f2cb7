//! Tick-driven coordination of live chunk searchers.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use rustc_hash::{FxHashMap, FxHashSet};

use scry_spatial::{BlockPos, BlockState, ChunkPos, DimensionId, WorldView};

use crate::feed::{ChangeFeed, MutationEvent, mutation_feed};
use crate::predicate::BlockPredicate;
use crate::searcher::{ChunkSearcher, SearchHit};
use crate::workers::SearchWorkers;

/// Hook invoked when a chunk leaves tracking, for releasing auxiliary
/// per-chunk resources (mesh buffers, highlights).
type RemovalHook = Box<dyn FnMut(ChunkPos)>;

/// Feed events regrouped for one tick's processing.
struct DrainedFeed {
    /// Per-chunk block changes, in enqueue order within each chunk.
    changes: FxHashMap<ChunkPos, Vec<(BlockPos, BlockState)>>,
    /// Chunks whose whole contents were invalidated since the last tick.
    invalidated: FxHashSet<ChunkPos>,
}

/// Keeps the live searcher set aligned with a target coverage area and a
/// mutation feed, and publishes a monotonically increasing result version.
///
/// Driven from a single thread via [`tick`](Self::tick); not internally
/// safe against concurrent ticks. Consumers on any thread may hold a
/// [`ChangeFeed`] handle; result reads go through the driver.
pub struct SearchCoordinator {
    predicate: Arc<dyn BlockPredicate>,
    workers: Arc<SearchWorkers>,
    searchers: FxHashMap<ChunkPos, ChunkSearcher>,
    /// Chunks whose results the driver has observed as materialized.
    ready: FxHashSet<ChunkPos>,
    version: u64,
    feed: ChangeFeed,
    feed_rx: Receiver<MutationEvent>,
    removal_hook: Option<RemovalHook>,
}

impl SearchCoordinator {
    #[must_use]
    pub fn new(predicate: Arc<dyn BlockPredicate>, workers: Arc<SearchWorkers>) -> Self {
        let (feed, feed_rx) = mutation_feed();
        Self {
            predicate,
            workers,
            searchers: FxHashMap::default(),
            ready: FxHashSet::default(),
            version: 0,
            feed,
            feed_rx,
            removal_hook: None,
        }
    }

    /// Producer handle for the mutation feed; cheap to clone, safe to call
    /// from any thread.
    #[must_use]
    pub fn feed(&self) -> ChangeFeed {
        self.feed.clone()
    }

    /// Install the chunk-removal hook.
    pub fn set_removal_hook(&mut self, hook: impl FnMut(ChunkPos) + 'static) {
        self.removal_hook = Some(Box::new(hook));
    }

    /// Run one reconciliation step. Must be called from a single driver
    /// thread, once per time step.
    ///
    /// Drains the mutation feed, removes searchers whose chunk left the
    /// coverage area, changed dimension, or was invalidated, starts
    /// searchers for newly covered chunks, routes block changes, observes
    /// readiness, and bumps the result version at most once.
    ///
    /// Returns whether any searcher was added or removed.
    pub fn tick(&mut self, view: &dyn WorldView) -> bool {
        let drained = self.drain_feed();
        let dimension = view.dimension();
        let covered: FxHashSet<ChunkPos> = view.covered_chunks().into_iter().collect();

        let removed = self.remove_stale(dimension, &covered, &drained.invalidated);
        let mut content_changed = removed.content_changed;

        let added = self.start_missing(view, dimension, &covered);
        content_changed |= self.route_changes(drained.changes);
        content_changed |= self.observe_readiness();

        // Batched: one bump per tick no matter how many chunks moved.
        if content_changed {
            self.version += 1;
        }
        added || removed.any
    }

    /// Cancel and discard every live searcher and all pending state.
    pub fn reset(&mut self) {
        for (pos, searcher) in self.searchers.drain() {
            searcher.cancel();
            if let Some(hook) = &mut self.removal_hook {
                hook(pos);
            }
        }
        self.ready.clear();
        while self.feed_rx.try_recv().is_ok() {}
        self.version += 1;
    }

    /// Swap the active predicate.
    ///
    /// In-flight results cannot be reused against a different predicate,
    /// so this resets everything and rescans from scratch.
    pub fn set_predicate(&mut self, predicate: Arc<dyn BlockPredicate>) {
        self.predicate = predicate;
        self.reset();
    }

    /// Lazily aggregate the materialized results of every ready chunk.
    ///
    /// O(ready chunks) to produce and not cached; safe to call every
    /// frame, typically gated on [`version`](Self::version).
    pub fn ready_matches(&self) -> impl Iterator<Item = SearchHit> + '_ {
        self.searchers
            .iter()
            .filter(|(pos, _)| self.ready.contains(*pos))
            .flat_map(|(_, searcher)| searcher.ready_matches())
    }

    /// Whether any ready chunk currently has at least one match.
    #[must_use]
    pub fn has_ready_matches(&self) -> bool {
        self.searchers
            .iter()
            .any(|(pos, s)| self.ready.contains(pos) && s.has_matches())
    }

    /// Monotonic result version. Consumers compare against their last-seen
    /// value to skip redundant aggregation.
    ///
    /// Bumped by the driver at end of tick; "read version, then read
    /// results" is not atomic across threads unless externally
    /// synchronized.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn searcher_count(&self) -> usize {
        self.searchers.len()
    }

    #[must_use]
    pub fn ready_chunk_count(&self) -> usize {
        self.ready.len()
    }

    fn drain_feed(&mut self) -> DrainedFeed {
        let mut changes: FxHashMap<ChunkPos, Vec<(BlockPos, BlockState)>> = FxHashMap::default();
        let mut invalidated = FxHashSet::default();
        for event in self.feed_rx.try_iter() {
            match event {
                MutationEvent::BlockChanged { pos, state } => {
                    changes.entry(pos.chunk()).or_default().push((pos, state));
                }
                MutationEvent::ChunkInvalidated(pos) => {
                    invalidated.insert(pos);
                }
            }
        }
        DrainedFeed {
            changes,
            invalidated,
        }
    }

    fn remove_stale(
        &mut self,
        dimension: DimensionId,
        covered: &FxHashSet<ChunkPos>,
        invalidated: &FxHashSet<ChunkPos>,
    ) -> RemovalOutcome {
        let stale: Vec<ChunkPos> = self
            .searchers
            .iter()
            .filter(|(pos, searcher)| {
                searcher.dimension() != dimension
                    || !covered.contains(*pos)
                    || invalidated.contains(*pos)
            })
            .map(|(pos, _)| *pos)
            .collect();

        let mut outcome = RemovalOutcome {
            any: false,
            content_changed: false,
        };
        for pos in stale {
            if let Some(searcher) = self.searchers.remove(&pos) {
                searcher.cancel();
                if let Some(hook) = &mut self.removal_hook {
                    hook(pos);
                }
                // Only a removal the consumer could see warrants a bump.
                outcome.content_changed |= self.ready.remove(&pos);
                outcome.any = true;
            }
        }
        outcome
    }

    fn start_missing(
        &mut self,
        view: &dyn WorldView,
        dimension: DimensionId,
        covered: &FxHashSet<ChunkPos>,
    ) -> bool {
        let mut added = false;
        for &pos in covered {
            if self.searchers.contains_key(&pos) {
                continue;
            }
            let mut searcher = ChunkSearcher::new(pos, dimension, Arc::clone(&self.predicate));
            searcher.start(view, &self.workers);
            self.searchers.insert(pos, searcher);
            added = true;
        }
        added
    }

    fn route_changes(&mut self, changes: FxHashMap<ChunkPos, Vec<(BlockPos, BlockState)>>) -> bool {
        let mut content_changed = false;
        for (chunk, events) in changes {
            match self.searchers.get(&chunk) {
                Some(searcher) => {
                    content_changed |= searcher.apply_mutations(events);
                }
                None => {
                    // A later full scan picks up the true state once the
                    // chunk is covered again.
                    tracing::trace!(?chunk, count = events.len(), "dropping changes for untracked chunk");
                }
            }
        }
        content_changed
    }

    fn observe_readiness(&mut self) -> bool {
        let newly_ready: Vec<ChunkPos> = self
            .searchers
            .iter()
            .filter(|(pos, searcher)| !self.ready.contains(*pos) && searcher.has_results_ready())
            .map(|(pos, _)| *pos)
            .collect();

        let changed = !newly_ready.is_empty();
        if changed {
            tracing::debug!(count = newly_ready.len(), "chunks became ready");
        }
        self.ready.extend(newly_ready);
        changed
    }
}

struct RemovalOutcome {
    any: bool,
    content_changed: bool,
}

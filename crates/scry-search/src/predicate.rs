//! Block predicates.

use rustc_hash::FxHashSet;
use scry_spatial::{BlockPos, BlockState};

/// A pure query over a position and its block state.
///
/// Must be side-effect-free and safe to call concurrently from worker
/// threads; the engine evaluates it both during the background scan and
/// when patching results from mutation events.
pub trait BlockPredicate: Send + Sync {
    fn matches(&self, pos: BlockPos, state: BlockState) -> bool;
}

impl<F> BlockPredicate for F
where
    F: Fn(BlockPos, BlockState) -> bool + Send + Sync,
{
    fn matches(&self, pos: BlockPos, state: BlockState) -> bool {
        self(pos, state)
    }
}

/// Matches any of a fixed set of block states, anywhere.
///
/// The usual "which blocks am I looking for" selection.
pub struct StateSetPredicate {
    states: FxHashSet<BlockState>,
}

impl StateSetPredicate {
    #[must_use]
    pub fn new(states: impl IntoIterator<Item = BlockState>) -> Self {
        Self {
            states: states.into_iter().collect(),
        }
    }
}

impl BlockPredicate for StateSetPredicate {
    fn matches(&self, _pos: BlockPos, state: BlockState) -> bool {
        self.states.contains(&state)
    }
}

//! The external change-notification feed.
//!
//! Raw mutation signals arrive at arbitrary times from arbitrary threads
//! (typically a network event handler). They are buffered in an unbounded
//! channel owned by the coordinator and drained exactly once per tick.

use crossbeam_channel::{Receiver, Sender, unbounded};
use scry_spatial::{BlockPos, BlockState, ChunkPos};

/// A single pending mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationEvent {
    /// One position changed to a new state.
    BlockChanged { pos: BlockPos, state: BlockState },
    /// A whole chunk's contents changed arbitrarily; any live search of it
    /// is stale and must be redone from a fresh snapshot.
    ChunkInvalidated(ChunkPos),
}

/// Thread-safe producer handle for the mutation feed.
///
/// Cheap to clone; safe to call from any thread.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: Sender<MutationEvent>,
}

impl ChangeFeed {
    pub fn block_changed(&self, pos: BlockPos, state: BlockState) {
        self.send(MutationEvent::BlockChanged { pos, state });
    }

    pub fn chunk_invalidated(&self, pos: ChunkPos) {
        self.send(MutationEvent::ChunkInvalidated(pos));
    }

    pub fn send(&self, event: MutationEvent) {
        // The receiver lives as long as the coordinator; a send after the
        // coordinator is dropped is a no-op.
        let _ = self.tx.send(event);
    }
}

/// Create a feed handle and its coordinator-side receiver.
pub(crate) fn mutation_feed() -> (ChangeFeed, Receiver<MutationEvent>) {
    let (tx, rx) = unbounded();
    (ChangeFeed { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_preserves_order_across_threads() {
        let (feed, rx) = mutation_feed();

        let handle = std::thread::spawn(move || {
            for i in 0..100 {
                feed.block_changed(BlockPos::new(i, 0, 0), BlockState(1));
            }
        });
        handle.join().unwrap();

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 100);
        for (i, event) in events.iter().enumerate() {
            let MutationEvent::BlockChanged { pos, .. } = event else {
                panic!("unexpected event {event:?}");
            };
            assert_eq!(pos.x, i as i32);
        }
    }
}

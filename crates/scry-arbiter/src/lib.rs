//! Priority-expiry value arbitration.
//!
//! Many requesters compete to set one shared value; each request carries a
//! priority and a tick-based time-to-live, and a requester has at most one
//! outstanding request at a time. [`Arbiter::active_value`] returns the
//! value of the highest-priority surviving request.
//!
//! Bookkeeping is deliberately lazy: [`tick`](Arbiter::tick) only advances
//! the clock, and expired or superseded entries are discarded when they
//! surface at the head of the heap, each at most once.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

use hashbrown::HashMap;

struct Entry<K, V> {
    priority: i32,
    /// Insertion sequence; doubles as the liveness token for replacement
    /// and as the deterministic tie-break (earlier request wins).
    seq: u64,
    expires_at: u64,
    requester: K,
    value: V,
}

impl<K, V> PartialEq for Entry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<K, V> Eq for Entry<K, V> {}

impl<K, V> PartialOrd for Entry<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K, V> Ord for Entry<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: highest priority first, then earliest insertion.
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority-expiry arbitration table.
///
/// `K` identifies a requester; `V` is the contested value.
pub struct Arbiter<K, V> {
    now: u64,
    next_seq: u64,
    /// Requester -> sequence number of its one outstanding request.
    live: HashMap<K, u64>,
    heap: BinaryHeap<Entry<K, V>>,
}

impl<K: Eq + Hash + Clone, V> Arbiter<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            live: HashMap::new(),
            heap: BinaryHeap::new(),
        }
    }

    /// Current tick count.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// File a request, replacing any outstanding request from the same
    /// requester. Expires `ttl_ticks` from now.
    ///
    /// The superseded entry is not searched for; it dies lazily when it
    /// reaches the head of the heap with a stale sequence number.
    pub fn request(&mut self, requester: K, priority: i32, value: V, ttl_ticks: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(requester.clone(), seq);
        self.heap.push(Entry {
            priority,
            seq,
            expires_at: self.now.saturating_add(ttl_ticks),
            requester,
            value,
        });
    }

    /// Withdraw a requester's outstanding request, if any.
    pub fn retract(&mut self, requester: &K) {
        self.live.remove(requester);
    }

    /// Advance the clock by one tick. Does not evict anything.
    pub fn tick(&mut self) {
        self.now += 1;
    }

    /// The value of the highest-priority surviving request, or `None`.
    ///
    /// Discards expired and superseded entries from the head on the way;
    /// each dead entry is removed at most once, on the first read that
    /// observes it.
    pub fn active_value(&mut self) -> Option<&V> {
        loop {
            let (stale, expired) = match self.heap.peek() {
                None => return None,
                Some(head) => (
                    self.live.get(&head.requester) != Some(&head.seq),
                    self.now >= head.expires_at,
                ),
            };
            if !stale && !expired {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                // An expired entry also retires its requester's slot.
                if expired && self.live.get(&entry.requester) == Some(&entry.seq) {
                    self.live.remove(&entry.requester);
                }
            }
        }
        self.heap.peek().map(|entry| &entry.value)
    }

    /// Whether a requester has an outstanding (possibly expired) request.
    #[must_use]
    pub fn is_requesting(&self, requester: &K) -> bool {
        self.live.contains_key(requester)
    }

    /// Drop everything; the clock keeps its value.
    pub fn clear(&mut self) {
        self.live.clear();
        self.heap.clear();
    }
}

impl<K: Eq + Hash + Clone, V> Default for Arbiter<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

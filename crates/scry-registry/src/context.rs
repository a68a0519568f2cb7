//! The explicit application context.

use scry_arbiter::Arbiter;
use scry_search::ChangeFeed;

/// Everything a feature may need at runtime, constructed once by the host
/// and passed by reference, never reached through a global.
pub struct AppContext {
    /// Producer handle for the search engine's mutation feed.
    pub feed: ChangeFeed,
    /// Arbitration table for the shared movement-speed multiplier.
    /// Requesters are feature names.
    pub speed: Arbiter<&'static str, f64>,
}

impl AppContext {
    #[must_use]
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            feed,
            speed: Arbiter::new(),
        }
    }

    /// The speed multiplier currently in force, if any feature holds one.
    pub fn active_speed(&mut self) -> Option<f64> {
        self.speed.active_value().copied()
    }
}

//! Job slots — the logical channels that host analysis jobs.
//!
//! Each slot carries at most one non-terminal job at a time, and each has its
//! own poll cadence: single-ticker runs finish within seconds, watchlist
//! batches within minutes, and a full all-stocks sweep is measured in hours
//! (its status fetch is itself comparatively expensive).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A logical job channel. One non-terminal job per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// One ticker analyzed on its own (e.g. re-analyze from a results view).
    SingleTicker,
    /// A user-selected subset of the watchlist.
    Watchlist,
    /// The full exchange universe (or a selected subset of it).
    AllStocks,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::SingleTicker, Slot::Watchlist, Slot::AllStocks];

    pub fn label(self) -> &'static str {
        match self {
            Slot::SingleTicker => "single",
            Slot::Watchlist => "watchlist",
            Slot::AllStocks => "all-stocks",
        }
    }

    /// How often this slot's job status is fetched.
    pub fn poll_interval(self) -> Duration {
        match self {
            Slot::SingleTicker => Duration::from_secs(1),
            Slot::Watchlist => Duration::from_secs(2),
            Slot::AllStocks => Duration::from_secs(5),
        }
    }

    /// Cache key of the list a job in this slot rewrites.
    ///
    /// Single-ticker and watchlist jobs both land in the watchlist results
    /// list; all-stocks jobs rewrite the universe list.
    pub fn cache_key(self) -> &'static str {
        match self {
            Slot::SingleTicker | Slot::Watchlist => "watchlist",
            Slot::AllStocks => "all_stocks",
        }
    }

    /// Session-store key holding this slot's active job id marker.
    pub fn marker_key(self) -> String {
        format!("active_job:{}", self.label())
    }

    /// Whether an empty identifier list is a valid submission for this slot.
    ///
    /// The all-stocks endpoint treats an empty symbol list as "analyze
    /// everything"; every other slot requires an explicit selection.
    pub fn allows_empty_selection(self) -> bool {
        matches!(self, Slot::AllStocks)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadences_are_distinct_classes() {
        let single = Slot::SingleTicker.poll_interval();
        let watchlist = Slot::Watchlist.poll_interval();
        let all = Slot::AllStocks.poll_interval();

        assert!(single < watchlist);
        assert!(watchlist < all);
        // The all-stocks cadence is the 5s class, not the 1s class.
        assert!(all >= Duration::from_secs(5));
        assert!(single <= Duration::from_secs(1));
    }

    #[test]
    fn marker_keys_are_unique_per_slot() {
        let keys: Vec<String> = Slot::ALL.iter().map(|s| s.marker_key()).collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| keys.iter().filter(|o| *o == k).count() == 1));
    }

    #[test]
    fn single_and_watchlist_share_the_watchlist_cache() {
        assert_eq!(Slot::SingleTicker.cache_key(), Slot::Watchlist.cache_key());
        assert_ne!(Slot::Watchlist.cache_key(), Slot::AllStocks.cache_key());
    }
}

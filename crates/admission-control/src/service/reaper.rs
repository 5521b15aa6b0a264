use crate::domain::{StateStore, Timestamp};
use std::sync::Arc;
use tracing::debug;

/// Evicts per-address state idle for longer than `stale_after_ms`.
pub struct Reaper {
    store: Arc<StateStore>,
    stale_after_ms: u64,
}

impl Reaper {
    pub fn new(store: Arc<StateStore>, stale_after_ms: u64) -> Self {
        Self {
            store,
            stale_after_ms,
        }
    }

    /// Remove stale entries. Returns how many were evicted.
    pub fn run(&self, now: Timestamp) -> usize {
        let stale_after_ms = self.stale_after_ms;
        let mut evicted = 0;
        self.store.retain(|_, state| {
            let stale = state.is_stale_at(now, stale_after_ms);
            if stale {
                evicted += 1;
            }
            !stale
        });

        if evicted > 0 {
            debug!(evicted, remaining = self.store.len(), "stale address state evicted");
        }
        evicted
    }

    pub fn stale_after_ms(&self) -> u64 {
        self.stale_after_ms
    }
}

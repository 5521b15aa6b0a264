//! Interval metrics aggregation.

use super::alert::AlertDispatcher;
use crate::domain::{GlobalCounters, MetricsSnapshot, Timestamp};
use std::sync::Arc;
use tracing::info;

/// Drains the global counters once per interval, logs non-silent intervals
/// and hands attack-like intervals to the [`AlertDispatcher`].
pub struct MetricsAggregator {
    counters: Arc<GlobalCounters>,
    dispatcher: AlertDispatcher,
    attack_block_threshold: u64,
}

impl MetricsAggregator {
    pub fn new(
        counters: Arc<GlobalCounters>,
        dispatcher: AlertDispatcher,
        attack_block_threshold: u64,
    ) -> Self {
        Self {
            counters,
            dispatcher,
            attack_block_threshold,
        }
    }

    /// Returns the drained snapshot, or `None` for a silent interval.
    pub fn flush(&self, now: Timestamp) -> Option<MetricsSnapshot> {
        let snapshot = self.counters.drain();
        if snapshot.is_silent() {
            return None;
        }

        info!(
            attempts = snapshot.attempts,
            blocked = snapshot.blocked,
            tempbans = snapshot.banned,
            handshake_ok = snapshot.handshakes_completed,
            handshake_incomplete = snapshot.handshakes_incomplete,
            "connection metrics"
        );

        if snapshot.blocked >= self.attack_block_threshold {
            self.dispatcher.maybe_alert(
                snapshot.blocked,
                snapshot.attempts,
                snapshot.handshakes_incomplete,
                now,
            );
        }
        Some(snapshot)
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }
}

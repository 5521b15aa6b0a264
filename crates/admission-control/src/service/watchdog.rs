//! Incomplete-handshake watchdog.

use super::ban::apply_temp_ban;
use crate::domain::{AdmissionConfig, BanReason, GlobalCounters, StateStore, Timestamp};
use std::sync::Arc;
use tracing::debug;

/// Outcome of one watchdog pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatchdogReport {
    /// Pending handshakes converted into incomplete events
    pub converted: u64,
    /// Addresses banned for too many incomplete handshakes
    pub bans: u64,
}

/// Periodically turns attempts that never signalled a handshake into
/// incomplete events, banning addresses that exceed the per-window limit.
pub struct HandshakeWatchdog {
    store: Arc<StateStore>,
    counters: Arc<GlobalCounters>,
    config: Arc<AdmissionConfig>,
}

impl HandshakeWatchdog {
    pub fn new(
        store: Arc<StateStore>,
        counters: Arc<GlobalCounters>,
        config: Arc<AdmissionConfig>,
    ) -> Self {
        Self {
            store,
            counters,
            config,
        }
    }

    pub fn run(&self, now: Timestamp) -> WatchdogReport {
        let config = &self.config;
        let counters = &self.counters;
        let mut report = WatchdogReport::default();

        self.store.for_each_mut(|addr, state| {
            if state.pending_handshakes == 0 || state.is_banned_at(now) {
                return;
            }
            if now.elapsed_since(state.last_seen) < config.handshake_timeout_ms {
                return;
            }

            state.roll_window(now, config.window_ms);

            let moved = state.pending_handshakes;
            state.pending_handshakes = 0;
            state.incomplete_in_window = state.incomplete_in_window.saturating_add(moved);
            counters.record_handshakes_incomplete(u64::from(moved));
            report.converted += u64::from(moved);

            if state.incomplete_in_window > config.max_incomplete_per_window {
                apply_temp_ban(
                    state,
                    addr,
                    BanReason::IncompleteHandshake,
                    now,
                    config.ban_ms,
                    counters,
                );
                counters.record_blocked(u64::from(moved));
                report.bans += 1;
            }
        });

        if report.converted > 0 {
            debug!(
                converted = report.converted,
                bans = report.bans,
                "handshake watchdog pass"
            );
        }
        report
    }
}

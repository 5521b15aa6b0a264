//! Connection-attempt path.

use super::ban::apply_temp_ban;
use crate::domain::{
    AdmissionConfig, AdmissionDecision, BanReason, DenyReason, GlobalCounters, StateStore,
    Timestamp,
};
use std::net::IpAddr;
use std::sync::Arc;

/// Evaluates each connection attempt against the address's state and the
/// configured thresholds.
pub struct AdmissionController {
    store: Arc<StateStore>,
    counters: Arc<GlobalCounters>,
    config: Arc<AdmissionConfig>,
}

impl AdmissionController {
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

    /// Decide whether `addr` may open a connection at `now`.
    ///
    /// An already-banned address is denied without touching its state. An
    /// attempt that crosses a threshold is denied and bans the address;
    /// concurrency takes priority over rate when both are violated.
    pub fn evaluate(&self, addr: IpAddr, now: Timestamp) -> AdmissionDecision {
        let config = &self.config;
        let counters = &self.counters;

        self.store.with_entry(addr, |state| {
            if state.is_banned_at(now) {
                counters.record_blocked(1);
                return AdmissionDecision::Deny(DenyReason::Banned);
            }

            state.roll_window(now, config.window_ms);

            state.attempts_in_window = state.attempts_in_window.saturating_add(1);
            state.active_connections = state.active_connections.saturating_add(1);
            state.pending_handshakes = state.pending_handshakes.saturating_add(1);
            state.last_seen = now;
            counters.record_attempt();

            let violate_rate = state.attempts_in_window > config.max_attempts_per_window;
            let violate_concurrency = state.active_connections > config.max_concurrent;

            if !(violate_rate || violate_concurrency) {
                return AdmissionDecision::Allow;
            }

            let reason = if violate_concurrency {
                BanReason::MaxConcurrent
            } else {
                BanReason::RateLimit
            };
            apply_temp_ban(state, addr, reason, now, config.ban_ms, counters);
            counters.record_blocked(1);
            AdmissionDecision::Deny(DenyReason::Ban(reason))
        })
    }

    /// Record that `addr` completed its handshake. Never lifts a ban.
    pub fn on_handshake_completed(&self, addr: IpAddr, now: Timestamp) {
        let counters = &self.counters;
        self.store.with_existing(addr, |state| {
            state.last_seen = now;
            state.pending_handshakes = state.pending_handshakes.saturating_sub(1);
            counters.record_handshake_completed();
        });
    }

    pub fn on_disconnected(&self, addr: IpAddr, now: Timestamp) {
        self.store.with_existing(addr, |state| {
            state.release_connection();
            state.last_seen = now;
        });
    }
}

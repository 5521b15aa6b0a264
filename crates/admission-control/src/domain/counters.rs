//! Global interval counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Five independent lock-free accumulators, reset by each metrics cycle.
#[derive(Debug, Default)]
pub struct GlobalCounters {
    attempts: AtomicU64,
    blocked: AtomicU64,
    banned: AtomicU64,
    handshakes_completed: AtomicU64,
    handshakes_incomplete: AtomicU64,
}

/// Values drained from [`GlobalCounters`] for one interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub blocked: u64,
    pub banned: u64,
    pub handshakes_completed: u64,
    pub handshakes_incomplete: u64,
}

impl MetricsSnapshot {
    /// An interval with no attempts, no blocks and no incomplete handshakes.
    ///
    /// `banned` and `handshakes_completed` are not consulted.
    pub fn is_silent(&self) -> bool {
        self.attempts == 0 && self.blocked == 0 && self.handshakes_incomplete == 0
    }
}

impl GlobalCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_blocked(&self, count: u64) {
        self.blocked.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_ban(&self) {
        self.banned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handshake_completed(&self) {
        self.handshakes_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handshakes_incomplete(&self, count: u64) {
        self.handshakes_incomplete
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Read and reset every counter. Each swap is atomic on its own; the
    /// snapshot across counters is not.
    pub fn drain(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.swap(0, Ordering::Relaxed),
            blocked: self.blocked.swap(0, Ordering::Relaxed),
            banned: self.banned.swap(0, Ordering::Relaxed),
            handshakes_completed: self.handshakes_completed.swap(0, Ordering::Relaxed),
            handshakes_incomplete: self.handshakes_incomplete.swap(0, Ordering::Relaxed),
        }
    }

    /// Current values without resetting.
    pub fn peek(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            banned: self.banned.load(Ordering::Relaxed),
            handshakes_completed: self.handshakes_completed.load(Ordering::Relaxed),
            handshakes_incomplete: self.handshakes_incomplete.load(Ordering::Relaxed),
        }
    }
}

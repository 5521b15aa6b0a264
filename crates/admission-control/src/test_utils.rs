//! Test utilities for admission control.
//!
//! Deterministic clock and in-memory alert transport. Enable with the
//! `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use admission_control::test_utils::ManualTimeSource;
//! use admission_control::TimeSource;
//!
//! let clock = ManualTimeSource::new(1_000);
//! clock.advance(250);
//! assert_eq!(clock.now().as_millis(), 1_250);
//! ```

use crate::domain::Timestamp;
use crate::ports::{AlertError, AlertPayload, AlertSender, TimeSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// A settable, advanceable millisecond clock.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    millis: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(millis: u64) -> Self {
        Self {
            millis: AtomicU64::new(millis),
        }
    }

    pub fn set(&self, millis: u64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Alert transport that records every payload it is asked to send.
///
/// A failing recorder still records the payload, then returns an error.
#[derive(Debug, Default)]
pub struct RecordingAlertSender {
    sent: Mutex<Vec<AlertPayload>>,
    fail: AtomicBool,
}

impl RecordingAlertSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose every send fails with a 500 status.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(true),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn payloads(&self) -> Vec<AlertPayload> {
        self.sent.lock().clone()
    }

    /// Poll until at least `count` sends were recorded or `within` elapses.
    pub async fn wait_for_sends(&self, count: usize, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            if self.sent_count() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl AlertSender for RecordingAlertSender {
    async fn send(&self, payload: &AlertPayload) -> Result<(), AlertError> {
        self.sent.lock().push(payload.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AlertError::Status(500));
        }
        Ok(())
    }
}

//! Cooldown-gated attack alerts.
//!
//! A single `compare_exchange` on the last-claim timestamp decides which
//! caller sends the alert for a cooldown window. Delivery runs on a detached
//! task with its own timeout and never reports back to the caller.

use crate::domain::{AlertSettings, Timestamp};
use crate::ports::{AlertEmbed, AlertError, AlertPayload, AlertSender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on one alert delivery.
pub const ALERT_SEND_TIMEOUT: Duration = Duration::from_secs(8);

pub struct AlertDispatcher {
    sender: Option<Arc<dyn AlertSender>>,
    settings: AlertSettings,
    cooldown_ms: u64,
    /// Millis of the last successful claim; 0 = never alerted
    last_claim: AtomicU64,
}

impl AlertDispatcher {
    pub fn new(
        sender: Option<Arc<dyn AlertSender>>,
        settings: AlertSettings,
        cooldown_ms: u64,
    ) -> Self {
        Self {
            sender,
            settings,
            cooldown_ms,
            last_claim: AtomicU64::new(0),
        }
    }

    /// A dispatcher with no destination; every call is a no-op.
    pub fn disabled() -> Self {
        Self::new(None, AlertSettings::default(), 0)
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Timestamp of the last claimed alert, `ZERO` if none.
    pub fn last_claim(&self) -> Timestamp {
        Timestamp::from_millis(self.last_claim.load(Ordering::Acquire))
    }

    /// Send an attack alert unless one was claimed within the cooldown.
    ///
    /// Returns `true` if this call won the claim and handed the alert off for
    /// delivery.
    pub fn maybe_alert(&self, blocked: u64, attempts: u64, incomplete: u64, now: Timestamp) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };
        if !self.try_claim(now) {
            return false;
        }

        let payload = self.build_payload(blocked, attempts, incomplete, now);
        dispatch(Arc::clone(sender), payload);
        true
    }

    fn try_claim(&self, now: Timestamp) -> bool {
        let last = self.last_claim.load(Ordering::Acquire);
        if last != 0 && now.as_millis().saturating_sub(last) < self.cooldown_ms {
            return false;
        }
        self.last_claim
            .compare_exchange(last, now.as_millis(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn build_payload(
        &self,
        blocked: u64,
        attempts: u64,
        incomplete: u64,
        now: Timestamp,
    ) -> AlertPayload {
        let description = format!(
            "**status:** attack-like traffic detected\n\
             **blocked (interval):** {blocked}\n\
             **attempts (interval):** {attempts}\n\
             **incomplete-handshake (interval):** {incomplete}\n\
             **time:** {}",
            now.to_rfc3339()
        );

        AlertPayload {
            username: self.settings.username.clone(),
            embeds: vec![AlertEmbed {
                title: self.settings.title.clone(),
                description,
                color: self.settings.color,
            }],
        }
    }
}

fn dispatch(sender: Arc<dyn AlertSender>, payload: AlertPayload) {
    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!("no async runtime available, attack alert dropped");
            return;
        }
    };

    handle.spawn(async move {
        let result = match tokio::time::timeout(ALERT_SEND_TIMEOUT, sender.send(&payload)).await {
            Ok(result) => result,
            Err(_) => Err(AlertError::Timeout),
        };
        match result {
            Ok(()) => debug!("attack alert delivered"),
            Err(e) => warn!(error = %e, "attack alert delivery failed"),
        }
    });
}

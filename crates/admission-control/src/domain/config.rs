//! Admission thresholds, timer periods and alert presentation.
//!
//! Values arrive from a `ConfigProvider` already parsed; `clamped()` applies
//! the minimum floors.

use std::time::Duration;

/// Minimum rate/incomplete window length (ms).
pub const MIN_WINDOW_MS: u64 = 500;
/// Minimum temporary ban length (ms).
pub const MIN_BAN_MS: u64 = 1_000;
/// Minimum handshake timeout (ms).
pub const MIN_HANDSHAKE_TIMEOUT_MS: u64 = 100;
/// Minimum metrics aggregation period (s).
pub const MIN_METRICS_INTERVAL_SECS: u64 = 5;
/// Minimum gap between two alerts (ms).
pub const MIN_ALERT_COOLDOWN_MS: u64 = 10_000;

/// Idle entries are never evicted sooner than this (ms).
pub const STALE_FLOOR_MS: u64 = 120_000;
/// Lower bound for the watchdog period (ms).
pub const MIN_WATCHDOG_PERIOD_MS: u64 = 200;
/// Fixed period of the stale-state sweep.
pub const SWEEP_PERIOD: Duration = Duration::from_secs(30);

/// Deny text shown to rejected peers when none is configured.
pub const DEFAULT_KICK_MESSAGE: &str = "too many connections, try again later.";

/// Presentation of the outbound attack alert.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertSettings {
    /// Destination URL; empty disables alerting
    pub webhook_url: String,
    /// Display name attached to the alert
    pub username: String,
    /// Title of the embedded message
    pub title: String,
    /// Embed color (RGB as integer)
    pub color: u32,
}

impl AlertSettings {
    /// Whether an alert destination has been configured.
    pub fn is_enabled(&self) -> bool {
        !self.webhook_url.trim().is_empty()
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            username: "conn-guard".to_string(),
            title: "⚠️ attack detected".to_string(),
            color: 0xFF_00_00,
        }
    }
}

/// Admission control configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Rate/incomplete window size (ms)
    pub window_ms: u64,
    /// Rate-limit threshold per window
    pub max_attempts_per_window: u32,
    /// Concurrency threshold
    pub max_concurrent: u32,
    /// Temporary ban length (ms)
    pub ban_ms: u64,
    /// Text shown to rejected peers
    pub kick_message: String,
    /// Time after which an unsignalled attempt counts as incomplete (ms)
    pub handshake_timeout_ms: u64,
    /// Incomplete-handshake ban threshold per window
    pub max_incomplete_per_window: u32,
    /// Metrics aggregation period (s)
    pub metrics_interval_secs: u64,
    /// Blocked count per interval that triggers an alert
    pub attack_block_threshold: u64,
    /// Minimum gap between alerts (ms)
    pub alert_cooldown_ms: u64,
    /// Alert destination and presentation
    pub alert: AlertSettings,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            window_ms: 5_000,
            max_attempts_per_window: 4,
            max_concurrent: 2,
            ban_ms: 60_000,
            kick_message: DEFAULT_KICK_MESSAGE.to_string(),
            handshake_timeout_ms: 800,
            max_incomplete_per_window: 3,
            metrics_interval_secs: 10,
            attack_block_threshold: 25,
            alert_cooldown_ms: 60_000,
            alert: AlertSettings::default(),
        }
    }
}

impl AdmissionConfig {
    /// Apply the minimum floors to every clamped key.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.window_ms = self.window_ms.max(MIN_WINDOW_MS);
        self.max_attempts_per_window = self.max_attempts_per_window.max(1);
        self.max_concurrent = self.max_concurrent.max(1);
        self.ban_ms = self.ban_ms.max(MIN_BAN_MS);

        self.handshake_timeout_ms = self.handshake_timeout_ms.max(MIN_HANDSHAKE_TIMEOUT_MS);
        self.max_incomplete_per_window = self.max_incomplete_per_window.max(1);

        self.metrics_interval_secs = self.metrics_interval_secs.max(MIN_METRICS_INTERVAL_SECS);
        self.attack_block_threshold = self.attack_block_threshold.max(1);
        self.alert_cooldown_ms = self.alert_cooldown_ms.max(MIN_ALERT_COOLDOWN_MS);
        self
    }

    /// Watchdog period: half the handshake timeout, never below 200 ms.
    pub fn watchdog_period(&self) -> Duration {
        Duration::from_millis((self.handshake_timeout_ms / 2).max(MIN_WATCHDOG_PERIOD_MS))
    }

    /// Metrics aggregation period, never below 5 s.
    pub fn metrics_period(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs.max(MIN_METRICS_INTERVAL_SECS))
    }

    /// Stale-state sweep period.
    pub fn sweep_period(&self) -> Duration {
        SWEEP_PERIOD
    }

    /// Idle time after which an entry is evicted: max(2 min, window + ban).
    pub fn stale_after_ms(&self) -> u64 {
        STALE_FLOOR_MS.max(self.window_ms.saturating_add(self.ban_ms))
    }

    /// Handshake timeout as a `Duration`.
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

//! Core domain types for admission control.

use std::fmt;

/// Milliseconds since the Unix epoch.
///
/// `Timestamp::ZERO` is the "unset" sentinel used by `IpState` before the
/// first attempt and by `banned_until` when the address is not banned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The unset sentinel.
    pub const ZERO: Timestamp = Timestamp(0);

    /// Create a timestamp from milliseconds since the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Whether this is the unset sentinel.
    pub const fn is_unset(&self) -> bool {
        self.0 == 0
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub fn elapsed_since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// This timestamp shifted forward by `millis`.
    pub fn plus_millis(&self, millis: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(millis))
    }

    /// RFC 3339 rendering in UTC, used for log lines and alert text.
    pub fn to_rfc3339(&self) -> String {
        i64::try_from(self.0)
            .ok()
            .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_else(|| format!("{}ms", self.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

/// Why an address was put under a temporary ban.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BanReason {
    /// Too many attempts inside one window
    RateLimit,
    /// Too many simultaneously open connections
    MaxConcurrent,
    /// Too many attempts that never signalled handshake completion
    IncompleteHandshake,
}

impl BanReason {
    /// Stable identifier used in logs and deny reasons.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BanReason::RateLimit => "rate_limit",
            BanReason::MaxConcurrent => "max_concurrent",
            BanReason::IncompleteHandshake => "incomplete_handshake",
        }
    }
}

impl fmt::Display for BanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a connection attempt was denied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// The address was already under a ban when it attempted
    Banned,
    /// This attempt triggered a new ban
    Ban(BanReason),
}

impl DenyReason {
    /// `"banned"` or the triggering ban reason.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Banned => "banned",
            DenyReason::Ban(reason) => reason.as_str(),
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one connection attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allow,
    Deny(DenyReason),
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allow)
    }

    /// The deny reason, if any.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            AdmissionDecision::Allow => None,
            AdmissionDecision::Deny(reason) => Some(*reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_since_saturates() {
        let early = Timestamp::from_millis(1_000);
        let late = Timestamp::from_millis(4_500);
        assert_eq!(late.elapsed_since(early), 3_500);
        assert_eq!(early.elapsed_since(late), 0);
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(DenyReason::Banned.as_str(), "banned");
        assert_eq!(DenyReason::Ban(BanReason::RateLimit).as_str(), "rate_limit");
        assert_eq!(
            DenyReason::Ban(BanReason::MaxConcurrent).to_string(),
            "max_concurrent"
        );
        assert_eq!(
            BanReason::IncompleteHandshake.to_string(),
            "incomplete_handshake"
        );
    }

    #[test]
    fn test_rfc3339_rendering() {
        let ts = Timestamp::from_millis(1_700_000_000_123);
        assert_eq!(ts.to_rfc3339(), "2023-11-14T22:13:20.123Z");
    }
}

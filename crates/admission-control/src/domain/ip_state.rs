//! Per-address admission record.

use super::types::Timestamp;

/// Mutable admission state for one source address.
///
/// Owned exclusively by [`StateStore`](super::StateStore); every mutation
/// happens while the store holds the address's shard guard.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IpState {
    /// Start of the current rate window (`ZERO` before the first attempt)
    pub window_start: Timestamp,
    /// Attempts since `window_start`
    pub attempts_in_window: u32,
    /// Attempts in this window whose handshake never arrived in time
    pub incomplete_in_window: u32,
    /// Currently open connections
    pub active_connections: u32,
    /// Rejected outright until this instant (`ZERO` = not banned)
    pub banned_until: Timestamp,
    /// Most recent attempt, handshake or disconnect
    pub last_seen: Timestamp,
    /// Accepted attempts still awaiting a handshake signal
    pub pending_handshakes: u32,
}

impl IpState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the window when it is unset or longer than `window_ms` has
    /// passed since it began. Returns `true` if the window was reset.
    pub fn roll_window(&mut self, now: Timestamp, window_ms: u64) -> bool {
        if self.window_start.is_unset() || now.elapsed_since(self.window_start) > window_ms {
            self.window_start = now;
            self.attempts_in_window = 0;
            self.incomplete_in_window = 0;
            return true;
        }
        false
    }

    pub fn is_banned_at(&self, now: Timestamp) -> bool {
        self.banned_until > now
    }

    /// Idle for strictly longer than `stale_after_ms`.
    pub fn is_stale_at(&self, now: Timestamp, stale_after_ms: u64) -> bool {
        now.elapsed_since(self.last_seen) > stale_after_ms
    }

    /// Release one open connection, floored at zero.
    pub fn release_connection(&mut self) {
        self.active_connections = self.active_connections.saturating_sub(1);
    }

    /// Enter the banned state. Only the shared ban routine calls this.
    pub(crate) fn enter_ban(&mut self, now: Timestamp, ban_ms: u64) -> Timestamp {
        self.banned_until = now.plus_millis(ban_ms);
        self.attempts_in_window = 0;
        self.incomplete_in_window = 0;
        self.window_start = now;
        self.pending_handshakes = 0;
        // the attempt that triggered the ban never becomes a live connection
        self.release_connection();
        self.banned_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_first_roll_initialises_window() {
        let mut state = IpState::new();
        assert!(state.roll_window(ts(10_000), 5_000));
        assert_eq!(state.window_start, ts(10_000));
    }

    #[test]
    fn test_roll_window_resets_only_after_expiry() {
        let mut state = IpState {
            window_start: ts(10_000),
            attempts_in_window: 3,
            incomplete_in_window: 2,
            ..IpState::default()
        };

        // exactly window_ms elapsed is still inside the window
        assert!(!state.roll_window(ts(15_000), 5_000));
        assert_eq!(state.attempts_in_window, 3);

        assert!(state.roll_window(ts(15_001), 5_000));
        assert_eq!(state.window_start, ts(15_001));
        assert_eq!(state.attempts_in_window, 0);
        assert_eq!(state.incomplete_in_window, 0);
    }

    #[test]
    fn test_ban_boundary() {
        let state = IpState {
            banned_until: ts(70_000),
            ..IpState::default()
        };
        assert!(state.is_banned_at(ts(69_999)));
        assert!(!state.is_banned_at(ts(70_000)));
        assert!(!IpState::new().is_banned_at(ts(1)));
    }

    #[test]
    fn test_enter_ban_resets_window_and_releases_connection() {
        let mut state = IpState {
            window_start: ts(1_000),
            attempts_in_window: 5,
            incomplete_in_window: 1,
            active_connections: 2,
            pending_handshakes: 4,
            last_seen: ts(2_000),
            ..IpState::default()
        };

        let until = state.enter_ban(ts(2_000), 60_000);

        assert_eq!(until, ts(62_000));
        assert_eq!(state.banned_until, ts(62_000));
        assert_eq!(state.window_start, ts(2_000));
        assert_eq!(state.attempts_in_window, 0);
        assert_eq!(state.incomplete_in_window, 0);
        assert_eq!(state.pending_handshakes, 0);
        assert_eq!(state.active_connections, 1);
    }

    #[test]
    fn test_enter_ban_with_no_connections_stays_at_zero() {
        let mut state = IpState::new();
        state.enter_ban(ts(5_000), 1_000);
        assert_eq!(state.active_connections, 0);
    }

    #[test]
    fn test_staleness_is_strict() {
        let state = IpState {
            last_seen: ts(1_000),
            ..IpState::default()
        };
        assert!(!state.is_stale_at(ts(121_000), 120_000));
        assert!(state.is_stale_at(ts(121_001), 120_000));
    }
}

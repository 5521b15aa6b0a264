//! # Driving Ports (Inbound API)
//!
//! The APIs the host's connection-lifecycle source and scheduler call into.

use crate::domain::DenyReason;
use std::net::IpAddr;

/// What the host must do with a connection attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionVerdict {
    /// Let the connection proceed
    Accept,
    /// Close the connection, showing `message` to the peer
    Reject {
        reason: DenyReason,
        message: String,
    },
}

impl ConnectionVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConnectionVerdict::Accept)
    }
}

/// Connection-lifecycle notifications.
///
/// Implementations are called concurrently from many tasks, including
/// several at once for the same address.
///
/// # Example
///
/// ```rust,ignore
/// match events.on_connection_attempt(peer.ip()) {
///     ConnectionVerdict::Accept => relay(socket).await,
///     ConnectionVerdict::Reject { message, .. } => kick(socket, &message).await,
/// }
/// ```
pub trait ConnectionEvents: Send + Sync {
    /// Decide whether to admit a new connection from `addr`.
    fn on_connection_attempt(&self, addr: IpAddr) -> ConnectionVerdict;

    /// The peer progressed past initial connection setup.
    ///
    /// Positive signal only; never lifts a ban. No-op for unknown addresses.
    fn on_handshake_completed(&self, addr: IpAddr);

    /// A previously admitted connection from `addr` closed.
    fn on_disconnected(&self, addr: IpAddr);
}

/// Periodic triggers, each fired by its own timer.
pub trait MaintenanceApi: Send + Sync {
    /// Convert timed-out pending handshakes into incomplete events.
    fn check_handshakes(&self);

    /// Evict idle per-address state.
    fn sweep_stale(&self);

    /// Drain the interval counters, log them and maybe alert.
    fn flush_metrics(&self);
}

use crate::domain::{BanReason, GlobalCounters, IpState, Timestamp};
use std::net::IpAddr;
use tracing::warn;

/// The single entry point into the banned state.
///
/// Shared by the attempt path and the handshake watchdog. The caller holds
/// the address's store guard.
pub(crate) fn apply_temp_ban(
    state: &mut IpState,
    addr: IpAddr,
    reason: BanReason,
    now: Timestamp,
    ban_ms: u64,
    counters: &GlobalCounters,
) -> Timestamp {
    let until = state.enter_ban(now, ban_ms);
    counters.record_ban();

    warn!(
        address = %addr,
        reason = %reason,
        until = %until,
        "temporary ban applied"
    );
    until
}

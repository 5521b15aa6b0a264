//! Concurrent address-keyed state store.
//!
//! Each closure runs while the shard write guard for its key is held, so a
//! read-modify-write sequence on one `IpState` is exclusive. Closures must not
//! touch the store again; doing so may deadlock on the same shard.

use super::ip_state::IpState;
use dashmap::DashMap;
use std::net::IpAddr;

/// Mapping from source address to its admission record.
#[derive(Debug, Default)]
pub struct StateStore {
    entries: DashMap<IpAddr, IpState>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Run `f` on the address's state, creating it on first use.
    pub fn with_entry<R>(&self, addr: IpAddr, f: impl FnOnce(&mut IpState) -> R) -> R {
        let mut entry = self.entries.entry(addr).or_default();
        f(entry.value_mut())
    }

    /// Run `f` only if the address is already tracked.
    pub fn with_existing<R>(&self, addr: IpAddr, f: impl FnOnce(&mut IpState) -> R) -> Option<R> {
        self.entries
            .get_mut(&addr)
            .map(|mut entry| f(entry.value_mut()))
    }

    /// Visit every tracked address, one shard guard at a time.
    pub fn for_each_mut(&self, mut f: impl FnMut(IpAddr, &mut IpState)) {
        for mut entry in self.entries.iter_mut() {
            let addr = *entry.key();
            f(addr, entry.value_mut());
        }
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain(&self, mut keep: impl FnMut(&IpAddr, &IpState) -> bool) {
        self.entries.retain(|addr, state| keep(addr, state));
    }

    /// Number of entries matching `pred`, read-locking one shard at a time.
    pub fn count_where(&self, pred: impl Fn(&IpState) -> bool) -> usize {
        self.entries.iter().filter(|entry| pred(entry.value())).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.entries.contains_key(addr)
    }

    /// Copy of the address's current state.
    pub fn snapshot(&self, addr: &IpAddr) -> Option<IpState> {
        self.entries.get(addr).map(|entry| entry.value().clone())
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

use super::{
    AdmissionController, AlertDispatcher, HandshakeWatchdog, MetricsAggregator, Reaper,
    WatchdogReport,
};
use crate::domain::{
    AdmissionConfig, AdmissionDecision, GlobalCounters, IpState, MetricsSnapshot, StateStore,
    Timestamp,
};
use crate::ports::{
    AlertSender, ConfigProvider, ConnectionEvents, ConnectionVerdict, MaintenanceApi, TimeSource,
};
use std::net::IpAddr;
use std::sync::Arc;

/// Operator-facing view of the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdmissionStats {
    /// Addresses currently held in the state store
    pub tracked_addresses: usize,
    /// Addresses whose ban has not yet expired
    pub active_bans: usize,
}

/// Admission engine facade implementing the driving ports.
///
/// Owns the shared state store and counters and hands them to each
/// component. The `*_at` methods take an explicit timestamp; the port
/// implementations read it from the injected `TimeSource`.
///
/// # Example
///
/// ```rust,ignore
/// let service = Arc::new(AdmissionService::from_provider(&provider, clock, sender));
///
/// match service.on_connection_attempt(peer.ip()) {
///     ConnectionVerdict::Accept => { /* relay */ }
///     ConnectionVerdict::Reject { message, .. } => { /* kick */ }
/// }
/// ```
pub struct AdmissionService {
    config: Arc<AdmissionConfig>,
    store: Arc<StateStore>,
    counters: Arc<GlobalCounters>,
    time_source: Arc<dyn TimeSource>,
    controller: AdmissionController,
    watchdog: HandshakeWatchdog,
    reaper: Reaper,
    metrics: MetricsAggregator,
}

impl AdmissionService {
    /// Build the engine. `config` is clamped before use; `alert_sender` of
    /// `None` disables alerting.
    pub fn new(
        config: AdmissionConfig,
        time_source: Arc<dyn TimeSource>,
        alert_sender: Option<Arc<dyn AlertSender>>,
    ) -> Self {
        let config = Arc::new(config.clamped());
        let store = Arc::new(StateStore::new());
        let counters = Arc::new(GlobalCounters::new());

        let controller = AdmissionController::new(
            Arc::clone(&store),
            Arc::clone(&counters),
            Arc::clone(&config),
        );
        let watchdog = HandshakeWatchdog::new(
            Arc::clone(&store),
            Arc::clone(&counters),
            Arc::clone(&config),
        );
        let reaper = Reaper::new(Arc::clone(&store), config.stale_after_ms());
        let dispatcher = AlertDispatcher::new(
            alert_sender,
            config.alert.clone(),
            config.alert_cooldown_ms,
        );
        let metrics = MetricsAggregator::new(
            Arc::clone(&counters),
            dispatcher,
            config.attack_block_threshold,
        );

        Self {
            config,
            store,
            counters,
            time_source,
            controller,
            watchdog,
            reaper,
            metrics,
        }
    }

    pub fn from_provider(
        provider: &dyn ConfigProvider,
        time_source: Arc<dyn TimeSource>,
        alert_sender: Option<Arc<dyn AlertSender>>,
    ) -> Self {
        Self::new(provider.admission_config(), time_source, alert_sender)
    }

    pub(crate) fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// The effective (clamped) configuration.
    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn evaluate_at(&self, addr: IpAddr, now: Timestamp) -> AdmissionDecision {
        self.controller.evaluate(addr, now)
    }

    pub fn handshake_completed_at(&self, addr: IpAddr, now: Timestamp) {
        self.controller.on_handshake_completed(addr, now);
    }

    pub fn disconnected_at(&self, addr: IpAddr, now: Timestamp) {
        self.controller.on_disconnected(addr, now);
    }

    pub fn check_handshakes_at(&self, now: Timestamp) -> WatchdogReport {
        self.watchdog.run(now)
    }

    /// Returns the number of evicted addresses.
    pub fn sweep_stale_at(&self, now: Timestamp) -> usize {
        self.reaper.run(now)
    }

    /// Returns the drained counters, or `None` for a silent interval.
    pub fn flush_metrics_at(&self, now: Timestamp) -> Option<MetricsSnapshot> {
        self.metrics.flush(now)
    }

    /// Copy of the per-address state, if tracked.
    pub fn state_of(&self, addr: &IpAddr) -> Option<IpState> {
        self.store.snapshot(addr)
    }

    /// Current interval counters without draining them.
    pub fn counters(&self) -> MetricsSnapshot {
        self.counters.peek()
    }

    pub fn alert_dispatcher(&self) -> &AlertDispatcher {
        self.metrics.dispatcher()
    }

    pub fn stats(&self) -> AdmissionStats {
        let now = self.now();
        AdmissionStats {
            tracked_addresses: self.store.len(),
            active_bans: self.store.count_where(|state| state.is_banned_at(now)),
        }
    }

    /// Drop all per-address state.
    pub fn shutdown(&self) {
        self.store.clear();
    }
}

impl ConnectionEvents for AdmissionService {
    fn on_connection_attempt(&self, addr: IpAddr) -> ConnectionVerdict {
        match self.evaluate_at(addr, self.now()) {
            AdmissionDecision::Allow => ConnectionVerdict::Accept,
            AdmissionDecision::Deny(reason) => ConnectionVerdict::Reject {
                reason,
                message: self.config.kick_message.clone(),
            },
        }
    }

    fn on_handshake_completed(&self, addr: IpAddr) {
        self.handshake_completed_at(addr, self.now());
    }

    fn on_disconnected(&self, addr: IpAddr) {
        self.disconnected_at(addr, self.now());
    }
}

impl MaintenanceApi for AdmissionService {
    fn check_handshakes(&self) {
        self.check_handshakes_at(self.now());
    }

    fn sweep_stale(&self) {
        self.sweep_stale_at(self.now());
    }

    fn flush_metrics(&self) {
        self.flush_metrics_at(self.now());
    }
}

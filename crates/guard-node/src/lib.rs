//! # Guard Node
//!
//! Host process for the admission-control engine.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`telemetry`)
//! 2. Read process settings from the environment (`settings`)
//! 3. Load or create the admission config file
//! 4. Build the engine and the optional webhook alert sender
//! 5. Spawn the maintenance timers (`scheduler`) and the TCP gate (`gate`)
//! 6. On Ctrl+C, signal shutdown and release the engine

pub mod gate;
pub mod scheduler;
pub mod settings;
pub mod telemetry;

use admission_control::adapters::{FileConfigProvider, SystemTimeSource};
use admission_control::{
    AdmissionConfig, AdmissionService, AlertSender, ConfigProvider, ConnectionEvents,
};
use anyhow::{Context, Result};
use gate::AdmissionGate;
use scheduler::{spawn_maintenance, MaintenancePeriods};
use settings::NodeSettings;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The running guard: engine, timers and gate.
pub struct GuardNode {
    service: Arc<AdmissionService>,
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl GuardNode {
    /// Load configuration, bind the listener and start all tasks.
    ///
    /// # Errors
    ///
    /// Fails only if the listen address cannot be bound.
    pub async fn start(settings: &NodeSettings) -> Result<Self> {
        let provider = FileConfigProvider::load_or_create(&settings.config_path);
        let config = provider.admission_config();
        log_effective_config(&config);

        let sender = alert_sender(&config);
        let service = Arc::new(AdmissionService::new(
            config,
            Arc::new(SystemTimeSource::new()),
            sender,
        ));

        let listener = TcpListener::bind(settings.listen)
            .await
            .with_context(|| format!("failed to bind {}", settings.listen))?;
        let local_addr = listener.local_addr().context("listener has no local address")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut tasks = spawn_maintenance(
            Arc::clone(&service),
            MaintenancePeriods::from_config(service.config()),
            shutdown_rx.clone(),
        );

        let gate = Arc::new(AdmissionGate::new(
            Arc::clone(&service) as Arc<dyn ConnectionEvents>,
            settings.upstream,
            service.config().handshake_timeout(),
        ));
        tasks.push(tokio::spawn(gate.run(listener, shutdown_rx)));

        Ok(Self {
            service,
            local_addr,
            shutdown_tx,
            tasks,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn service(&self) -> &Arc<AdmissionService> {
        &self.service
    }

    /// Stop the timers and the accept loop, then drop all per-address state.
    pub async fn shutdown(self) {
        info!("Shutting down guard node");
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "task ended abnormally");
            }
        }
        self.service.shutdown();
        info!("Guard node stopped");
    }
}

#[cfg(feature = "webhook")]
fn alert_sender(config: &AdmissionConfig) -> Option<Arc<dyn AlertSender>> {
    use admission_control::adapters::WebhookAlertSender;

    if !config.alert.is_enabled() {
        return None;
    }
    match WebhookAlertSender::new(config.alert.webhook_url.clone()) {
        Ok(sender) => Some(Arc::new(sender)),
        Err(e) => {
            warn!(error = %e, "webhook alerts disabled");
            None
        }
    }
}

#[cfg(not(feature = "webhook"))]
fn alert_sender(config: &AdmissionConfig) -> Option<Arc<dyn AlertSender>> {
    if config.alert.is_enabled() {
        warn!("alert_webhook_url is set but webhook support is not compiled in");
    }
    None
}

fn log_effective_config(config: &AdmissionConfig) {
    info!(
        window_ms = config.window_ms,
        max_attempts = config.max_attempts_per_window,
        max_concurrent = config.max_concurrent,
        ban_ms = config.ban_ms,
        handshake_timeout_ms = config.handshake_timeout_ms,
        max_incomplete = config.max_incomplete_per_window,
        alerts = config.alert.is_enabled(),
        "admission control enabled"
    );
}

//! Periodic maintenance timers.
//!
//! Three independent interval loops drive the watchdog, the stale-state sweep
//! and the metrics cycle. Each loop stops when the shutdown signal changes.

use admission_control::{AdmissionConfig, MaintenanceApi};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintenancePeriods {
    pub watchdog: Duration,
    pub sweep: Duration,
    pub metrics: Duration,
}

impl MaintenancePeriods {
    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self {
            watchdog: config.watchdog_period(),
            sweep: config.sweep_period(),
            metrics: config.metrics_period(),
        }
    }
}

/// Spawn the three maintenance loops.
pub fn spawn_maintenance<M>(
    engine: Arc<M>,
    periods: MaintenancePeriods,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>>
where
    M: MaintenanceApi + 'static,
{
    vec![
        spawn_loop("handshake-watchdog", periods.watchdog, shutdown.clone(), {
            let engine = Arc::clone(&engine);
            move || engine.check_handshakes()
        }),
        spawn_loop("stale-sweep", periods.sweep, shutdown.clone(), {
            let engine = Arc::clone(&engine);
            move || engine.sweep_stale()
        }),
        spawn_loop("metrics", periods.metrics, shutdown, move || {
            engine.flush_metrics()
        }),
    ]
}

fn spawn_loop(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    tick: impl Fn() + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => tick(),
                _ = shutdown.changed() => {
                    debug!(task = name, "Shutdown signal received");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingEngine {
        watchdog: AtomicU64,
        sweep: AtomicU64,
        metrics: AtomicU64,
    }

    impl MaintenanceApi for CountingEngine {
        fn check_handshakes(&self) {
            self.watchdog.fetch_add(1, Ordering::SeqCst);
        }

        fn sweep_stale(&self) {
            self.sweep.fetch_add(1, Ordering::SeqCst);
        }

        fn flush_metrics(&self) {
            self.metrics.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_periods_follow_config() {
        let periods = MaintenancePeriods::from_config(&AdmissionConfig::default());
        assert_eq!(periods.watchdog, Duration::from_millis(400));
        assert_eq!(periods.sweep, Duration::from_secs(30));
        assert_eq!(periods.metrics, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loops_tick_independently_and_stop() {
        let engine = Arc::new(CountingEngine::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let periods = MaintenancePeriods {
            watchdog: Duration::from_millis(100),
            sweep: Duration::from_millis(250),
            metrics: Duration::from_millis(500),
        };

        let handles = spawn_maintenance(Arc::clone(&engine), periods, shutdown_rx);
        tokio::time::sleep(Duration::from_millis(1_020)).await;

        let watchdog = engine.watchdog.load(Ordering::SeqCst);
        let sweep = engine.sweep.load(Ordering::SeqCst);
        let metrics = engine.metrics.load(Ordering::SeqCst);
        assert!((9..=10).contains(&watchdog), "watchdog ticked {watchdog} times");
        assert!((3..=4).contains(&sweep), "sweep ticked {sweep} times");
        assert!((1..=2).contains(&metrics), "metrics ticked {metrics} times");

        shutdown_tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(engine.watchdog.load(Ordering::SeqCst), watchdog);
    }
}

//! # Admission Service
//!
//! The engine components and the `AdmissionService` facade that wires them
//! to the ports.
//!
//! - `AdmissionController`: the connection-attempt path
//! - `HandshakeWatchdog`: converts silent attempts into incomplete events
//! - `Reaper`: evicts idle per-address state
//! - `MetricsAggregator` and `AlertDispatcher`: interval summary and alerts

mod admission;
mod alert;
mod ban;
mod core;
mod metrics;
mod reaper;
mod watchdog;

pub use admission::AdmissionController;
pub use alert::{AlertDispatcher, ALERT_SEND_TIMEOUT};
pub use self::core::{AdmissionService, AdmissionStats};
pub use metrics::MetricsAggregator;
pub use reaper::Reaper;
pub use watchdog::{HandshakeWatchdog, WatchdogReport};

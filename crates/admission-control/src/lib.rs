//! # Connection Admission Control
//!
//! Per-source-address admission controller that protects a network-facing
//! service from connection floods and from clients that open connections
//! but never complete a protocol handshake.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture with:
//! - **Domain Layer:** per-address state, the state store, global counters, config
//! - **Ports Layer:** notification API the host drives, SPIs the host provides
//! - **Service Layer:** admission controller, watchdog, reaper, metrics, alerts
//! - **Adapters Layer:** system clock, config file loader, webhook transport
//!
//! ```text
//!  ConnectionAttempt ──→ AdmissionController ──→ StateStore ←── HandshakeWatchdog (timer)
//!  HandshakeCompleted ─┘        │                    ↑
//!  Disconnected ───────┘        ↓                    └──────── Reaper (timer)
//!                         GlobalCounters ──→ MetricsAggregator (timer) ──→ AlertDispatcher
//! ```
//!
//! ## Example
//!
//! ```rust
//! use admission_control::{AdmissionConfig, AdmissionDecision, AdmissionService, Timestamp};
//! use admission_control::adapters::SystemTimeSource;
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//!
//! let service = AdmissionService::new(
//!     AdmissionConfig::default(),
//!     Arc::new(SystemTimeSource::new()),
//!     None,
//! );
//!
//! let addr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));
//! let now = Timestamp::from_millis(1_700_000_000_000);
//! assert_eq!(service.evaluate_at(addr, now), AdmissionDecision::Allow);
//! ```

// =============================================================================
// CORE MODULES
// =============================================================================

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Test utilities (ManualTimeSource, RecordingAlertSender).
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use domain::{
    AdmissionConfig, AdmissionDecision, AlertSettings, BanReason, DenyReason, GlobalCounters,
    IpState, MetricsSnapshot, StateStore, Timestamp,
};

pub use ports::{
    AlertError, AlertPayload, AlertSender, ConfigProvider, ConnectionEvents, ConnectionVerdict,
    MaintenanceApi, TimeSource,
};

pub use service::{
    AdmissionController, AdmissionService, AdmissionStats, AlertDispatcher, HandshakeWatchdog,
    MetricsAggregator, Reaper, WatchdogReport,
};

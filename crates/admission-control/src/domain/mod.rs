//! Domain Layer - Pure admission logic with no I/O
//!
//! This module contains:
//! - Millisecond timestamps and admission outcomes
//! - Per-address state (`IpState`) with its rolling window
//! - The concurrent address-keyed `StateStore`
//! - Lock-free `GlobalCounters` drained by the metrics cycle
//! - `AdmissionConfig` with defaults and floor clamps

pub mod config;
pub mod counters;
pub mod ip_state;
pub mod store;
/// Core domain types (timestamps, reasons, decisions)
pub mod types;

pub use config::*;
pub use counters::*;
pub use ip_state::*;
pub use store::*;
pub use types::*;

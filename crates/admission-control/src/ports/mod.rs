//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** the notification API and periodic triggers
//!   the host drives
//! - **Driven Ports (Outbound):** the clock, configuration source and alert
//!   transport the host provides

pub mod inbound;
pub mod outbound;

pub use inbound::{ConnectionEvents, ConnectionVerdict, MaintenanceApi};
pub use outbound::{
    AlertEmbed, AlertError, AlertPayload, AlertSender, ConfigProvider, TimeSource,
};

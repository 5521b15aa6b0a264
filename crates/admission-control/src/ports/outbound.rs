//! # Driven Ports (Outbound SPI)
//!
//! Interfaces the host application provides to the engine.

use crate::domain::{AdmissionConfig, Timestamp};
use async_trait::async_trait;
use serde::Serialize;

/// Abstract interface for time (millisecond resolution).
///
/// Injected so tests can drive windows, bans and timeouts deterministically.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Source of admission configuration.
pub trait ConfigProvider: Send + Sync {
    /// Parsed configuration with floors applied.
    fn admission_config(&self) -> AdmissionConfig;
}

/// Outbound attack notification.
///
/// Serializes to `{"username": .., "embeds": [{"title": .., "description": .., "color": ..}]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertPayload {
    pub username: String,
    pub embeds: Vec<AlertEmbed>,
}

/// The single embedded message of an [`AlertPayload`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
}

impl AlertPayload {
    /// The embed's description, if any.
    pub fn description(&self) -> Option<&str> {
        self.embeds.first().map(|embed| embed.description.as_str())
    }
}

/// Errors from alert delivery. Logged by the dispatcher, never propagated.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert transport failed: {0}")]
    Http(String),

    #[error("alert destination answered with status {0}")]
    Status(u16),

    #[error("alert delivery timed out")]
    Timeout,

    #[error("alert transport could not be built: {0}")]
    Build(String),
}

/// Delivery channel for attack alerts.
#[async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, payload: &AlertPayload) -> Result<(), AlertError>;
}

//! # Adapters Layer
//!
//! Concrete implementations of the driven ports:
//! - `SystemTimeSource`: wall clock in milliseconds
//! - `StaticConfigProvider` / `FileConfigProvider`: configuration sources
//! - `WebhookAlertSender`: HTTP webhook transport (feature `webhook`)

pub mod config;
pub mod time;
#[cfg(feature = "webhook")]
pub mod webhook;

pub use config::{ConfigError, FileConfigProvider, StaticConfigProvider, DEFAULT_CONFIG_FILE};
pub use time::SystemTimeSource;
#[cfg(feature = "webhook")]
pub use webhook::WebhookAlertSender;

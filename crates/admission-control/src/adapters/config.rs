//! Configuration sources.
//!
//! The file format is one `key: value` pair per line. Blank lines and `#`
//! comments are ignored, lines without a colon are skipped and a value may be
//! wrapped in single or double quotes. Bad values keep the previous setting;
//! nothing here fails startup. Negative numbers are read as zero and then
//! raised to the floor by `clamped()`.

use crate::domain::AdmissionConfig;
use crate::ports::ConfigProvider;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Default configuration written on first run.
pub const DEFAULT_CONFIG_FILE: &str = include_str!("../../config.yml");

// ============================================================================
// StaticConfigProvider - in-memory config for tests and embedding
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: AdmissionConfig,
}

impl StaticConfigProvider {
    #[must_use]
    pub fn new(config: AdmissionConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn admission_config(&self) -> AdmissionConfig {
        self.config.clone().clamped()
    }
}

// ============================================================================
// FileConfigProvider - `key: value` file on disk
// ============================================================================

/// Errors that can occur while reading or creating the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
    config: AdmissionConfig,
}

impl FileConfigProvider {
    /// Load `path`, writing the bundled default file first if it is absent.
    ///
    /// Never fails: I/O problems are logged and the defaults are used.
    pub fn load_or_create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            match write_default(path) {
                Ok(()) => info!(path = %path.display(), "created default config"),
                Err(e) => error!(error = %e, "failed writing default config"),
            }
        }

        match Self::try_load(path) {
            Ok(provider) => provider,
            Err(e) => {
                error!(error = %e, "failed reading config, using defaults");
                Self {
                    path: path.to_path_buf(),
                    config: AdmissionConfig::default(),
                }
            }
        }
    }

    /// Load and parse `path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            config: parse(&content),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigProvider for FileConfigProvider {
    fn admission_config(&self) -> AdmissionConfig {
        self.config.clone()
    }
}

fn write_default(path: &Path) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, DEFAULT_CONFIG_FILE).map_err(io_err)
}

/// Parse config text over the defaults and apply the floors.
pub fn parse(content: &str) -> AdmissionConfig {
    let mut config = AdmissionConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        apply(&mut config, key.trim(), unquote(value.trim()));
    }

    config.clamped()
}

fn apply(config: &mut AdmissionConfig, key: &str, value: &str) {
    match key {
        "window_ms" => set_number(&mut config.window_ms, key, value),
        "max_attempts_per_window" => set_number(&mut config.max_attempts_per_window, key, value),
        "max_concurrent" => set_number(&mut config.max_concurrent, key, value),
        "ban_seconds" => set_seconds(&mut config.ban_ms, key, value),
        "kick_message" => set_text(&mut config.kick_message, value),

        "handshake_timeout_ms" => set_number(&mut config.handshake_timeout_ms, key, value),
        "max_incomplete_per_window" => {
            set_number(&mut config.max_incomplete_per_window, key, value)
        }

        "metrics_log_interval_seconds" => {
            set_number(&mut config.metrics_interval_secs, key, value)
        }

        "attack_block_threshold" => set_number(&mut config.attack_block_threshold, key, value),
        "attack_alert_cooldown_seconds" => set_seconds(&mut config.alert_cooldown_ms, key, value),

        // legacy key names from older config files
        "alert_webhook_url" | "discord_webhook_url" => {
            config.alert.webhook_url = value.to_string()
        }
        "alert_username" | "discord_username" => set_text(&mut config.alert.username, value),
        "alert_title" | "discord_embed_title" => set_text(&mut config.alert.title, value),
        "alert_color" | "discord_embed_color_red" => {
            set_number(&mut config.alert.color, key, value)
        }

        _ => warn!(key, "ignoring unknown config key"),
    }
}

/// Parse a signed integer and floor it at zero.
fn parse_non_negative(key: &str, value: &str) -> Option<u64> {
    match value.parse::<i64>() {
        Ok(n) => Some(n.max(0).unsigned_abs()),
        Err(_) => {
            warn!(key, value, "invalid number in config, keeping previous value");
            None
        }
    }
}

fn set_number<T: TryFrom<u64>>(slot: &mut T, key: &str, value: &str) {
    let Some(n) = parse_non_negative(key, value) else {
        return;
    };
    match T::try_from(n) {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value, "number out of range in config, keeping previous value"),
    }
}

fn set_seconds(slot_ms: &mut u64, key: &str, value: &str) {
    if let Some(secs) = parse_non_negative(key, value) {
        *slot_ms = secs.saturating_mul(1_000);
    }
}

fn set_text(slot: &mut String, value: &str) {
    if !value.is_empty() {
        *slot = value.to_string();
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

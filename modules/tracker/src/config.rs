// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Configuration of the tracker, loaded from a JSON file.
//!
//! Every field is optional, a missing field takes its default:
//!
//! ```json
//! {
//!     "tick_interval_ms": 250,
//!     "mode": { "type": "periodic", "period_secs": 120 },
//!     "settle_delay_ms": 8000,
//!     "drift_window_us": 45000000,
//!     "event_name": "deviceLocator",
//!     "public_event": false,
//!     "device_id": "e00fce68",
//!     "beacon_event_name": "deviceLocation_gps",
//!     "beacon_interval_ms": 5000
//! }
//! ```

use locator::requester::{DEFAULT_EVENT_NAME, DEFAULT_SETTLE_DELAY, Mode, RequesterConfig};
use locator::transport::Visibility;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const DEFAULT_BEACON_EVENT_NAME: &str = "deviceLocation_gps";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// When network location requests are performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModeConfig {
    Once,
    Periodic { period_secs: u64 },
    Manual,
}

impl Default for ModeConfig {
    fn default() -> Self {
        ModeConfig::Periodic { period_secs: 120 }
    }
}

impl From<ModeConfig> for Mode {
    fn from(mode: ModeConfig) -> Self {
        match mode {
            ModeConfig::Once => Mode::Once,
            ModeConfig::Periodic { period_secs } => {
                Mode::Periodic(Duration::from_secs(period_secs))
            }
            ModeConfig::Manual => Mode::Manual,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub tick_interval_ms: u64,
    pub mode: ModeConfig,
    pub settle_delay_ms: u64,
    pub drift_window_us: u64,
    pub event_name: String,
    pub public_event: bool,
    pub device_id: Option<String>,
    pub beacon_event_name: String,
    pub beacon_interval_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            tick_interval_ms: 250,
            mode: ModeConfig::default(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            drift_window_us: 45_000_000,
            event_name: DEFAULT_EVENT_NAME.to_string(),
            public_event: false,
            device_id: None,
            beacon_event_name: DEFAULT_BEACON_EVENT_NAME.to_string(),
            beacon_interval_ms: 5000,
        }
    }
}

impl TrackerConfig {
    /// Loads the config from `path`.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_interval_ms",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Never zero, a config built in code with `tick_interval_ms: 0` ticks every millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn drift_window(&self) -> Duration {
        Duration::from_micros(self.drift_window_us)
    }

    pub fn beacon_interval(&self) -> Duration {
        Duration::from_millis(self.beacon_interval_ms)
    }

    pub fn requester_config(&self) -> RequesterConfig {
        RequesterConfig {
            mode: self.mode.into(),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            event_name: self.event_name.clone(),
            visibility: if self.public_event {
                Visibility::Public
            } else {
                Visibility::Private
            },
            device_id: self.device_id.clone(),
        }
    }
}

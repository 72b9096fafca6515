//! Settings schema.
//!
//! Every field has a compiled default so a partial file or a single env var
//! is enough to override one value.

use serde::{Deserialize, Serialize};
use weave_core::logging::LogFormat;

use crate::errors::{Result, SettingsError};

/// Root settings document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaveSettings {
    /// Log output.
    pub logging: LoggingSettings,
    /// Module runtime behavior.
    pub runtime: RuntimeSettings,
    /// Mixin instance cache maintenance.
    pub cache: CacheSettings,
}

impl WeaveSettings {
    /// Check values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.logging.level.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "logging.level must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Logging section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive passed to the subscriber.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: LogFormat::Compact,
        }
    }
}

/// Module runtime section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Enable each module as soon as it registers, instead of waiting for an
    /// explicit `enable()`.
    pub enable_on_register: bool,
}

/// Cache section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Construct notifications between sweeps of dead cache entries.
    /// `0` disables periodic sweeping.
    pub sweep_interval: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            sweep_interval: 256,
        }
    }
}

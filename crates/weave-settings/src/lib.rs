//! # weave-settings
//!
//! Layered configuration for weave.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`WeaveSettings::default()`]
//! 2. **Settings file**: `$WEAVE_SETTINGS` or `~/.weave/settings.json`
//! 3. **Environment variables**: `WEAVE_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use weave_settings::get_settings;
//!
//! let settings = get_settings();
//! println!("sweep every {} constructs", settings.cache.sweep_interval);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

static SETTINGS: OnceLock<WeaveSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// Loaded on first call; falls back to compiled defaults (with a warning) if
/// loading fails.
pub fn get_settings() -> &'static WeaveSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load settings, using defaults");
            WeaveSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: WeaveSettings) -> std::result::Result<(), WeaveSettings> {
    SETTINGS.set(settings)
}

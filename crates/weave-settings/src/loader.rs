//! Settings loading.
//!
//! Loading flow (later layers override earlier ones per key):
//! 1. Compiled [`WeaveSettings::default()`]
//! 2. The JSON settings file, if present
//! 3. Environment variables with the `WEAVE_` prefix. Nested keys are
//!    separated by a double underscore, e.g. `WEAVE_CACHE__SWEEP_INTERVAL=0`.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use tracing::debug;

use crate::errors::Result;
use crate::types::WeaveSettings;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "WEAVE_";

/// Environment variable naming an explicit settings file.
pub const SETTINGS_PATH_VAR: &str = "WEAVE_SETTINGS";

/// Resolve the settings file path.
///
/// `$WEAVE_SETTINGS` wins; otherwise `~/.weave/settings.json`.
pub fn settings_path() -> PathBuf {
    if let Some(path) = std::env::var_os(SETTINGS_PATH_VAR).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".weave").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<WeaveSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with `WEAVE_*` env var overrides.
///
/// A missing file is not an error; invalid JSON is.
pub fn load_settings_from_path(path: &Path) -> Result<WeaveSettings> {
    load_settings_from(path, ENV_PREFIX)
}

/// Load settings from a specific path and env prefix.
pub fn load_settings_from(path: &Path, env_prefix: &str) -> Result<WeaveSettings> {
    if path.exists() {
        debug!(?path, "loading settings from file");
    } else {
        debug!(?path, "settings file not found, using defaults");
    }

    let settings: WeaveSettings = figment(path, env_prefix).extract()?;
    settings.validate()?;
    Ok(settings)
}

fn figment(path: &Path, env_prefix: &str) -> Figment {
    Figment::from(Serialized::defaults(WeaveSettings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed(env_prefix).split("__").ignore(&["settings"]))
}

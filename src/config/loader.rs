// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawScenarioConfig, ScenarioConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawScenarioConfig`.
///
/// This only performs TOML deserialization; it does **not** validate. Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawScenarioConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawScenarioConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it into a
/// `ScenarioConfig`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ScenarioConfig> {
    let raw_config = load_from_path(&path)?;
    let config = ScenarioConfig::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the raw config the CLI should start from.
///
/// - An explicit path must exist and parse.
/// - Without one, `Tapcheck.toml` in the working directory is used if
///   present, otherwise the built-in defaults.
pub fn load_or_default(explicit: Option<&Path>) -> Result<RawScenarioConfig> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    let fallback = default_config_path();
    if fallback.is_file() {
        debug!(path = %fallback.display(), "loading default config file");
        load_from_path(&fallback)
    } else {
        debug!("no config file found; using built-in scenario defaults");
        Ok(RawScenarioConfig::default())
    }
}

/// Default config location: `Tapcheck.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Tapcheck.toml")
}

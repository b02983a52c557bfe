// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::config::duration::parse_duration;
use crate::config::model::{RawScenarioConfig, ScenarioConfig};
use crate::errors::{HarnessError, Result};

impl TryFrom<RawScenarioConfig> for ScenarioConfig {
    type Error = HarnessError;

    fn try_from(raw: RawScenarioConfig) -> std::result::Result<Self, Self::Error> {
        validate_binaries(&raw)?;
        validate_store(&raw)?;
        validate_tapper(&raw)?;

        let store_readiness = parse_deadline("store.readiness_timeout", &raw.store.readiness_timeout)?;
        let tapper_readiness =
            parse_deadline("tapper.readiness_timeout", &raw.tapper.readiness_timeout)?;
        let api_server_readiness = parse_deadline(
            "api_server.readiness_timeout",
            &raw.api_server.readiness_timeout,
        )?;
        let scenario_timeout = parse_deadline("scenario.timeout", &raw.scenario.timeout)?;
        let teardown_grace =
            parse_deadline("scenario.teardown_grace", &raw.scenario.teardown_grace)?;

        let capture_timeout = match raw.tapper.capture_timeout.as_deref() {
            Some(s) => parse_deadline("tapper.capture_timeout", s)?,
            None => scenario_timeout,
        };

        if capture_timeout > scenario_timeout {
            warn!(
                capture_timeout = ?capture_timeout,
                scenario_timeout = ?scenario_timeout,
                "tapper.capture_timeout exceeds scenario.timeout; the scenario deadline fires first"
            );
        }

        let api_server_config_path = match raw.api_server.config_path {
            Some(p) if p.trim().is_empty() => {
                return Err(HarnessError::ConfigError(
                    "[api_server].config_path must not be empty when set".to_string(),
                ));
            }
            Some(p) => Some(PathBuf::from(p)),
            None => None,
        };

        Ok(ScenarioConfig {
            store_bin: PathBuf::from(raw.binaries.store),
            agent_bin: PathBuf::from(raw.binaries.agent),
            store_port: raw.store.port,
            store_readiness,
            pcap: PathBuf::from(raw.tapper.pcap),
            api_server_address: raw.tapper.api_server_address,
            tapper_readiness,
            capture_timeout,
            api_server_config_path,
            api_server_readiness,
            scenario_timeout,
            teardown_grace,
        })
    }
}

fn validate_binaries(cfg: &RawScenarioConfig) -> Result<()> {
    if cfg.binaries.store.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[binaries].store must not be empty".to_string(),
        ));
    }
    if cfg.binaries.agent.trim().is_empty() {
        return Err(HarnessError::ConfigError(
            "[binaries].agent must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_store(cfg: &RawScenarioConfig) -> Result<()> {
    if cfg.store.port == 0 {
        return Err(HarnessError::ConfigError(
            "[store].port must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

// The pcap path itself is checked at stage time (exists, `.cap`), where a
// failure is reported against the tapper rather than aborting the run.
fn validate_tapper(cfg: &RawScenarioConfig) -> Result<()> {
    let address = cfg.tapper.api_server_address.trim();
    if !(address.starts_with("ws://") || address.starts_with("wss://")) {
        return Err(HarnessError::ConfigError(format!(
            "[tapper].api_server_address must be a ws:// or wss:// url (got '{}')",
            cfg.tapper.api_server_address
        )));
    }
    Ok(())
}

fn parse_deadline(field: &str, value: &str) -> Result<Duration> {
    let d = parse_duration(value)
        .map_err(|e| HarnessError::ConfigError(format!("{field}: {e}")))?;
    if d.is_zero() {
        return Err(HarnessError::ConfigError(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(d)
}

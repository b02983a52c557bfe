#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tapcheck::config::ScenarioConfig;

/// Builder for `ScenarioConfig` to simplify test setup.
///
/// Starts from the built-in defaults with every deadline shortened so a
/// misbehaving fake fails a test in well under a second.
pub struct ScenarioConfigBuilder {
    config: ScenarioConfig,
}

impl ScenarioConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ScenarioConfig {
                store_readiness: Duration::from_secs(2),
                tapper_readiness: Duration::from_secs(2),
                api_server_readiness: Duration::from_secs(2),
                capture_timeout: Duration::from_secs(5),
                scenario_timeout: Duration::from_secs(15),
                teardown_grace: Duration::from_secs(2),
                ..ScenarioConfig::default()
            },
        }
    }

    pub fn with_store_bin(mut self, path: impl AsRef<Path>) -> Self {
        self.config.store_bin = path.as_ref().to_path_buf();
        self
    }

    pub fn with_agent_bin(mut self, path: impl AsRef<Path>) -> Self {
        self.config.agent_bin = path.as_ref().to_path_buf();
        self
    }

    pub fn with_pcap(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pcap = path.into();
        self
    }

    pub fn with_store_port(mut self, port: u16) -> Self {
        self.config.store_port = port;
        self
    }

    pub fn with_api_server_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.api_server_config_path = Some(path.into());
        self
    }

    /// Same deadline for all three readiness gates.
    pub fn with_readiness(mut self, deadline: Duration) -> Self {
        self.config.store_readiness = deadline;
        self.config.tapper_readiness = deadline;
        self.config.api_server_readiness = deadline;
        self
    }

    pub fn with_tapper_readiness(mut self, deadline: Duration) -> Self {
        self.config.tapper_readiness = deadline;
        self
    }

    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.config.capture_timeout = timeout;
        self
    }

    pub fn with_scenario_timeout(mut self, timeout: Duration) -> Self {
        self.config.scenario_timeout = timeout;
        self
    }

    pub fn with_teardown_grace(mut self, grace: Duration) -> Self {
        self.config.teardown_grace = grace;
        self
    }

    pub fn build(self) -> ScenarioConfig {
        self.config
    }
}

impl Default for ScenarioConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

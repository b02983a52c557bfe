// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_STORE_BIN: &str = "basenine";
pub const DEFAULT_AGENT_BIN: &str = "../agent/build/mizuagent";
pub const DEFAULT_STORE_PORT: u16 = 9099;
pub const DEFAULT_PCAP: &str = "http.cap";
pub const DEFAULT_API_SERVER_ADDRESS: &str = "ws://localhost:8899/wsTapper";

const DEFAULT_STORE_READINESS: Duration = Duration::from_secs(5);
const DEFAULT_AGENT_READINESS: Duration = Duration::from_secs(10);
const DEFAULT_SCENARIO_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_TEARDOWN_GRACE: Duration = Duration::from_secs(10);

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [binaries]
/// store = "basenine"
/// agent = "../agent/build/mizuagent"
///
/// [store]
/// port = 9099
/// readiness_timeout = "5s"
///
/// [tapper]
/// pcap = "http.cap"
/// api_server_address = "ws://localhost:8899/wsTapper"
/// readiness_timeout = "10s"
///
/// [api_server]
/// config_path = "agent-config.json"
///
/// [scenario]
/// timeout = "60s"
/// teardown_grace = "10s"
/// ```
///
/// All sections are optional; an empty file describes the stock scenario.
/// This is the unvalidated form: use [`ScenarioConfig::try_from`] (or
/// [`crate::config::load_and_validate`]) before handing it to the
/// orchestrator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScenarioConfig {
    #[serde(default)]
    pub binaries: BinariesSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub tapper: TapperSection,

    #[serde(default)]
    pub api_server: ApiServerSection,

    #[serde(default)]
    pub scenario: ScenarioSection,
}

/// `[binaries]` section: where the collaborators live.
#[derive(Debug, Clone, Deserialize)]
pub struct BinariesSection {
    #[serde(default = "default_store_bin")]
    pub store: String,

    /// One agent binary serves both the tapper and the API server, selected
    /// by flags.
    #[serde(default = "default_agent_bin")]
    pub agent: String,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_store_port")]
    pub port: u16,

    #[serde(default = "default_store_readiness")]
    pub readiness_timeout: String,
}

/// `[tapper]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TapperSection {
    /// Capture file replayed by the tapper. Must end in `.cap`.
    #[serde(default = "default_pcap")]
    pub pcap: String,

    /// Websocket address the tapper pushes captured traffic to.
    #[serde(default = "default_api_server_address")]
    pub api_server_address: String,

    #[serde(default = "default_agent_readiness")]
    pub readiness_timeout: String,

    /// Bound on waiting for the tapper to reach end of input. Falls back to
    /// `[scenario].timeout` when unset.
    #[serde(default)]
    pub capture_timeout: Option<String>,
}

/// `[api_server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiServerSection {
    /// Passed as `--config-path` when present.
    #[serde(default)]
    pub config_path: Option<String>,

    #[serde(default = "default_agent_readiness")]
    pub readiness_timeout: String,
}

/// `[scenario]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioSection {
    /// Outer deadline for all stages together.
    #[serde(default = "default_scenario_timeout")]
    pub timeout: String,

    /// How long teardown waits after the quit signal before killing.
    #[serde(default = "default_teardown_grace")]
    pub teardown_grace: String,
}

fn default_store_bin() -> String {
    DEFAULT_STORE_BIN.to_string()
}

fn default_agent_bin() -> String {
    DEFAULT_AGENT_BIN.to_string()
}

fn default_store_port() -> u16 {
    DEFAULT_STORE_PORT
}

fn default_store_readiness() -> String {
    "5s".to_string()
}

fn default_agent_readiness() -> String {
    "10s".to_string()
}

fn default_pcap() -> String {
    DEFAULT_PCAP.to_string()
}

fn default_api_server_address() -> String {
    DEFAULT_API_SERVER_ADDRESS.to_string()
}

fn default_scenario_timeout() -> String {
    "60s".to_string()
}

fn default_teardown_grace() -> String {
    "10s".to_string()
}

impl Default for BinariesSection {
    fn default() -> Self {
        Self {
            store: default_store_bin(),
            agent: default_agent_bin(),
        }
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            port: default_store_port(),
            readiness_timeout: default_store_readiness(),
        }
    }
}

impl Default for TapperSection {
    fn default() -> Self {
        Self {
            pcap: default_pcap(),
            api_server_address: default_api_server_address(),
            readiness_timeout: default_agent_readiness(),
            capture_timeout: None,
        }
    }
}

impl Default for ApiServerSection {
    fn default() -> Self {
        Self {
            config_path: None,
            readiness_timeout: default_agent_readiness(),
        }
    }
}

impl Default for ScenarioSection {
    fn default() -> Self {
        Self {
            timeout: default_scenario_timeout(),
            teardown_grace: default_teardown_grace(),
        }
    }
}

/// Validated scenario configuration handed to the orchestrator.
///
/// Built from [`RawScenarioConfig`] via `TryFrom`; every duration is parsed
/// and every field has passed the checks in `validate.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    pub store_bin: PathBuf,
    pub agent_bin: PathBuf,

    pub store_port: u16,
    pub store_readiness: Duration,

    pub pcap: PathBuf,
    pub api_server_address: String,
    pub tapper_readiness: Duration,
    pub capture_timeout: Duration,

    pub api_server_config_path: Option<PathBuf>,
    pub api_server_readiness: Duration,

    pub scenario_timeout: Duration,
    pub teardown_grace: Duration,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            store_bin: PathBuf::from(DEFAULT_STORE_BIN),
            agent_bin: PathBuf::from(DEFAULT_AGENT_BIN),
            store_port: DEFAULT_STORE_PORT,
            store_readiness: DEFAULT_STORE_READINESS,
            pcap: PathBuf::from(DEFAULT_PCAP),
            api_server_address: DEFAULT_API_SERVER_ADDRESS.to_string(),
            tapper_readiness: DEFAULT_AGENT_READINESS,
            capture_timeout: DEFAULT_SCENARIO_TIMEOUT,
            api_server_config_path: None,
            api_server_readiness: DEFAULT_AGENT_READINESS,
            scenario_timeout: DEFAULT_SCENARIO_TIMEOUT,
            teardown_grace: DEFAULT_TEARDOWN_GRACE,
        }
    }
}

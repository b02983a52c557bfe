// src/scenario/invocation.rs

//! Command lines and readiness markers for each collaborator.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::ScenarioConfig;
use crate::output::ReadinessMarker;
use crate::process::ProcessSpec;
use crate::scenario::Collaborator;

/// Both agent modes end their first output with this.
pub const AGENT_READY_MARKER: &str = "Initializing";

static LISTENING_ON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Listening on :(\d+)").expect("listening-address regex is valid")
});

/// `<store> -port <P>`
pub fn store_spec(cfg: &ScenarioConfig) -> ProcessSpec {
    ProcessSpec::new(
        Collaborator::Store.as_str(),
        &cfg.store_bin,
        cfg.store_readiness,
    )
    .arg("-port")
    .arg(cfg.store_port.to_string())
    .with_teardown_grace(cfg.teardown_grace)
}

/// `<agent> -r <pcap> --tap --api-server-address <ws-url>`
pub fn tapper_spec(cfg: &ScenarioConfig) -> ProcessSpec {
    ProcessSpec::new(
        Collaborator::Tapper.as_str(),
        &cfg.agent_bin,
        cfg.tapper_readiness,
    )
    .arg("-r")
    .arg(cfg.pcap.as_os_str())
    .arg("--tap")
    .arg("--api-server-address")
    .arg(&cfg.api_server_address)
    .with_teardown_grace(cfg.teardown_grace)
}

/// `<agent> --api-server [--config-path <path>]`
pub fn api_server_spec(cfg: &ScenarioConfig) -> ProcessSpec {
    let mut spec = ProcessSpec::new(
        Collaborator::ApiServer.as_str(),
        &cfg.agent_bin,
        cfg.api_server_readiness,
    )
    .arg("--api-server");

    if let Some(path) = &cfg.api_server_config_path {
        spec = spec.arg("--config-path").arg(path.as_os_str());
    }

    spec.with_teardown_grace(cfg.teardown_grace)
}

pub fn spec_for(collaborator: Collaborator, cfg: &ScenarioConfig) -> ProcessSpec {
    match collaborator {
        Collaborator::Store => store_spec(cfg),
        Collaborator::Tapper => tapper_spec(cfg),
        Collaborator::ApiServer => api_server_spec(cfg),
    }
}

pub fn store_ready_marker(port: u16) -> ReadinessMarker {
    ReadinessMarker::ends_with(format!("Listening on :{port}\n"))
}

pub fn agent_ready_marker() -> ReadinessMarker {
    ReadinessMarker::ends_with(AGENT_READY_MARKER)
}

pub fn ready_marker_for(collaborator: Collaborator, cfg: &ScenarioConfig) -> ReadinessMarker {
    match collaborator {
        Collaborator::Store => store_ready_marker(cfg.store_port),
        Collaborator::Tapper | Collaborator::ApiServer => agent_ready_marker(),
    }
}

/// Port the store says it is listening on, if its output says so.
pub fn announced_port(output: &str) -> Option<u16> {
    LISTENING_ON
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

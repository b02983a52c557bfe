#![allow(dead_code)]

pub use tapcheck_test_utils::{
    AgentBehaviour, FakeCollaborators, ScenarioConfigBuilder, StoreBehaviour, init_tracing,
    with_timeout,
};

use tapcheck::config::ScenarioConfig;

/// Config pointing every collaborator at the fakes in `fakes`.
pub fn config_for(fakes: &FakeCollaborators) -> ScenarioConfigBuilder {
    ScenarioConfigBuilder::new()
        .with_store_bin(fakes.store_bin())
        .with_agent_bin(fakes.agent_bin())
        .with_pcap(fakes.pcap())
}

pub fn healthy_config(fakes: &FakeCollaborators) -> ScenarioConfig {
    config_for(fakes).build()
}

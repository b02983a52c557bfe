// tests/scenario_fake_collaborators.rs

#![cfg(unix)]

mod common;
use crate::common::{
    AgentBehaviour, FakeCollaborators, StoreBehaviour, config_for, healthy_config, init_tracing,
    with_timeout,
};

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use tapcheck::scenario::{Collaborator, ScenarioOrchestrator, StageState};

type TestResult = Result<(), Box<dyn Error>>;

fn assert_torn_down_once(report: &tapcheck::scenario::ScenarioReport, who: &[Collaborator]) {
    for c in who {
        assert_eq!(report.teardown_count(*c), 1, "teardown count for {c}");
    }
}

#[tokio::test]
async fn healthy_collaborators_pass_and_are_torn_down_in_reverse() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::healthy()?;
    let report = with_timeout(ScenarioOrchestrator::new(healthy_config(&fakes)).run()).await;

    assert!(report.passed(), "unexpected failures:\n{report}");
    for c in Collaborator::ALL {
        assert_eq!(report.stage(c).state, StageState::Ready, "{c}");
    }

    let output = report.tapper_output().expect("tapper output captured");
    assert!(output.reached_eof());
    // The readiness chunk is part of the full capture.
    assert!(output.as_str().starts_with("tapper: Initializing"));
    assert!(output.contains("Got EOF while reading packets from file-"));

    let order: Vec<&str> = report
        .teardowns()
        .iter()
        .map(|r| r.collaborator.as_str())
        .collect();
    assert_eq!(order, vec!["api-server", "tapper", "store"]);
    assert!(report.teardowns().iter().all(|r| r.is_clean()));

    assert_eq!(fakes.launches(), vec!["store", "tapper", "api-server"]);
    // The tapper exits on its own once the replay is done.
    assert_eq!(fakes.quits(), vec!["api-server", "store"]);
    Ok(())
}

#[tokio::test]
async fn tapper_readiness_timeout_still_tears_everything_down_once() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::new(StoreBehaviour::Healthy, AgentBehaviour::SilentTapper)?;
    let cfg = config_for(&fakes)
        .with_tapper_readiness(Duration::from_millis(300))
        .build();

    let report = with_timeout(ScenarioOrchestrator::new(cfg).run()).await;

    assert!(!report.passed());
    assert_eq!(report.stage(Collaborator::Store).state, StageState::Ready);
    assert_eq!(report.stage(Collaborator::Tapper).state, StageState::TimedOut);
    // Later stages still run.
    assert_eq!(report.stage(Collaborator::ApiServer).state, StageState::Ready);

    let tapper_checks: Vec<&str> = report
        .failures_for(Collaborator::Tapper)
        .map(|f| f.check.as_str())
        .collect();
    assert_eq!(tapper_checks, vec!["readiness", "output capture"]);

    assert_torn_down_once(&report, &Collaborator::ALL);
    let mut quits = fakes.quits();
    quits.sort();
    assert_eq!(quits, vec!["api-server", "store", "tapper"]);
    Ok(())
}

#[tokio::test]
async fn missing_eof_marker_is_the_only_failure() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::new(StoreBehaviour::Healthy, AgentBehaviour::TapperMissingEof)?;
    let report = with_timeout(ScenarioOrchestrator::new(healthy_config(&fakes)).run()).await;

    assert_eq!(report.failures().len(), 1, "{report}");
    let failure = &report.failures()[0];
    assert_eq!(failure.collaborator, Some(Collaborator::Tapper));
    assert_eq!(failure.check, "output marker");
    assert_eq!(
        failure.expected,
        format!(
            "Got EOF while reading packets from file-{}",
            fakes.pcap().display()
        )
    );
    assert!(failure.actual.contains("Start reading packets from file-"));
    Ok(())
}

#[tokio::test]
async fn missing_capture_file_skips_the_tapper_launch() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::healthy()?;
    let cfg = config_for(&fakes)
        .with_pcap(fakes.dir().join("nope.cap"))
        .build();

    let report = with_timeout(ScenarioOrchestrator::new(cfg).run()).await;

    assert_eq!(report.stage(Collaborator::Tapper).state, StageState::Failed);
    let precondition = report
        .failures_for(Collaborator::Tapper)
        .find(|f| f.check == "precondition")
        .expect("precondition failure recorded");
    assert!(precondition.actual.contains("does not exist"));

    assert_eq!(fakes.launches(), vec!["store", "api-server"]);
    assert_eq!(report.teardown_count(Collaborator::Tapper), 0);
    assert_torn_down_once(&report, &[Collaborator::Store, Collaborator::ApiServer]);
    Ok(())
}

#[tokio::test]
async fn empty_capture_path_skips_the_tapper_launch() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::healthy()?;
    let cfg = config_for(&fakes).with_pcap("").build();

    let report = with_timeout(ScenarioOrchestrator::new(cfg).run()).await;

    assert_eq!(report.stage(Collaborator::Tapper).state, StageState::Failed);
    assert!(
        report
            .failures_for(Collaborator::Tapper)
            .any(|f| f.check == "precondition" && f.actual.contains("empty"))
    );
    assert_eq!(fakes.launches(), vec!["store", "api-server"]);
    assert_eq!(report.teardown_count(Collaborator::Tapper), 0);
    Ok(())
}

#[tokio::test]
async fn capture_without_cap_extension_skips_the_tapper_launch() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::healthy()?;
    let pcapng = fakes.dir().join("http.pcapng");
    std::fs::copy(fakes.pcap(), &pcapng)?;
    let cfg = config_for(&fakes).with_pcap(pcapng).build();

    let report = with_timeout(ScenarioOrchestrator::new(cfg).run()).await;

    assert_eq!(report.stage(Collaborator::Tapper).state, StageState::Failed);
    assert!(
        report
            .failures_for(Collaborator::Tapper)
            .any(|f| f.check == "precondition" && f.actual.contains(".cap"))
    );
    assert_eq!(fakes.launches(), vec!["store", "api-server"]);
    assert_eq!(report.teardown_count(Collaborator::Tapper), 0);
    Ok(())
}

#[tokio::test]
async fn store_on_the_wrong_port_is_a_readiness_mismatch() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::new(StoreBehaviour::WrongPort(19100), AgentBehaviour::Healthy)?;
    let cfg = config_for(&fakes).with_store_port(19099).build();

    let report = with_timeout(ScenarioOrchestrator::new(cfg).run()).await;

    assert_eq!(report.stage(Collaborator::Store).state, StageState::Mismatched);
    let failure = report
        .failures_for(Collaborator::Store)
        .next()
        .expect("store failure recorded");
    assert_eq!(failure.expected, "Listening on :19099\n");
    assert!(failure.actual.ends_with("Listening on :19100\n"));

    // The store's handle is still usable, so the rest of the run proceeds.
    assert_eq!(report.stage(Collaborator::Tapper).state, StageState::Ready);
    assert_eq!(report.failures().len(), 1, "{report}");
    assert_torn_down_once(&report, &Collaborator::ALL);
    Ok(())
}

#[tokio::test]
async fn stalled_tapper_hits_the_capture_timeout() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::new(StoreBehaviour::Healthy, AgentBehaviour::StalledTapper)?;
    let cfg = config_for(&fakes)
        .with_capture_timeout(Duration::from_millis(500))
        .build();

    let report = with_timeout(ScenarioOrchestrator::new(cfg).run()).await;

    let checks: Vec<&str> = report
        .failures_for(Collaborator::Tapper)
        .map(|f| f.check.as_str())
        .collect();
    assert_eq!(checks, vec!["output capture"]);
    assert!(report.tapper_output().is_none());
    assert_torn_down_once(&report, &Collaborator::ALL);
    assert!(fakes.quits().contains(&"tapper".to_string()));
    Ok(())
}

#[tokio::test]
async fn scenario_deadline_records_a_failure_and_tears_down() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::new(StoreBehaviour::Healthy, AgentBehaviour::StalledTapper)?;
    let cfg = config_for(&fakes)
        .with_capture_timeout(Duration::from_secs(10))
        .with_scenario_timeout(Duration::from_secs(1))
        .build();

    let report = with_timeout(ScenarioOrchestrator::new(cfg).run()).await;

    let deadline = report
        .failures()
        .iter()
        .find(|f| f.collaborator.is_none())
        .expect("scenario-wide failure recorded");
    assert_eq!(deadline.check, "scenario deadline");
    assert_torn_down_once(&report, &Collaborator::ALL);
    Ok(())
}

#[tokio::test]
async fn shutdown_request_abandons_stages_but_not_teardown() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::new(StoreBehaviour::Healthy, AgentBehaviour::StalledTapper)?;
    let cfg = config_for(&fakes)
        .with_capture_timeout(Duration::from_secs(10))
        .build();

    let shutdown = tokio::time::sleep(Duration::from_millis(800));
    let report = with_timeout(ScenarioOrchestrator::new(cfg).run_until(shutdown)).await;

    assert!(report.failures().iter().any(|f| f.check == "shutdown"));
    assert_torn_down_once(&report, &Collaborator::ALL);
    Ok(())
}

#[tokio::test]
async fn missing_agent_binary_fails_launches_but_store_is_reclaimed() -> TestResult {
    init_tracing();
    let fakes = FakeCollaborators::healthy()?;
    let cfg = config_for(&fakes)
        .with_agent_bin(PathBuf::from("/nonexistent/agent"))
        .build();

    let report = with_timeout(ScenarioOrchestrator::new(cfg).run()).await;

    for c in [Collaborator::Tapper, Collaborator::ApiServer] {
        assert_eq!(report.stage(c).state, StageState::Failed, "{c}");
        assert!(report.failures_for(c).any(|f| f.check == "launch"));
        assert_eq!(report.teardown_count(c), 0);
    }
    assert_torn_down_once(&report, &[Collaborator::Store]);
    assert_eq!(fakes.quits(), vec!["store"]);
    Ok(())
}

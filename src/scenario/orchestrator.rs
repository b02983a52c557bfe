// src/scenario/orchestrator.rs

use std::future::Future;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::ScenarioConfig;
use crate::config::duration::format_duration;
use crate::errors::HarnessError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::output::{CapturedOutput, OutputDrain, ReadinessGate};
use crate::process::{ManagedProcess, ProcessScope};
use crate::scenario::expectation::ScenarioExpectation;
use crate::scenario::report::{ScenarioReport, StageState};
use crate::scenario::{Collaborator, invocation, preconditions};

/// Why the stage sequence stopped early.
enum Halt {
    Deadline,
    Shutdown,
}

/// Drives one run of the tap-pipeline scenario.
///
/// All settings come from the [`ScenarioConfig`] given at construction, so
/// several orchestrators with different ports and files can run side by
/// side.
#[derive(Debug, Clone)]
pub struct ScenarioOrchestrator {
    config: ScenarioConfig,
    fs: Arc<dyn FileSystem>,
}

impl ScenarioOrchestrator {
    pub fn new(config: ScenarioConfig) -> Self {
        Self::with_file_system(config, Arc::new(RealFileSystem))
    }

    /// Use a custom filesystem for the local precondition checks.
    pub fn with_file_system(config: ScenarioConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self { config, fs }
    }

    /// Run every stage, then tear down whatever was launched.
    pub async fn run(&self) -> ScenarioReport {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Like [`run`](Self::run), but stop starting new work as soon as
    /// `shutdown` resolves (e.g. on Ctrl-C). Teardown still runs.
    pub async fn run_until<S>(&self, shutdown: S) -> ScenarioReport
    where
        S: Future<Output = ()>,
    {
        info!("scenario started");
        let mut report = ScenarioReport::new();
        let mut scope = ProcessScope::new();

        let halted = tokio::select! {
            finished = timeout(
                self.config.scenario_timeout,
                self.run_stages(&mut scope, &mut report),
            ) => finished.err().map(|_| Halt::Deadline),
            () = shutdown => Some(Halt::Shutdown),
        };

        match halted {
            Some(Halt::Deadline) => {
                error!(
                    timeout = ?self.config.scenario_timeout,
                    "scenario deadline exceeded; tearing down"
                );
                let deadline = format_duration(self.config.scenario_timeout);
                report.record_failure(
                    None,
                    "scenario deadline",
                    format!("all stages finish within {deadline}"),
                    "deadline exceeded",
                );
            }
            Some(Halt::Shutdown) => {
                warn!("shutdown requested; abandoning remaining stages");
                report.record_failure(None, "shutdown", "scenario runs to completion", "interrupted");
            }
            None => {}
        }

        let teardowns = scope.teardown_all().await;
        report.record_teardowns(teardowns);

        info!(passed = report.passed(), failures = report.failures().len(), "scenario finished");
        report
    }

    async fn run_stages(&self, scope: &mut ProcessScope, report: &mut ScenarioReport) {
        self.store_stage(scope, report).await;
        let capture = self.tapper_stage(scope, report).await;
        self.api_server_stage(scope, report).await;
        self.capture_stage(capture, report).await;
    }

    async fn store_stage(&self, scope: &mut ProcessScope, report: &mut ScenarioReport) {
        let Some(drain) = self.start_collaborator(Collaborator::Store, scope, report).await else {
            return;
        };

        if let Some(first) = &report.stage(Collaborator::Store).first_output {
            match invocation::announced_port(first) {
                Some(port) if port == self.config.store_port => {
                    info!(collaborator = %Collaborator::Store, port, "store listening");
                }
                Some(port) => {
                    warn!(
                        collaborator = %Collaborator::Store,
                        announced = port,
                        expected = self.config.store_port,
                        "store announced a different port"
                    );
                }
                None => debug!(collaborator = %Collaborator::Store, "no port in store announcement"),
            }
        }

        // Dropping the drain keeps the stream flowing into the void.
        drop(drain);
    }

    /// Returns the pending full capture of the tapper's output, if the tapper
    /// came up.
    async fn tapper_stage(
        &self,
        scope: &mut ProcessScope,
        report: &mut ScenarioReport,
    ) -> Option<oneshot::Receiver<CapturedOutput>> {
        if let Err(e) = preconditions::validate_artifact(self.fs.as_ref(), &self.config.pcap) {
            error!(collaborator = %Collaborator::Tapper, error = %e, "tapper precondition failed");
            report.set_state(Collaborator::Tapper, StageState::Failed);
            report.record_failure(
                Some(Collaborator::Tapper),
                "precondition",
                "an existing .cap file",
                e.to_string(),
            );
            return None;
        }

        let drain = self.start_collaborator(Collaborator::Tapper, scope, report).await?;
        Some(spawn_full_capture(drain))
    }

    async fn api_server_stage(&self, scope: &mut ProcessScope, report: &mut ScenarioReport) {
        // Only the readiness announcement matters here.
        let _ = self
            .start_collaborator(Collaborator::ApiServer, scope, report)
            .await;
    }

    async fn capture_stage(
        &self,
        pending: Option<oneshot::Receiver<CapturedOutput>>,
        report: &mut ScenarioReport,
    ) {
        let expectation =
            ScenarioExpectation::tapper(&self.config.api_server_address, &self.config.pcap);

        let Some(rx) = pending else {
            report.record_failure(
                Some(Collaborator::Tapper),
                "output capture",
                expectation.markers().join("\n"),
                "no tapper output to capture",
            );
            return;
        };

        let captured = match timeout(self.config.capture_timeout, rx).await {
            Ok(Ok(captured)) => captured,
            Ok(Err(_)) => {
                error!(collaborator = %Collaborator::Tapper, "capture task ended without a result");
                report.record_failure(
                    Some(Collaborator::Tapper),
                    "output capture",
                    "tapper output until end of input",
                    "capture task ended without a result",
                );
                return;
            }
            Err(_) => {
                error!(
                    collaborator = %Collaborator::Tapper,
                    timeout = ?self.config.capture_timeout,
                    "tapper did not reach end of input in time"
                );
                report.record_failure(
                    Some(Collaborator::Tapper),
                    "output capture",
                    format!(
                        "tapper exits within {}",
                        format_duration(self.config.capture_timeout)
                    ),
                    "tapper still running",
                );
                return;
            }
        };

        info!(collaborator = %Collaborator::Tapper, "tapper output: {}", captured);

        for marker in expectation.missing(&captured) {
            error!(collaborator = %Collaborator::Tapper, marker, "failed to validate tapper output");
            report.record_failure(
                Some(Collaborator::Tapper),
                "output marker",
                marker,
                captured.as_str(),
            );
        }

        report.record_tapper_output(captured);
    }

    /// Launch `collaborator`, hand it to `scope`, and apply its readiness
    /// gate.
    ///
    /// Returns the live drain when the collaborator produced output; the
    /// stage state and any failure are recorded in `report` either way.
    async fn start_collaborator(
        &self,
        collaborator: Collaborator,
        scope: &mut ProcessScope,
        report: &mut ScenarioReport,
    ) -> Option<OutputDrain> {
        let spec = invocation::spec_for(collaborator, &self.config);
        let marker = invocation::ready_marker_for(collaborator, &self.config);
        let gate = ReadinessGate::new(collaborator.as_str(), spec.readiness_deadline());
        let command = spec.command_line();

        let mut process = match ManagedProcess::launch(spec) {
            Ok(p) => p,
            Err(e) => {
                error!(%collaborator, error = %e, "failed to start collaborator");
                report.set_state(collaborator, StageState::Failed);
                report.record_failure(Some(collaborator), "launch", command, e.to_string());
                return None;
            }
        };
        let diagnostics = process.take_diagnostics();
        scope.adopt(process);
        report.set_state(collaborator, StageState::Started);

        let Some(stream) = diagnostics else {
            report.set_state(collaborator, StageState::Failed);
            report.record_failure(
                Some(collaborator),
                "diagnostic stream",
                "piped stderr",
                "stream already taken",
            );
            return None;
        };

        let (drain, first) = gate.drain_and_await(stream).await;
        match first {
            Ok(first) => {
                report.record_first_output(collaborator, &first);
                if marker.matches(&first) {
                    info!(%collaborator, "collaborator ready");
                    report.set_state(collaborator, StageState::Ready);
                } else {
                    error!(
                        %collaborator,
                        expected = %marker,
                        actual = ?first,
                        "collaborator is not running as expected"
                    );
                    report.set_state(collaborator, StageState::Mismatched);
                    report.record_failure(
                        Some(collaborator),
                        "readiness",
                        marker.expected(),
                        first,
                    );
                }
                Some(drain)
            }
            Err(e) => {
                let state = match e {
                    HarnessError::Timeout { .. } => StageState::TimedOut,
                    _ => StageState::Failed,
                };
                error!(%collaborator, error = %e, "collaborator did not become ready");
                report.set_state(collaborator, state);
                report.record_failure(
                    Some(collaborator),
                    "readiness",
                    marker.to_string(),
                    e.to_string(),
                );
                None
            }
        }
    }
}

/// Capture everything left on the tapper's stream on its own task, and
/// signal the one waiter when the stream ends.
fn spawn_full_capture(drain: OutputDrain) -> oneshot::Receiver<CapturedOutput> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let captured = drain.await_full_capture().await;
        if tx.send(captured).is_err() {
            debug!("tapper capture finished after the scenario stopped waiting");
        }
    });
    rx
}

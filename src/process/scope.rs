// src/process/scope.rs

use std::fmt;
use std::process::ExitStatus;

use tracing::{info, warn};

use crate::errors::TeardownError;
use crate::process::managed::ManagedProcess;

/// Outcome of tearing down one collaborator.
#[derive(Debug)]
pub struct TeardownRecord {
    pub collaborator: String,
    /// OS pid recorded at launch.
    pub pid: Option<u32>,
    pub outcome: Result<ExitStatus, TeardownError>,
}

impl TeardownRecord {
    pub fn is_clean(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for TeardownRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(status) => write!(f, "{}{}: {}", self.collaborator, pid_note(self.pid), status),
            Err(e) => write!(f, "{e}{}", pid_note(self.pid)),
        }
    }
}

fn pid_note(pid: Option<u32>) -> String {
    pid.map(|p| format!(" (pid {p})")).unwrap_or_default()
}

/// Owner of every collaborator launched during a run.
///
/// Processes are adopted right after launch, before any readiness check can
/// fail, and [`teardown_all`](Self::teardown_all) tears each one down exactly
/// once in reverse launch order.
#[derive(Debug, Default)]
pub struct ProcessScope {
    processes: Vec<ManagedProcess>,
}

impl ProcessScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adopt(&mut self, process: ManagedProcess) {
        self.processes.push(process);
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Names of adopted processes, in launch order.
    pub fn names(&self) -> Vec<&str> {
        self.processes.iter().map(|p| p.name()).collect()
    }

    /// Tear down every adopted process, newest first.
    ///
    /// Failures are logged and returned, never propagated; the scope is empty
    /// afterwards, so a second call is a no-op.
    pub async fn teardown_all(&mut self) -> Vec<TeardownRecord> {
        let mut records = Vec::with_capacity(self.processes.len());

        while let Some(mut process) = self.processes.pop() {
            let outcome = process.teardown().await;
            match &outcome {
                Ok(status) => {
                    info!(collaborator = %process.name(), %status, "teardown complete");
                }
                Err(e) => {
                    warn!(collaborator = %process.name(), error = %e, "failed to cleanup collaborator");
                }
            }
            records.push(TeardownRecord {
                collaborator: process.name().to_string(),
                pid: process.pid(),
                outcome,
            });
        }

        records
    }
}

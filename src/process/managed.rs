// src/process/managed.rs

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStderr, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::errors::{HarnessError, Result, TeardownError};
use crate::process::signal::{self, QuitRequest};
use crate::process::spec::ProcessSpec;

/// One running collaborator.
///
/// Launching and starting are the same step. The child handle is private:
/// [`teardown`](Self::teardown) is the only code that signals or waits on
/// it, and it does so at most once.
#[derive(Debug)]
pub struct ManagedProcess {
    spec: ProcessSpec,
    child: Option<Child>,
    diagnostics: Option<ChildStderr>,
    pid: Option<u32>,
}

impl ManagedProcess {
    /// Start the collaborator described by `spec`.
    ///
    /// stdin and stdout are detached; stderr is piped and becomes the
    /// diagnostic stream. Must be called from within a Tokio runtime.
    pub fn launch(spec: ProcessSpec) -> Result<Self> {
        info!(collaborator = %spec.name(), "running command: {}", spec);

        let mut cmd = Command::new(spec.program());
        cmd.args(spec.arg_list())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| HarnessError::Launch {
            collaborator: spec.name().to_string(),
            command: spec.command_line(),
            source,
        })?;

        let Some(diagnostics) = child.stderr.take() else {
            // Not reachable with Stdio::piped(), but never leave a child behind.
            let _ = child.start_kill();
            return Err(HarnessError::Launch {
                collaborator: spec.name().to_string(),
                command: spec.command_line(),
                source: std::io::Error::other("diagnostic stream was not piped"),
            });
        };

        let pid = child.id();
        debug!(collaborator = %spec.name(), pid, "collaborator started");

        Ok(Self {
            spec,
            child: Some(child),
            diagnostics: Some(diagnostics),
            pid,
        })
    }

    pub fn name(&self) -> &str {
        self.spec.name()
    }

    /// OS pid recorded at launch.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_torn_down(&self) -> bool {
        self.child.is_none()
    }

    /// Hand out the diagnostic stream. Returns `Some` exactly once.
    pub fn take_diagnostics(&mut self) -> Option<ChildStderr> {
        self.diagnostics.take()
    }

    /// Ask the collaborator to quit, then wait for it to exit.
    ///
    /// - A signal that cannot be delivered is logged and does not stop the
    ///   wait.
    /// - The wait is bounded by the spec's teardown grace; past it the
    ///   process is killed and reaped and [`TeardownError::GraceExpired`] is
    ///   returned.
    /// - A non-success exit is [`TeardownError::AbnormalExit`].
    /// - A second call returns [`TeardownError::AlreadyTornDown`] without
    ///   touching the OS.
    pub async fn teardown(&mut self) -> std::result::Result<ExitStatus, TeardownError> {
        let name = self.spec.name().to_string();
        let Some(mut child) = self.child.take() else {
            return Err(TeardownError::AlreadyTornDown { collaborator: name });
        };

        let signal_failure = match signal::request_quit(&mut child) {
            Ok(QuitRequest::Delivered) => {
                debug!(collaborator = %name, pid = self.pid, "quit signal delivered");
                None
            }
            Ok(QuitRequest::AlreadyExited) => {
                debug!(collaborator = %name, "process already exited before teardown");
                None
            }
            Err(reason) => {
                warn!(collaborator = %name, error = %reason, "failed to deliver quit signal");
                Some(reason)
            }
        };

        let grace = self.spec.teardown_grace();
        let status = match timeout(grace, child.wait()).await {
            Ok(waited) => waited.map_err(|source| TeardownError::Wait {
                collaborator: name.clone(),
                source,
            })?,
            Err(_elapsed) => {
                warn!(
                    collaborator = %name,
                    grace = ?grace,
                    "process still running after quit signal; killing"
                );
                child.kill().await.map_err(|source| TeardownError::Wait {
                    collaborator: name.clone(),
                    source,
                })?;
                return Err(TeardownError::GraceExpired {
                    collaborator: name,
                    grace,
                });
            }
        };

        info!(collaborator = %name, %status, "collaborator exited");
        classify_exit(name, status, signal_failure)
    }
}

/// Turn a reaped exit status, plus any failed quit request, into the
/// teardown outcome. An abnormal exit wins but keeps the signal failure.
fn classify_exit(
    collaborator: String,
    status: ExitStatus,
    signal_failure: Option<String>,
) -> std::result::Result<ExitStatus, TeardownError> {
    if !status.success() {
        return Err(TeardownError::AbnormalExit {
            collaborator,
            status,
            signal_failure,
        });
    }
    match signal_failure {
        Some(reason) => Err(TeardownError::Signal {
            collaborator,
            reason,
        }),
        None => Ok(status),
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if self.child.is_some() {
            // kill_on_drop(true) reclaims the child; this only flags the leak.
            warn!(
                collaborator = %self.spec.name(),
                pid = self.pid,
                "managed process dropped without teardown"
            );
        }
    }
}

// src/process/signal.rs

//! Graceful-termination requests.
//!
//! On Unix this is `SIGQUIT` via `nix`; elsewhere the closest available
//! request is the runtime's kill.

use tokio::process::Child;

/// Result of asking a child to quit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitRequest {
    Delivered,
    /// The child was already reaped; there is no pid left to signal.
    AlreadyExited,
}

#[cfg(unix)]
pub fn request_quit(child: &mut Child) -> Result<QuitRequest, String> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return Ok(QuitRequest::AlreadyExited);
    };
    let raw = i32::try_from(pid).map_err(|_| format!("pid {pid} does not fit in pid_t"))?;

    signal::kill(Pid::from_raw(raw), Signal::SIGQUIT)
        .map(|()| QuitRequest::Delivered)
        .map_err(|e| format!("kill(SIGQUIT) on pid {pid} failed: {e}"))
}

#[cfg(not(unix))]
pub fn request_quit(child: &mut Child) -> Result<QuitRequest, String> {
    if child.id().is_none() {
        return Ok(QuitRequest::AlreadyExited);
    }
    child
        .start_kill()
        .map(|()| QuitRequest::Delivered)
        .map_err(|e| format!("terminate request failed: {e}"))
}

// src/output/readiness.rs

use std::fmt;
use std::time::Duration;

use tokio::io::AsyncRead;
use tokio::time::timeout;
use tracing::debug;

use crate::errors::{HarnessError, Result};
use crate::output::drain::OutputDrain;

/// Deadline-bounded wait for a collaborator's first diagnostic output.
///
/// Collaborators announce liveness by writing *anything* to stderr shortly
/// after start; no output before the deadline means the collaborator failed
/// to initialise.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    collaborator: String,
    deadline: Duration,
}

impl ReadinessGate {
    pub fn new(collaborator: impl Into<String>, deadline: Duration) -> Self {
        Self {
            collaborator: collaborator.into(),
            deadline,
        }
    }

    /// Wait for the first chunk `drain` delivers.
    ///
    /// Returns the chunk as (lossy) UTF-8, [`HarnessError::Timeout`] once
    /// the deadline passes with nothing delivered, or
    /// [`HarnessError::StreamClosed`] if the stream ends silently.
    pub async fn await_first_chunk(&self, drain: &mut OutputDrain) -> Result<String> {
        match timeout(self.deadline, drain.next_chunk()).await {
            Ok(Some(chunk)) => {
                let text = String::from_utf8_lossy(&chunk).into_owned();
                debug!(
                    collaborator = %self.collaborator,
                    bytes = chunk.len(),
                    "received first diagnostic output"
                );
                Ok(text)
            }
            Ok(None) => Err(HarnessError::StreamClosed {
                collaborator: self.collaborator.clone(),
            }),
            Err(_elapsed) => Err(HarnessError::Timeout {
                collaborator: self.collaborator.clone(),
                deadline: self.deadline,
            }),
        }
    }

    /// Start draining `stream` and wait for its first chunk.
    ///
    /// The drain is returned either way so the caller can keep consuming (or
    /// drop it, which leaves the stream being discarded in the background).
    pub async fn drain_and_await<R>(&self, stream: R) -> (OutputDrain, Result<String>)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut drain = OutputDrain::spawn(self.collaborator.clone(), stream);
        let first = self.await_first_chunk(&mut drain).await;
        (drain, first)
    }
}

/// What a readiness chunk must look like.
///
/// The first chunk is only a prefix of the collaborator's output (a slow
/// single write and several fast partial writes look different), so markers
/// never compare for equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessMarker {
    suffix: String,
}

impl ReadinessMarker {
    /// Ready when the first chunk ends with `suffix`.
    pub fn ends_with(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn matches(&self, chunk: &str) -> bool {
        chunk.ends_with(self.suffix.as_str())
    }

    pub fn expected(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for ReadinessMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output ending with {:?}", self.suffix)
    }
}

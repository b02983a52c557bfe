// src/errors.rs

//! Crate-wide error types.
//!
//! `HarnessError` covers everything a stage can report. `TeardownError`
//! travels separately, inside teardown records: teardown failures are logged
//! and listed, never escalated into a failing scenario.

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("failed to launch {collaborator} ({command}): {source}")]
    Launch {
        collaborator: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{collaborator} did not output any data within {deadline:?}")]
    Timeout {
        collaborator: String,
        deadline: Duration,
    },

    #[error("{collaborator} closed its diagnostic stream before producing output")]
    StreamClosed { collaborator: String },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Reasons a teardown could not complete cleanly.
///
/// The OS process entry is reclaimed in every case except `AlreadyTornDown`,
/// where there is nothing left to reclaim.
#[derive(Error, Debug)]
pub enum TeardownError {
    #[error("{collaborator}: failed to deliver quit signal: {reason}")]
    Signal { collaborator: String, reason: String },

    #[error("{collaborator}: failed to wait for exit: {source}")]
    Wait {
        collaborator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{collaborator}: exited abnormally ({status}){note}", note = quit_note(.signal_failure))]
    AbnormalExit {
        collaborator: String,
        status: ExitStatus,
        /// Set when the quit signal could not be delivered either.
        signal_failure: Option<String>,
    },

    #[error("{collaborator}: still running {grace:?} after quit signal; killed")]
    GraceExpired {
        collaborator: String,
        grace: Duration,
    },

    #[error("{collaborator}: teardown already performed")]
    AlreadyTornDown { collaborator: String },
}

impl TeardownError {
    /// Benign errors describe a process that was already gone; they carry no
    /// signal about collaborator health.
    pub fn is_benign(&self) -> bool {
        matches!(self, TeardownError::AlreadyTornDown { .. })
    }
}

fn quit_note(signal_failure: &Option<String>) -> String {
    match signal_failure {
        Some(reason) => format!("; quit signal also failed: {reason}"),
        None => String::new(),
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HarnessError>;

// src/scenario/mod.rs

//! The tap-pipeline scenario.
//!
//! Three collaborators are started in order, each behind a readiness gate:
//!
//! 1. the stream store, announcing `Listening on :<port>`;
//! 2. the agent in tap mode, replaying a `.cap` file towards the API server;
//! 3. the agent in API-server mode.
//!
//! The tapper's whole diagnostic output is then checked for the markers that
//! prove it read the capture file end to end, and every launched process is
//! torn down.
//!
//! The pure pieces (argument vectors, preconditions, expectations, the
//! report) live in their own modules; [`orchestrator`] is the async shell
//! that drives processes.

use std::fmt;

pub mod expectation;
pub mod invocation;
pub mod orchestrator;
pub mod preconditions;
pub mod report;

pub use expectation::ScenarioExpectation;
pub use orchestrator::ScenarioOrchestrator;
pub use report::{Failure, ScenarioReport, StageReport, StageState};

/// The external executables a scenario drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collaborator {
    Store,
    Tapper,
    ApiServer,
}

impl Collaborator {
    /// Launch order.
    pub const ALL: [Collaborator; 3] = [
        Collaborator::Store,
        Collaborator::Tapper,
        Collaborator::ApiServer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collaborator::Store => "store",
            Collaborator::Tapper => "tapper",
            Collaborator::ApiServer => "api-server",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

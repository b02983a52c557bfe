// src/scenario/report.rs

use std::collections::BTreeMap;
use std::fmt;

use crate::output::CapturedOutput;
use crate::process::TeardownRecord;
use crate::scenario::Collaborator;

/// Where a stage got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    NotStarted,
    /// Launched, readiness not yet decided.
    Started,
    /// Produced output matching its readiness marker.
    Ready,
    /// Produced output, but not the expected marker.
    Mismatched,
    TimedOut,
    /// Precondition, launch or stream failure.
    Failed,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageState::NotStarted => "not started",
            StageState::Started => "started",
            StageState::Ready => "ready",
            StageState::Mismatched => "unexpected output",
            StageState::TimedOut => "timed out",
            StageState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub state: StageState,
    pub first_output: Option<String>,
}

impl Default for StageReport {
    fn default() -> Self {
        Self {
            state: StageState::NotStarted,
            first_output: None,
        }
    }
}

/// One failed check, with what was expected and what was seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// `None` for scenario-wide failures such as the outer deadline.
    pub collaborator: Option<Collaborator>,
    pub check: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = self
            .collaborator
            .map_or("scenario", |c| c.as_str());
        write!(
            f,
            "{who}: {} - expected: {:?}, actual: {:?}",
            self.check, self.expected, self.actual
        )
    }
}

/// Everything a scenario run observed.
///
/// Failures are collected rather than raised so a run reports every broken
/// check, not just the first. Teardown records are informational: they never
/// make a run fail.
#[derive(Debug, Default)]
pub struct ScenarioReport {
    stages: BTreeMap<Collaborator, StageReport>,
    failures: Vec<Failure>,
    teardowns: Vec<TeardownRecord>,
    tapper_output: Option<CapturedOutput>,
}

impl ScenarioReport {
    pub fn new() -> Self {
        let stages = Collaborator::ALL
            .into_iter()
            .map(|c| (c, StageReport::default()))
            .collect();
        Self {
            stages,
            ..Self::default()
        }
    }

    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn failures_for(&self, collaborator: Collaborator) -> impl Iterator<Item = &Failure> {
        self.failures
            .iter()
            .filter(move |f| f.collaborator == Some(collaborator))
    }

    pub fn stage(&self, collaborator: Collaborator) -> &StageReport {
        // `new()` seeds every collaborator; the fallback covers `default()`.
        static NOT_STARTED: StageReport = StageReport {
            state: StageState::NotStarted,
            first_output: None,
        };
        self.stages.get(&collaborator).unwrap_or(&NOT_STARTED)
    }

    pub fn teardowns(&self) -> &[TeardownRecord] {
        &self.teardowns
    }

    /// How many teardown attempts were recorded for `collaborator`.
    pub fn teardown_count(&self, collaborator: Collaborator) -> usize {
        self.teardowns
            .iter()
            .filter(|r| r.collaborator == collaborator.as_str())
            .count()
    }

    pub fn tapper_output(&self) -> Option<&CapturedOutput> {
        self.tapper_output.as_ref()
    }

    pub fn set_state(&mut self, collaborator: Collaborator, state: StageState) {
        self.stages.entry(collaborator).or_default().state = state;
    }

    pub fn record_first_output(&mut self, collaborator: Collaborator, output: &str) {
        self.stages.entry(collaborator).or_default().first_output = Some(output.to_string());
    }

    pub fn record_failure(
        &mut self,
        collaborator: Option<Collaborator>,
        check: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) {
        self.failures.push(Failure {
            collaborator,
            check: check.into(),
            expected: expected.into(),
            actual: actual.into(),
        });
    }

    pub fn record_tapper_output(&mut self, output: CapturedOutput) {
        self.tapper_output = Some(output);
    }

    pub fn record_teardowns(&mut self, records: Vec<TeardownRecord>) {
        self.teardowns.extend(records);
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "PASSED" } else { "FAILED" };
        writeln!(f, "scenario {verdict}")?;

        writeln!(f, "stages:")?;
        for (collaborator, stage) in &self.stages {
            writeln!(f, "  - {collaborator}: {}", stage.state)?;
        }

        if !self.failures.is_empty() {
            writeln!(f, "failures ({}):", self.failures.len())?;
            for failure in &self.failures {
                writeln!(f, "  - {failure}")?;
            }
        }

        if !self.teardowns.is_empty() {
            writeln!(f, "teardown:")?;
            for record in &self.teardowns {
                let tag = if record.is_clean() { "ok" } else { "warn" };
                writeln!(f, "  - [{tag}] {record}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_report_has_every_stage_not_started() {
        let report = ScenarioReport::new();
        for c in Collaborator::ALL {
            assert_eq!(report.stage(c).state, StageState::NotStarted);
        }
        assert!(report.passed());
        assert_eq!(report.teardown_count(Collaborator::Store), 0);
    }

    #[test]
    fn failures_are_all_kept_and_rendered() {
        let mut report = ScenarioReport::new();
        report.set_state(Collaborator::Store, StageState::Mismatched);
        report.record_failure(
            Some(Collaborator::Store),
            "readiness",
            "Listening on :9099\n",
            "Listening on :9100\n",
        );
        report.record_failure(None, "scenario deadline", "finish within 60s", "still running");

        assert!(!report.passed());
        assert_eq!(report.failures().len(), 2);
        assert_eq!(report.failures_for(Collaborator::Store).count(), 1);

        let rendered = report.to_string();
        assert!(rendered.starts_with("scenario FAILED"));
        assert!(rendered.contains("store: unexpected output"));
        assert!(rendered.contains(r#"expected: "Listening on :9099\n", actual: "Listening on :9100\n""#));
        assert!(rendered.contains("scenario: scenario deadline"));
    }
}

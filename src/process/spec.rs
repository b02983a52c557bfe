// src/process/spec.rs

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Grace period teardown allows after the quit signal unless overridden.
pub const DEFAULT_TEARDOWN_GRACE: Duration = Duration::from_secs(10);

/// How to launch one collaborator.
///
/// Built once with the consuming `with_*`/`arg` methods and not changed
/// afterwards; `ManagedProcess` only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    name: String,
    program: PathBuf,
    args: Vec<OsString>,
    readiness_deadline: Duration,
    teardown_grace: Duration,
}

impl ProcessSpec {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<PathBuf>,
        readiness_deadline: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            readiness_deadline,
            teardown_grace: DEFAULT_TEARDOWN_GRACE,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_teardown_grace(mut self, grace: Duration) -> Self {
        self.teardown_grace = grace;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arg_list(&self) -> &[OsString] {
        &self.args
    }

    pub fn readiness_deadline(&self) -> Duration {
        self.readiness_deadline
    }

    pub fn teardown_grace(&self) -> Duration {
        self.teardown_grace
    }

    /// Space-separated command line, for logs only (no shell quoting).
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_lists_program_then_args() {
        let spec = ProcessSpec::new("store", "basenine", Duration::from_secs(5))
            .arg("-port")
            .arg("9099");

        assert_eq!(spec.command_line(), "basenine -port 9099");
        assert_eq!(spec.to_string(), spec.command_line());
        assert_eq!(spec.arg_list().len(), 2);
    }

    #[test]
    fn builder_methods_leave_other_fields_alone() {
        let spec = ProcessSpec::new("tapper", "/opt/agent", Duration::from_secs(10))
            .args(["-r", "http.cap"])
            .with_teardown_grace(Duration::from_millis(500));

        assert_eq!(spec.name(), "tapper");
        assert_eq!(spec.program(), Path::new("/opt/agent"));
        assert_eq!(spec.readiness_deadline(), Duration::from_secs(10));
        assert_eq!(spec.teardown_grace(), Duration::from_millis(500));
        assert_eq!(spec.command_line(), "/opt/agent -r http.cap");
    }

    #[test]
    fn default_grace_applies_until_overridden() {
        let spec = ProcessSpec::new("api-server", "agent", Duration::from_secs(10));
        assert_eq!(spec.teardown_grace(), DEFAULT_TEARDOWN_GRACE);
    }
}

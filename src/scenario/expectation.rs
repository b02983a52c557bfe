// src/scenario/expectation.rs

use std::path::Path;

use crate::output::CapturedOutput;

/// Substrings that must all appear in a collaborator's captured output.
///
/// Each marker is checked on its own; the order they appear in is not
/// enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioExpectation {
    markers: Vec<String>,
}

impl ScenarioExpectation {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// What a tapper replaying `artifact` towards `ws_address` must log.
    ///
    /// The artifact is referenced exactly as it was passed on the tapper's
    /// command line, since that is what the tapper echoes back.
    pub fn tapper(ws_address: &str, artifact: &Path) -> Self {
        let artifact = artifact.display();
        Self::new([
            format!("Starting tapper, websocket address: {ws_address}"),
            format!("Start reading packets from file-{artifact}"),
            format!("Got EOF while reading packets from file-{artifact}"),
        ])
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Markers not found in `output`, in declaration order.
    pub fn missing<'a>(&'a self, output: &CapturedOutput) -> Vec<&'a str> {
        self.markers
            .iter()
            .filter(|m| !output.contains(m))
            .map(String::as_str)
            .collect()
    }

    pub fn is_met_by(&self, output: &CapturedOutput) -> bool {
        self.missing(output).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::output::drain::DrainEnd;

    fn captured(text: &str) -> CapturedOutput {
        CapturedOutput::new(text.as_bytes().to_vec(), DrainEnd::Eof)
    }

    #[test]
    fn tapper_markers_reference_address_and_artifact() {
        let exp = ScenarioExpectation::tapper("ws://localhost:8899/wsTapper", Path::new("http.cap"));
        assert_eq!(
            exp.markers(),
            [
                "Starting tapper, websocket address: ws://localhost:8899/wsTapper",
                "Start reading packets from file-http.cap",
                "Got EOF while reading packets from file-http.cap",
            ]
        );
    }

    #[test]
    fn markers_are_checked_independently_of_order() {
        let exp = ScenarioExpectation::new(["first", "second"]);
        assert!(exp.is_met_by(&captured("second ... first")));
    }

    #[test]
    fn every_missing_marker_is_listed() {
        let exp = ScenarioExpectation::tapper("ws://localhost:8899/wsTapper", Path::new("http.cap"));
        let output = captured(
            "Initializing\nStarting tapper, websocket address: ws://localhost:8899/wsTapper\n",
        );

        assert_eq!(
            exp.missing(&output),
            vec![
                "Start reading packets from file-http.cap",
                "Got EOF while reading packets from file-http.cap",
            ]
        );
        assert!(!exp.is_met_by(&output));
    }
}

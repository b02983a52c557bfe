// src/scenario/preconditions.rs

//! Local checks that run before a launch which could only fail.

use std::path::Path;

use tracing::warn;

use crate::errors::{HarnessError, Result};
use crate::fs::FileSystem;

/// Extension every replay artifact must carry.
pub const CAPTURE_EXTENSION: &str = "cap";

/// Check that `path` names an existing `.cap` capture file.
///
/// An empty file passes with a warning: the tapper will reach EOF at once,
/// which the marker checks still cover.
pub fn validate_artifact(fs: &dyn FileSystem, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(HarnessError::Precondition(
            "tapper PCAP file path is empty".to_string(),
        ));
    }

    if !fs.exists(path) {
        return Err(HarnessError::Precondition(format!(
            "tapper PCAP file does not exist: {}",
            path.display()
        )));
    }

    if path.extension().and_then(|e| e.to_str()) != Some(CAPTURE_EXTENSION) {
        return Err(HarnessError::Precondition(format!(
            "tapper PCAP file is not a valid .{CAPTURE_EXTENSION} file: {}",
            path.display()
        )));
    }

    if !fs.is_file(path) {
        return Err(HarnessError::Precondition(format!(
            "tapper PCAP path is not a regular file: {}",
            path.display()
        )));
    }

    if let Ok(0) = fs.file_len(path) {
        warn!(path = %path.display(), "tapper PCAP file is empty");
    }

    Ok(())
}

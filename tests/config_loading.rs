// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;

use tapcheck::config::{ScenarioConfig, load_and_validate, load_from_path};
use tapcheck::errors::HarnessError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn empty_file_yields_built_in_defaults() {
    let file = config_file("");
    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg, ScenarioConfig::default());
}

#[test]
fn full_file_overrides_every_section() {
    let file = config_file(
        r#"
[binaries]
store = "/opt/basenine"
agent = "/opt/agent"

[store]
port = 9199
readiness_timeout = "2s"

[tapper]
pcap = "captures/dns.cap"
api_server_address = "ws://127.0.0.1:9000/wsTapper"
readiness_timeout = "3s"
capture_timeout = "30s"

[api_server]
config_path = "/etc/agent/config.json"
readiness_timeout = "4s"

[scenario]
timeout = "2m"
teardown_grace = "500ms"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.store_bin, PathBuf::from("/opt/basenine"));
    assert_eq!(cfg.agent_bin, PathBuf::from("/opt/agent"));
    assert_eq!(cfg.store_port, 9199);
    assert_eq!(cfg.store_readiness, Duration::from_secs(2));
    assert_eq!(cfg.pcap, PathBuf::from("captures/dns.cap"));
    assert_eq!(cfg.api_server_address, "ws://127.0.0.1:9000/wsTapper");
    assert_eq!(cfg.tapper_readiness, Duration::from_secs(3));
    assert_eq!(cfg.capture_timeout, Duration::from_secs(30));
    assert_eq!(
        cfg.api_server_config_path,
        Some(PathBuf::from("/etc/agent/config.json"))
    );
    assert_eq!(cfg.api_server_readiness, Duration::from_secs(4));
    assert_eq!(cfg.scenario_timeout, Duration::from_secs(120));
    assert_eq!(cfg.teardown_grace, Duration::from_millis(500));
}

#[test]
fn capture_timeout_falls_back_to_scenario_timeout() {
    let file = config_file(
        r#"
[scenario]
timeout = "90s"
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.capture_timeout, Duration::from_secs(90));
}

#[test]
fn malformed_toml_returns_toml_error() {
    let file = config_file("[store\nport = 1");
    match load_from_path(file.path()) {
        Err(HarnessError::TomlError(_)) => {}
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn bad_values_return_config_errors() {
    let cases = [
        ("[store]\nport = 0\n", "[store].port"),
        ("[tapper]\napi_server_address = \"http://localhost\"\n", "ws://"),
        ("[store]\nreadiness_timeout = \"0s\"\n", "store.readiness_timeout"),
        ("[scenario]\ntimeout = \"soon\"\n", "scenario.timeout"),
        ("[binaries]\nagent = \"\"\n", "[binaries].agent"),
        ("[api_server]\nconfig_path = \" \"\n", "config_path"),
    ];

    for (contents, needle) in cases {
        let file = config_file(contents);
        match load_and_validate(file.path()) {
            Err(HarnessError::ConfigError(msg)) => {
                assert!(msg.contains(needle), "{msg:?} should mention {needle:?}")
            }
            other => panic!("Expected ConfigError for {contents:?}, got: {:?}", other),
        }
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    match load_from_path(dir.path().join("Tapcheck.toml")) {
        Err(HarnessError::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("Expected IoError, got: {:?}", other),
    }
}

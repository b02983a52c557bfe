#![allow(dead_code)]

//! Shell-script stand-ins for the store and the agent.
//!
//! Each fake speaks the same command line and writes the same diagnostic
//! output as the real binary, and appends `launch <role>` / `quit <role>`
//! lines to a shared log so tests can count process lifetimes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Libpcap global header magic; the fakes never parse it.
const PCAP_MAGIC: &[u8] = b"\xd4\xc3\xb2\xa1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBehaviour {
    Healthy,
    /// Announces this port no matter what it was asked to listen on.
    WrongPort(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentBehaviour {
    Healthy,
    /// Tap mode never writes anything until it is told to quit.
    SilentTapper,
    /// Tap mode announces readiness, then never finishes the replay.
    StalledTapper,
    /// Tap mode exits without the end-of-file marker.
    TapperMissingEof,
}

impl AgentBehaviour {
    fn as_script_value(self) -> &'static str {
        match self {
            AgentBehaviour::Healthy => "healthy",
            AgentBehaviour::SilentTapper => "silent-tapper",
            AgentBehaviour::StalledTapper => "stalled-tapper",
            AgentBehaviour::TapperMissingEof => "missing-eof",
        }
    }
}

/// A temp dir holding a fake store, a fake agent and a capture file.
pub struct FakeCollaborators {
    dir: TempDir,
    store_bin: PathBuf,
    agent_bin: PathBuf,
    pcap: PathBuf,
    log: PathBuf,
}

impl FakeCollaborators {
    pub fn healthy() -> Result<Self> {
        Self::new(StoreBehaviour::Healthy, AgentBehaviour::Healthy)
    }

    pub fn new(store: StoreBehaviour, agent: AgentBehaviour) -> Result<Self> {
        let dir = tempfile::tempdir().context("creating fake collaborator dir")?;
        let log = dir.path().join("lifecycle.log");
        fs::write(&log, "").context("creating lifecycle log")?;

        let store_bin = dir.path().join("fake-store");
        write_script(&store_bin, &store_script(&log, store))?;

        let agent_bin = dir.path().join("fake-agent");
        write_script(&agent_bin, &agent_script(&log, agent))?;

        let pcap = dir.path().join("http.cap");
        fs::write(&pcap, PCAP_MAGIC).context("writing capture file")?;

        Ok(Self {
            dir,
            store_bin,
            agent_bin,
            pcap,
            log,
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_bin(&self) -> &Path {
        &self.store_bin
    }

    pub fn agent_bin(&self) -> &Path {
        &self.agent_bin
    }

    pub fn pcap(&self) -> &Path {
        &self.pcap
    }

    /// Roles that were launched, in launch order.
    pub fn launches(&self) -> Vec<String> {
        self.log_entries("launch")
    }

    /// Roles that handled a quit request, in order.
    pub fn quits(&self) -> Vec<String> {
        self.log_entries("quit")
    }

    fn log_entries(&self, kind: &str) -> Vec<String> {
        let contents = fs::read_to_string(&self.log).unwrap_or_default();
        contents
            .lines()
            .filter_map(|line| line.strip_prefix(kind))
            .map(|role| role.trim().to_string())
            .collect()
    }
}

fn write_script(path: &Path, body: &str) -> Result<()> {
    fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("marking {} executable", path.display()))?;
    }

    Ok(())
}

fn store_script(log: &Path, behaviour: StoreBehaviour) -> String {
    let forced_port = match behaviour {
        StoreBehaviour::Healthy => String::new(),
        StoreBehaviour::WrongPort(port) => port.to_string(),
    };

    format!(
        r#"#!/bin/sh
LOG='{log}'
FORCED_PORT='{forced_port}'
port=""
while [ $# -gt 0 ]; do
  case "$1" in
    -port) port="$2"; shift ;;
  esac
  shift
done
[ -n "$FORCED_PORT" ] && port="$FORCED_PORT"

echo "launch store" >> "$LOG"
sleep 30 2>/dev/null &
child=$!
trap 'kill $child 2>/dev/null; echo "quit store" >> "$LOG"; exit 0' QUIT
printf '%s Listening on :%s\n' "$(date +%Y/%m/%d)" "$port" >&2
wait $child
"#,
        log = log.display(),
    )
}

fn agent_script(log: &Path, behaviour: AgentBehaviour) -> String {
    format!(
        r#"#!/bin/sh
LOG='{log}'
BEHAVIOUR='{behaviour}'
mode=""
pcap=""
ws=""
while [ $# -gt 0 ]; do
  case "$1" in
    -r) pcap="$2"; shift ;;
    --tap) mode=tap ;;
    --api-server-address) ws="$2"; shift ;;
    --api-server) mode=api ;;
    --config-path) shift ;;
  esac
  shift
done

serve() {{
  role=$1
  sleep 30 2>/dev/null &
  child=$!
  trap 'kill $child 2>/dev/null; echo "quit $role" >> "$LOG"; exit 0' QUIT
  printf '%s' "$2" >&2
  wait $child
  exit 0
}}

case "$mode" in
  tap)
    echo "launch tapper" >> "$LOG"
    case "$BEHAVIOUR" in
      silent-tapper) serve tapper "" ;;
      stalled-tapper) serve tapper "tapper: Initializing" ;;
    esac
    printf 'tapper: Initializing' >&2
    sleep 0.2
    printf 'Starting tapper, websocket address: %s\n' "$ws" >&2
    printf 'Start reading packets from file-%s\n' "$pcap" >&2
    if [ "$BEHAVIOUR" != missing-eof ]; then
      printf 'Got EOF while reading packets from file-%s\n' "$pcap" >&2
    fi
    exit 0
    ;;
  api)
    echo "launch api-server" >> "$LOG"
    serve api-server "api-server: Initializing"
    ;;
esac

echo "unknown agent mode" >&2
exit 2
"#,
        log = log.display(),
        behaviour = behaviour.as_script_value(),
    )
}

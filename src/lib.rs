// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod output;
pub mod process;
pub mod scenario;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::duration::format_duration;
use crate::config::{RawScenarioConfig, ScenarioConfig, load_or_default};
use crate::scenario::{Collaborator, ScenarioOrchestrator, invocation};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the scenario orchestrator
/// - Ctrl-C handling
/// - printing the final report
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let report = ScenarioOrchestrator::new(cfg).run_until(shutdown).await;
    println!("{report}");

    if !report.passed() {
        bail!("scenario failed with {} failure(s)", report.failures().len());
    }

    info!("scenario passed");
    Ok(())
}

/// Load the config file (if any), apply CLI overrides, and validate.
pub fn resolve_config(args: &CliArgs) -> Result<ScenarioConfig> {
    let explicit = args.config.as_deref().map(Path::new);
    let mut raw = load_or_default(explicit).with_context(|| match explicit {
        Some(path) => format!("loading config from {}", path.display()),
        None => "loading default config".to_string(),
    })?;

    apply_overrides(&mut raw, args);

    let cfg = ScenarioConfig::try_from(raw).context("validating scenario config")?;
    Ok(cfg)
}

fn apply_overrides(raw: &mut RawScenarioConfig, args: &CliArgs) {
    if let Some(pcap) = &args.pcap {
        raw.tapper.pcap = pcap.clone();
    }
    if let Some(agent) = &args.agent_bin {
        raw.binaries.agent = agent.clone();
    }
    if let Some(store) = &args.store_bin {
        raw.binaries.store = store.clone();
    }
    if let Some(port) = args.store_port {
        raw.store.port = port;
    }
}

/// Simple dry-run output: resolved settings and the three command lines.
fn print_dry_run(cfg: &ScenarioConfig) {
    println!("tapcheck dry-run");
    println!(
        "  scenario.timeout = {}",
        format_duration(cfg.scenario_timeout)
    );
    println!(
        "  scenario.teardown_grace = {}",
        format_duration(cfg.teardown_grace)
    );
    println!(
        "  tapper.capture_timeout = {}",
        format_duration(cfg.capture_timeout)
    );
    println!();

    println!("collaborators ({}):", Collaborator::ALL.len());
    for collaborator in Collaborator::ALL {
        let spec = invocation::spec_for(collaborator, cfg);
        let marker = invocation::ready_marker_for(collaborator, cfg);
        println!("  - {collaborator}");
        println!("      cmd: {}", spec.command_line());
        println!(
            "      ready within: {}",
            format_duration(spec.readiness_deadline())
        );
        println!("      ready marker: {marker}");
    }

    debug!("dry-run complete (nothing launched)");
}

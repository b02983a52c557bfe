// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tapcheck`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "tapcheck",
    version,
    about = "Run the store, tapper and API server together and check the tapper replays a capture file.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the scenario config file (TOML).
    ///
    /// Default: `Tapcheck.toml` in the current working directory if it
    /// exists, otherwise built-in settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TAPCHECK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve settings and print the three command lines, but launch nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Capture file the tapper replays.
    #[arg(long, value_name = "FILE")]
    pub pcap: Option<String>,

    /// Agent executable, used for both the tapper and the API server.
    #[arg(long, value_name = "PATH")]
    pub agent_bin: Option<String>,

    /// Stream-store executable.
    #[arg(long, value_name = "PATH")]
    pub store_bin: Option<String>,

    /// Port the store is told to listen on.
    #[arg(long, value_name = "PORT")]
    pub store_port: Option<u16>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `native-harness`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "native-harness",
    version,
    about = "Launch cluster members and wait for their readiness markers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the harness file (TOML).
    ///
    /// Default: `Harness.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Launch only applications whose name starts with this prefix.
    ///
    /// Applications they depend on (via `after`) are launched as well.
    #[arg(long, value_name = "PREFIX")]
    pub only: Option<String>,

    /// Keep the applications running after they are ready, until Ctrl-C.
    #[arg(long)]
    pub hold: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `NATIVE_HARNESS_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print resolved command lines, launch nothing.
    #[arg(long)]
    pub dry_run: bool,
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

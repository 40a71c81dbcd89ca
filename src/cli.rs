// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `pipeline-console`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipeline-console",
    version,
    about = "Follow live pipeline logs and inspect the transformation DAG.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `Console.toml` is used when present, otherwise defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Job to follow. May be repeated. Subscriptions are re-sent after every
    /// reconnect.
    #[arg(long = "subscribe", value_name = "JOB_ID")]
    pub subscribe: Vec<String>,

    /// Print the DAG highlighted by this selector (e.g. `+fct_trips`).
    #[arg(long, value_name = "SELECTOR")]
    pub select: Option<String>,

    /// Resolve `--select` locally instead of asking the backend.
    #[arg(long, requires = "select")]
    pub local_select: bool,

    /// Print the DAG and exit without streaming logs.
    #[arg(long)]
    pub graph_only: bool,

    /// Print details and sample rows of one model, then exit.
    #[arg(long, value_name = "MODEL")]
    pub preview: Option<String>,

    /// Number of sample rows requested with `--preview`.
    #[arg(long, default_value_t = 10, requires = "preview")]
    pub preview_limit: u32,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPELINE_CONSOLE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<TraceLevel>,

    /// Load + validate config, print it, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Diagnostic log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum TraceLevel {
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

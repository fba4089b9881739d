//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Bela Syncer - Drift correction for Bela TX/RX sensor logs
#[derive(Parser, Debug)]
#[command(
    name = "bela-syncer",
    author,
    version,
    about = "Clock drift correction for Bela TX/RX sensor logs",
    long_about = "Aligns sensor logs recorded on several Bela boards to one time base.\n\n\
                  Loads the transmitter and receiver logs named in a session file, \n\
                  corrects every receiver's clock drift against the transmitter's \n\
                  clock ticks, and exports the synced streams to configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BELA_SYNCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BELA_SYNCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synchronize every receiver of a session and export the results
    Run(RunArgs),

    /// Validate a session file without loading any log
    Validate(ValidateArgs),

    /// Display session information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to session file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "session.toml",
        env = "BELA_SYNCER_CONFIG"
    )]
    pub config: PathBuf,

    /// Write synced streams to this directory (adds or overrides a file sink)
    #[arg(short, long, env = "BELA_SYNCER_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Validate the session and exit without loading logs
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "BELA_SYNCER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to session file to validate
    #[arg(short, long, default_value = "session.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to session file
    #[arg(short, long, default_value = "session.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show log paths and sample rates of every device
    #[arg(long)]
    pub devices: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

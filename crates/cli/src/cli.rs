//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::{Level, PolicyKind};
use std::path::PathBuf;

/// keyroute - route log records to an aggregate log or one log per key
#[derive(Parser, Debug)]
#[command(
    name = "keyroute",
    author,
    version,
    about = "Keyed log router",
    long_about = "Routes structured log records to exactly one destination: the aggregate log \n\
                  for records without a routing key, or a per-key log created on first use."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "KEYROUTE_VERBOSE")]
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
        env = "KEYROUTE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route newline-delimited JSON records
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "router.toml", env = "KEYROUTE_CONFIG")]
    pub config: PathBuf,

    /// Records to route, one JSON object per line (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the output directory of file sinks
    #[arg(long, env = "KEYROUTE_BASE_PATH")]
    pub base_path: Option<PathBuf>,

    /// Override the routing policy
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Override the router threshold (debug, info, warning, error, critical)
    #[arg(long)]
    pub level: Option<Level>,

    /// Validate configuration and exit without routing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "KEYROUTE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "router.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Routing policy choice
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PolicyArg {
    /// Route by the record's key, filtering on both sides
    Selector,
    /// One child handle per key
    Hierarchical,
}

impl From<PolicyArg> for PolicyKind {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Selector => PolicyKind::Selector,
            PolicyArg::Hierarchical => PolicyKind::Hierarchical,
        }
    }
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
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

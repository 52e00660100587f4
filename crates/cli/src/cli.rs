//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use observability::LogFormat;
use std::path::PathBuf;

/// Failover Dispatch - dual-endpoint failover dispatcher
#[derive(Parser, Debug)]
#[command(
    name = "failover-dispatch",
    author,
    version,
    about = "Dual-endpoint failover dispatcher",
    long_about = "Routes operations to a primary endpoint under a time budget and fails over\n\
                  to a secondary endpoint, switching back after an escalating cooldown.\n\n\
                  The `run` command drives a simulated workload through two in-memory\n\
                  endpoints described by the configuration file."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FAILOVER_DISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (json, pretty, compact)
    #[arg(
        long,
        default_value = "pretty",
        global = true,
        env = "FAILOVER_DISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive a simulated workload through the dispatcher
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "failover.toml",
        env = "FAILOVER_DISPATCH_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the primary time budget in milliseconds
    #[arg(long, env = "FAILOVER_DISPATCH_PRIMARY_TIMEOUT_MS")]
    pub primary_timeout_ms: Option<u64>,

    /// Override the secondary time budget in milliseconds
    #[arg(long, env = "FAILOVER_DISPATCH_SECONDARY_TIMEOUT_MS")]
    pub secondary_timeout_ms: Option<u64>,

    /// Allow failover for medium-danger operations
    #[arg(long, env = "FAILOVER_DISPATCH_FAILOVER_MEDIUM")]
    pub failover_medium: bool,

    /// Allow failover for dangerous operations
    #[arg(long, env = "FAILOVER_DISPATCH_FAILOVER_DANGEROUS")]
    pub failover_dangerous: bool,

    /// Number of calls to issue
    #[arg(long, default_value = "1000", env = "FAILOVER_DISPATCH_CALLS")]
    pub calls: u64,

    /// Concurrent callers
    #[arg(long, default_value = "4", env = "FAILOVER_DISPATCH_CONCURRENCY")]
    pub concurrency: usize,

    /// Number of distinct keys touched by the workload
    #[arg(long, default_value = "64")]
    pub key_space: usize,

    /// Force the primary endpoint down once this many calls were issued
    #[arg(long, env = "FAILOVER_DISPATCH_OUTAGE_AFTER")]
    pub outage_after: Option<u64>,

    /// How long the forced outage lasts in milliseconds
    #[arg(long, default_value = "1000", requires = "outage_after")]
    pub outage_ms: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FAILOVER_DISPATCH_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FAILOVER_DISPATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "failover.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "failover.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the operation-kind eligibility table
    #[arg(long)]
    pub operations: bool,
}

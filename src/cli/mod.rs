//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Toggl Ledger using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Toggl Ledger - Toggl time reports to spreadsheet log sync
#[derive(Parser, Debug)]
#[command(name = "toggl-ledger")]
#[command(version, about, long_about = None)]
#[command(author = "Toggl Ledger Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "toggl-ledger.toml",
        env = "TOGGL_LEDGER_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TOGGL_LEDGER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the report window and reconcile it into the log store
    Sync(commands::sync::SyncArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show the live store's fill level and rotation state
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

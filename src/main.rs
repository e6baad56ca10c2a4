// Toggl Ledger - Toggl time reports to spreadsheet log sync
// Copyright (c) 2025 Toggl Ledger Contributors
// Licensed under the MIT License

use clap::Parser;
use std::process;
use toggl_ledger::cli::{Cli, Commands};
use toggl_ledger::config::{load_config, LoggingConfig};
use toggl_ledger::logging::init_logging;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // File logging follows the config when it loads; the command itself
    // reports configuration errors, so fall back to console-only here
    let loaded = load_config(&cli.config).ok();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| loaded.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = match (&cli.command, loaded) {
        (Commands::Sync(_), Some(config)) => config.logging,
        _ => LoggingConfig::default(),
    };

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Toggl Ledger - Toggl time reports to spreadsheet log sync"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // process::exit skips destructors; flush the file writer first
    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Sync(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}

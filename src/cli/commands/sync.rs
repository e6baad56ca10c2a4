//! Sync command implementation
//!
//! This module implements the `sync` command: one fetch of the report window
//! reconciled into the live log store.

use super::{exit_code_for, exit_code_for_summary};
use crate::adapters::sheet::WorkbookBackend;
use crate::adapters::toggl::TogglClient;
use crate::config::load_config;
use crate::core::sync::{SyncJob, SyncOptions, SyncSummary};
use chrono::NaiveDate;
use clap::Args;
use std::sync::Arc;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Plan every record's action without writing, sorting or rotating
    #[arg(long)]
    pub dry_run: bool,

    /// First day to fetch (YYYY-MM-DD), overrides sync.lookback_days
    #[arg(long)]
    pub since: Option<NaiveDate>,

    /// Last day to fetch (YYYY-MM-DD), overrides sync.until_days_ago
    #[arg(long)]
    pub until: Option<NaiveDate>,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, dry_run = self.dry_run, "Starting sync");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2);
            }
        };

        let client = match TogglClient::new(config.toggl.clone()) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build Toggl client");
                eprintln!("Failed to build Toggl client: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let job = match SyncJob::new(
            config,
            Arc::new(client),
            Arc::new(WorkbookBackend::new()),
        ) {
            Ok(j) => j,
            Err(e) => {
                eprintln!("Failed to prepare sync: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let options = SyncOptions {
            dry_run: self.dry_run,
            since: self.since,
            until: self.until,
        };

        if options.dry_run {
            println!("🔍 Dry run: nothing will be written");
            println!();
        }

        let summary = match job.run(options).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Sync failed");
                eprintln!("Sync failed: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        print_summary(&summary);

        if summary.is_clean() {
            println!("✅ Sync completed successfully!");
        } else {
            println!(
                "⚠️  Sync completed, {} malformed record(s) skipped",
                summary.malformed.len()
            );
        }

        Ok(exit_code_for_summary(&summary))
    }
}

fn print_summary(summary: &SyncSummary) {
    println!();
    println!("📊 Sync Summary:");
    match summary.until {
        Some(until) => println!("  Window: {} .. {}", summary.since, until),
        None => println!("  Window: {} .. now", summary.since),
    }
    println!("  Fetched: {}", summary.fetched);
    println!("  Created: {}", summary.counters.created);
    println!("  Updated: {}", summary.counters.updated);
    println!("  Skipped: {}", summary.counters.skipped);
    println!("  Deleted: {}", summary.counters.deleted);
    if let Some(store) = &summary.store {
        println!("  Store: {store}");
    }
    if let Some(archive) = &summary.rotated_to {
        println!("  Rotated To: {archive}");
    }
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();

    if !summary.malformed.is_empty() {
        println!("⚠️  Malformed records:");
        for (i, issue) in summary.malformed.iter().enumerate() {
            if i < 10 {
                println!("  - {}: {}", issue.record_id, issue.reason);
            }
        }
        if summary.malformed.len() > 10 {
            println!("  ... and {} more", summary.malformed.len() - 10);
        }
        println!();
    }
}

//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Toggl Ledger configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as its last step
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Time Zone: {}", config.application.time_zone);
        println!("  Dry Run: {}", config.application.dry_run);
        println!(
            "  Toggl Report: {}/{}/{}",
            config.toggl.base_url.trim_end_matches('/'),
            config.toggl.api_version,
            config.toggl.report_type
        );
        println!("  Workspace: {}", config.toggl.workspace_id);
        println!("  API Token: [REDACTED]");
        println!("  Lookback Days: {}", config.sync.lookback_days);
        if let Some(days) = config.sync.until_days_ago {
            println!("  Until Days Ago: {days}");
        }
        println!(
            "  Store: {}/{} (sheet '{}')",
            config.store.directory, config.store.store_name, config.store.sheet_name
        );
        println!(
            "  Archive: {}/{}_<date>",
            config.store.archive_directory(),
            config.store.archive_prefix()
        );
        if let Some(template) = &config.store.template_path {
            println!("  Template: {template}");
        }
        println!("  Capacity Threshold: {}", config.store.capacity_threshold);
        println!(
            "  Data Area Origin: row {}, column {}",
            config.store.data_area_origin.row, config.store.data_area_origin.column
        );
        println!();
        Ok(0)
    }
}

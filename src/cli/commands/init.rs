//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "toggl-ledger.toml")]
    pub output: String,

    /// Include every optional setting with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Toggl Ledger configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your workspace and store settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set TOGGL_API_TOKEN to your Toggl API token");
                println!("  3. Validate configuration: toggl-ledger validate-config");
                println!("  4. Preview a run: toggl-ledger sync --dry-run");
                println!("  5. Run the sync: toggl-ledger sync");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Toggl Ledger Configuration File
# Toggl time reports to spreadsheet log sync

[application]
log_level = "info"
time_zone = "Asia/Tokyo"

[toggl]
api_token = "${TOGGL_API_TOKEN}"
user_agent = "you@example.com"
workspace_id = "123456"

[store]
directory = "ledger"
store_name = "schedule_latest"
sheet_name = "log"
"#
        .to_string()
    }

    /// Generate configuration with every setting and its default
    fn generate_config_with_examples() -> String {
        r#"# Toggl Ledger Configuration File
# Toggl time reports to spreadsheet log sync
#
# Values of the form ${VAR} are replaced with environment variables.
# Any key can also be overridden with TOGGL_LEDGER_<SECTION>_<KEY>,
# e.g. TOGGL_LEDGER_STORE_CAPACITY_THRESHOLD=50000.

[application]
# Log level: trace, debug, info, warn, error
log_level = "info"

# Plan actions without writing anything
dry_run = false

# IANA time zone used for cell timestamps, the fetch window and archive dates
time_zone = "Asia/Tokyo"

[toggl]
base_url = "https://api.track.toggl.com/reports/api"
api_version = "v2"

# Keep the token out of this file
api_token = "${TOGGL_API_TOKEN}"

# Contact address Toggl asks API clients to send
user_agent = "you@example.com"
workspace_id = "123456"

report_type = "details"
timeout_seconds = 60

# Upper bound on pages fetched per run
max_pages = 50

[toggl.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

[sync]
# Fetch from this many days ago (1 = yesterday through now)
lookback_days = 1

# Optional last day of the window, in days before today
# until_days_ago = 0

# Value written to the SOURCE column
source_label = "toggl"

[store]
# Directory holding the live store
directory = "ledger"

# Directory receiving rotated stores (defaults to directory)
# archive_directory = "ledger/archive"

# Workbook cloned when a new store is provisioned
# template_path = "templates/log.xlsx"

store_name = "schedule_latest"

# Rotated stores are named <prefix>_<yyyy-MM-dd> (defaults to store_name)
# archive_name_prefix = "schedule"

sheet_name = "log"

# Rotate once the last used row reaches this value
capacity_threshold = 100000

[store.data_area_origin]
row = 2
column = 1

[store.columns]
id = 1
subject = 2
start = 3
end = 4
project = 5
tag = 6
source = 7
last_update = 8

[store.retry]
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 5000
backoff_multiplier = 2.0

[logging]
# JSON log files next to console output
local_enabled = false
local_path = "logs"

# daily or hourly
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn with_token(config: &str) -> String {
        config.replace("${TOGGL_API_TOKEN}", "test-token")
    }

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "toggl-ledger.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "toggl-ledger.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_parse() {
        let minimal = parse_config(&with_token(&InitArgs::generate_minimal_config())).unwrap();
        assert_eq!(minimal.store.store_name, "schedule_latest");

        let full = parse_config(&with_token(&InitArgs::generate_config_with_examples())).unwrap();
        assert_eq!(full.store.capacity_threshold, 100_000);
        assert_eq!(full.store.columns.last_update, 8);
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("toggl-ledger.toml");
        fs::write(&output, "keep me").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "keep me");

        let forced = InitArgs { force: true, ..args };
        assert_eq!(forced.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[toggl]"));
    }
}

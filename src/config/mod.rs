//! Configuration management for Toggl Ledger.
//!
//! Toggl Ledger reads one TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `TOGGL_LEDGER_<SECTION>_<KEY>` overrides applied after parsing
//! - Default values for everything except the Toggl credentials
//! - Validation before any network or file access
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level, dry run, time zone
//! - [`TogglConfig`] - Reports API endpoint, credentials, paging and retry
//! - [`SyncConfig`] - fetch window and source label
//! - [`StoreConfig`] - workbook location, layout, capacity and retry
//! - [`LoggingConfig`] - local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//! time_zone = "Asia/Tokyo"
//!
//! [toggl]
//! api_token = "${TOGGL_API_TOKEN}"
//! user_agent = "me@example.com"
//! workspace_id = "1234567"
//!
//! [store]
//! directory = "/srv/ledger"
//! template_path = "/srv/ledger/template.xlsx"
//! archive_name_prefix = "schedule"
//! ```
//!
//! ```rust,no_run
//! use toggl_ledger::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("toggl-ledger.toml")?;
//! println!("Workspace: {}", config.toggl.workspace_id);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ColumnSchema, DataAreaOrigin, LedgerConfig, LoggingConfig, RetryConfig,
    StoreConfig, SyncConfig, TogglConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};

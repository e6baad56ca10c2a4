//! Configuration schema types
//!
//! This module defines the configuration structure for Toggl Ledger.

use crate::config::SecretString;
use crate::domain::timestamp::parse_time_zone;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Main Toggl Ledger configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Toggl Reports API settings
    pub toggl: TogglConfig,

    /// Sync window settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Spreadsheet log settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LedgerConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.toggl.validate()?;
        self.sync.validate()?;
        self.store.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (plan every record, write nothing)
    #[serde(default)]
    pub dry_run: bool,

    /// IANA time zone used for cell timestamps and archive date stamps
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl ApplicationConfig {
    /// Parsed [`time_zone`](Self::time_zone)
    pub fn tz(&self) -> Result<Tz, String> {
        parse_time_zone(&self.time_zone)
    }

    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        self.tz()?;
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
            time_zone: default_time_zone(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 = no retry)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        if self.max_retries == 0 || self.max_retries > 10 {
            return Err(format!(
                "{section}.retry.max_retries must be between 1 and 10, got {}",
                self.max_retries
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "{section}.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Toggl Reports API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TogglConfig {
    /// Base URL of the reports API (without version)
    #[serde(default = "default_toggl_base_url")]
    pub base_url: String,

    /// Reports API version path segment
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// API token, sent as basic auth `{token}:api_token`
    /// Stored securely in memory and automatically zeroized on drop
    pub api_token: SecretString,

    /// Contact string required by the reports API
    pub user_agent: String,

    /// Workspace to report on
    pub workspace_id: String,

    /// Report type path segment
    #[serde(default = "default_report_type")]
    pub report_type: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Upper bound on pages fetched per run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl TogglConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("toggl.base_url cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("toggl.base_url must start with http:// or https://".to_string());
        }

        if self.api_token.expose_secret().is_empty() {
            return Err("toggl.api_token cannot be empty".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err("toggl.user_agent cannot be empty".to_string());
        }

        if self.workspace_id.trim().is_empty() {
            return Err("toggl.workspace_id cannot be empty".to_string());
        }

        if self.max_pages == 0 {
            return Err("toggl.max_pages must be > 0".to_string());
        }

        self.retry.validate("toggl")?;
        Ok(())
    }
}

/// Sync window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Days before today where the fetch window starts (1 = yesterday)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Days before today where the fetch window ends (unset = open-ended)
    #[serde(default)]
    pub until_days_ago: Option<u32>,

    /// Value written to the SOURCE column
    #[serde(default = "default_source_label")]
    pub source_label: String,
}

impl SyncConfig {
    fn validate(&self) -> Result<(), String> {
        if self.lookback_days == 0 {
            return Err("sync.lookback_days must be > 0".to_string());
        }
        if let Some(until) = self.until_days_ago {
            if until > self.lookback_days {
                return Err(format!(
                    "sync.until_days_ago ({until}) cannot be earlier than sync.lookback_days ({})",
                    self.lookback_days
                ));
            }
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            until_days_ago: None,
            source_label: default_source_label(),
        }
    }
}

/// First row/column eligible to hold data (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataAreaOrigin {
    /// First data row; rows above it are header/reserved
    pub row: u32,

    /// First data column; columns left of it are reserved
    pub column: u32,
}

impl Default for DataAreaOrigin {
    fn default() -> Self {
        Self { row: 2, column: 1 }
    }
}

/// Column positions (1-based) of each logical field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSchema {
    pub id: u32,
    pub subject: u32,
    pub start: u32,
    pub end: u32,
    pub project: u32,
    pub tag: u32,
    pub source: u32,
    pub last_update: u32,
}

impl ColumnSchema {
    /// Header names paired with their column, in schema order
    pub fn named(&self) -> [(&'static str, u32); 8] {
        [
            ("ID", self.id),
            ("SUBJECT", self.subject),
            ("START", self.start),
            ("END", self.end),
            ("PROJECT", self.project),
            ("TAG", self.tag),
            ("SOURCE", self.source),
            ("LAST_UPDATE", self.last_update),
        ]
    }

    /// Number of columns spanned from `origin_column` to the rightmost field
    pub fn width_from(&self, origin_column: u32) -> u32 {
        let rightmost = self.named().iter().map(|(_, col)| *col).max().unwrap_or(0);
        rightmost.saturating_sub(origin_column) + 1
    }

    fn validate(&self, origin_column: u32) -> Result<(), String> {
        let named = self.named();
        for (i, (name, col)) in named.iter().enumerate() {
            if *col < origin_column {
                return Err(format!(
                    "store.columns.{} ({col}) lies left of the data area origin column ({origin_column})",
                    name.to_lowercase()
                ));
            }
            if let Some((other, _)) = named[i + 1..].iter().find(|(_, c)| c == col) {
                return Err(format!(
                    "store.columns.{} and store.columns.{} share column {col}",
                    name.to_lowercase(),
                    other.to_lowercase()
                ));
            }
        }
        Ok(())
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            id: 1,
            subject: 2,
            start: 3,
            end: 4,
            project: 5,
            tag: 6,
            source: 7,
            last_update: 8,
        }
    }
}

/// Spreadsheet log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the live workbook
    #[serde(default = "default_store_directory")]
    pub directory: String,

    /// Directory receiving rotated workbooks (unset = same as `directory`)
    #[serde(default)]
    pub archive_directory: Option<String>,

    /// Workbook cloned when a new store is provisioned
    #[serde(default)]
    pub template_path: Option<String>,

    /// Logical name of the live store
    #[serde(default = "default_store_name")]
    pub store_name: String,

    /// Prefix of archive names (unset = `store_name`)
    #[serde(default)]
    pub archive_name_prefix: Option<String>,

    /// Sheet holding the log
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Last-row index at which the store is rotated
    #[serde(default = "default_capacity_threshold")]
    pub capacity_threshold: u32,

    /// First data row/column
    #[serde(default)]
    pub data_area_origin: DataAreaOrigin,

    /// Column layout
    #[serde(default)]
    pub columns: ColumnSchema,

    /// Retry configuration for store lookups
    #[serde(default)]
    pub retry: RetryConfig,
}

impl StoreConfig {
    /// Prefix used for archive names
    pub fn archive_prefix(&self) -> &str {
        self.archive_name_prefix
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&self.store_name)
    }

    /// Directory receiving rotated workbooks
    pub fn archive_directory(&self) -> &str {
        self.archive_directory
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.directory)
    }

    fn validate(&self) -> Result<(), String> {
        if self.directory.trim().is_empty() {
            return Err("store.directory cannot be empty".to_string());
        }

        if self.store_name.trim().is_empty() {
            return Err("store.store_name cannot be empty".to_string());
        }

        if self.sheet_name.trim().is_empty() {
            return Err("store.sheet_name cannot be empty".to_string());
        }

        if self.data_area_origin.row == 0 || self.data_area_origin.column == 0 {
            return Err("store.data_area_origin row and column start at 1".to_string());
        }

        if self.capacity_threshold <= self.data_area_origin.row {
            return Err(format!(
                "store.capacity_threshold ({}) must be greater than the data area origin row ({})",
                self.capacity_threshold, self.data_area_origin.row
            ));
        }

        self.columns.validate(self.data_area_origin.column)?;
        self.retry.validate("store")?;
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_store_directory(),
            archive_directory: None,
            template_path: None,
            store_name: default_store_name(),
            archive_name_prefix: None,
            sheet_name: default_sheet_name(),
            capacity_threshold: default_capacity_threshold(),
            data_area_origin: DataAreaOrigin::default(),
            columns: ColumnSchema::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_time_zone() -> String {
    "Asia/Tokyo".to_string()
}

fn default_toggl_base_url() -> String {
    "https://api.track.toggl.com/reports/api".to_string()
}

fn default_api_version() -> String {
    "v2".to_string()
}

fn default_report_type() -> String {
    "details".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_max_pages() -> u32 {
    50
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_lookback_days() -> u32 {
    1
}

fn default_source_label() -> String {
    "toggl".to_string()
}

fn default_store_directory() -> String {
    "ledger".to_string()
}

fn default_store_name() -> String {
    "schedule_latest".to_string()
}

fn default_sheet_name() -> String {
    "log".to_string()
}

fn default_capacity_threshold() -> u32 {
    100_000
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn toggl_config() -> TogglConfig {
        TogglConfig {
            base_url: default_toggl_base_url(),
            api_version: default_api_version(),
            api_token: secret_string("token".to_string()),
            user_agent: "me@example.com".to_string(),
            workspace_id: "123".to_string(),
            report_type: default_report_type(),
            timeout_seconds: 60,
            max_pages: 50,
            retry: RetryConfig::default(),
        }
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.log_level = "debug".to_string();
        config.time_zone = "Nowhere/Special".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toggl_config_validation() {
        let mut config = toggl_config();
        assert!(config.validate().is_ok());

        config.base_url = "ftp://toggl.com".to_string();
        assert!(config.validate().is_err());

        config = toggl_config();
        config.api_token = secret_string(String::new());
        assert!(config.validate().is_err());

        config = toggl_config();
        config.workspace_id = "  ".to_string();
        assert!(config.validate().is_err());

        config = toggl_config();
        config.retry.max_retries = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sync_config_validation() {
        let mut config = SyncConfig::default();
        assert!(config.validate().is_ok());

        config.lookback_days = 0;
        assert!(config.validate().is_err());

        config.lookback_days = 3;
        config.until_days_ago = Some(4);
        assert!(config.validate().is_err());

        config.until_days_ago = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_config_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.store_name, "schedule_latest");
        assert_eq!(config.sheet_name, "log");
        assert_eq!(config.data_area_origin, DataAreaOrigin { row: 2, column: 1 });
        assert_eq!(config.capacity_threshold, 100_000);
        assert_eq!(config.archive_prefix(), "schedule_latest");
        assert_eq!(config.archive_directory(), "ledger");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_config_threshold_must_exceed_origin() {
        let config = StoreConfig {
            capacity_threshold: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_config_rejects_zero_origin() {
        let config = StoreConfig {
            data_area_origin: DataAreaOrigin { row: 0, column: 1 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_column_schema_rejects_duplicates() {
        let columns = ColumnSchema {
            end: 3,
            ..Default::default()
        };
        let err = columns.validate(1).unwrap_err();
        assert!(err.contains("start"));
        assert!(err.contains("end"));
    }

    #[test]
    fn test_column_schema_rejects_columns_left_of_origin() {
        let columns = ColumnSchema::default();
        assert!(columns.validate(2).is_err());
    }

    #[test]
    fn test_column_schema_width() {
        let columns = ColumnSchema::default();
        assert_eq!(columns.width_from(1), 8);

        let shifted = ColumnSchema {
            id: 2,
            subject: 3,
            start: 4,
            end: 5,
            project: 6,
            tag: 7,
            source: 8,
            last_update: 10,
        };
        assert_eq!(shifted.width_from(2), 9);
    }

    #[test]
    fn test_archive_overrides() {
        let config = StoreConfig {
            archive_name_prefix: Some("schedule".to_string()),
            archive_directory: Some("ledger/archive".to_string()),
            ..Default::default()
        };
        assert_eq!(config.archive_prefix(), "schedule");
        assert_eq!(config.archive_directory(), "ledger/archive");
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.local_enabled);
        assert_eq!(config.local_rotation, "daily");
        assert!(config.validate().is_ok());
    }
}

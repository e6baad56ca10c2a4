//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::LedgerConfig;
use super::secret_string;
use crate::domain::errors::SyncError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix of environment variables that override TOML values
pub const ENV_PREFIX: &str = "TOGGL_LEDGER";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into LedgerConfig
/// 4. Applies environment variable overrides (TOGGL_LEDGER_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`SyncError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, the TOML does not parse, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use toggl_ledger::config::loader::load_config;
///
/// let config = load_config("toggl-ledger.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<LedgerConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SyncError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SyncError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text, applying substitution, overrides and validation
pub fn parse_config(contents: &str) -> Result<LedgerConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: LedgerConfig = toml::from_str(&contents)
        .map_err(|e| SyncError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(|e| SyncError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SyncError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SyncError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_override(section: &str, key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}_{section}_{key}")).ok()
}

fn parsed_override<T: std::str::FromStr>(section: &str, key: &str) -> Option<T> {
    env_override(section, key).and_then(|v| v.parse().ok())
}

/// Applies environment variable overrides using the TOGGL_LEDGER_* prefix
///
/// Variables follow the pattern `TOGGL_LEDGER_<SECTION>_<KEY>`, for example
/// `TOGGL_LEDGER_TOGGL_API_TOKEN` or `TOGGL_LEDGER_STORE_DIRECTORY`. Values
/// that fail to parse for numeric or boolean keys are ignored.
fn apply_env_overrides(config: &mut LedgerConfig) {
    // Application overrides
    if let Some(val) = env_override("APPLICATION", "LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = parsed_override("APPLICATION", "DRY_RUN") {
        config.application.dry_run = val;
    }
    if let Some(val) = env_override("APPLICATION", "TIME_ZONE") {
        config.application.time_zone = val;
    }

    // Toggl overrides
    if let Some(val) = env_override("TOGGL", "BASE_URL") {
        config.toggl.base_url = val;
    }
    if let Some(val) = env_override("TOGGL", "API_TOKEN") {
        config.toggl.api_token = secret_string(val);
    }
    if let Some(val) = env_override("TOGGL", "USER_AGENT") {
        config.toggl.user_agent = val;
    }
    if let Some(val) = env_override("TOGGL", "WORKSPACE_ID") {
        config.toggl.workspace_id = val;
    }
    if let Some(val) = parsed_override("TOGGL", "TIMEOUT_SECONDS") {
        config.toggl.timeout_seconds = val;
    }
    if let Some(val) = parsed_override("TOGGL", "MAX_PAGES") {
        config.toggl.max_pages = val;
    }

    // Sync overrides
    if let Some(val) = parsed_override("SYNC", "LOOKBACK_DAYS") {
        config.sync.lookback_days = val;
    }
    if let Some(val) = parsed_override("SYNC", "UNTIL_DAYS_AGO") {
        config.sync.until_days_ago = Some(val);
    }
    if let Some(val) = env_override("SYNC", "SOURCE_LABEL") {
        config.sync.source_label = val;
    }

    // Store overrides
    if let Some(val) = env_override("STORE", "DIRECTORY") {
        config.store.directory = val;
    }
    if let Some(val) = env_override("STORE", "ARCHIVE_DIRECTORY") {
        config.store.archive_directory = Some(val);
    }
    if let Some(val) = env_override("STORE", "TEMPLATE_PATH") {
        config.store.template_path = Some(val);
    }
    if let Some(val) = env_override("STORE", "STORE_NAME") {
        config.store.store_name = val;
    }
    if let Some(val) = env_override("STORE", "SHEET_NAME") {
        config.store.sheet_name = val;
    }
    if let Some(val) = parsed_override("STORE", "CAPACITY_THRESHOLD") {
        config.store.capacity_threshold = val;
    }

    // Logging overrides
    if let Some(val) = parsed_override("LOGGING", "LOCAL_ENABLED") {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env_override("LOGGING", "LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

//! Status command implementation
//!
//! This module implements the `status` command, a read-only look at the
//! live store: how full it is and whether the next sync would rotate it.

use super::exit_code_for;
use crate::adapters::sheet::WorkbookBackend;
use crate::config::{load_config, LedgerConfig};
use crate::core::rotation::{needs_rotation, LogRotator, RotationTarget};
use crate::core::store::{StoreLayout, TabularStore};
use crate::domain::Result;
use clap::Args;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Fill level of the live store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub location: String,
    pub exists: bool,
    pub last_row: u32,
    pub data_rows: u32,
    pub capacity_threshold: u32,
    pub would_rotate: bool,
}

impl StoreStatus {
    /// Inspects the live store through `store` without mutating it
    pub fn inspect(store: &TabularStore, config: &LedgerConfig) -> Result<Self> {
        let rotator = LogRotator::new(store, RotationTarget::from(&config.store));
        let capacity_threshold = store.layout().capacity_threshold;
        let location = format!("{}/{}", config.store.directory, config.store.store_name);

        let Some(handle) = rotator.find_live()? else {
            return Ok(Self {
                location,
                exists: false,
                last_row: 0,
                data_rows: 0,
                capacity_threshold,
                would_rotate: false,
            });
        };

        let last_row = store.last_row(&handle)?;
        Ok(Self {
            location,
            exists: true,
            last_row,
            data_rows: store.data_row_count(&handle)?,
            capacity_threshold,
            would_rotate: needs_rotation(last_row, capacity_threshold),
        })
    }
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking store status");

        println!("📊 Store Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {}", e);
                return Ok(2);
            }
        };

        let store = TabularStore::new(
            Arc::new(WorkbookBackend::new()),
            StoreLayout::from(&config.store),
        );

        let status = match StoreStatus::inspect(&store, &config) {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to inspect store");
                println!("   Error: {}", e);
                return Ok(exit_code_for(&e));
            }
        };

        println!("  Store: {}", status.location);
        if !status.exists {
            println!("  State: ⏸️  Not created yet");
            println!();
            println!("Run 'toggl-ledger sync' to create it.");
            return Ok(0);
        }

        println!("  Last Row: {}", status.last_row);
        println!("  Data Rows: {}", status.data_rows);
        println!("  Capacity Threshold: {}", status.capacity_threshold);
        if status.would_rotate {
            println!("  State: 🔄 Full, the next sync rotates it");
        } else {
            println!(
                "  State: ✅ {} row(s) until rotation",
                status.capacity_threshold - status.last_row
            );
        }
        println!();

        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sheet::{CellValue, MemoryBackend, SheetBook};
    use crate::config::parse_config;

    fn config(threshold: u32) -> LedgerConfig {
        parse_config(&format!(
            "[toggl]\napi_token = \"t\"\nuser_agent = \"me@example.com\"\nworkspace_id = \"1\"\n\
             [store]\ncapacity_threshold = {threshold}\n"
        ))
        .unwrap()
    }

    #[test]
    fn test_missing_store() {
        let config = config(10);
        let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
        let store = TabularStore::new(backend, StoreLayout::from(&config.store));

        let status = StoreStatus::inspect(&store, &config).unwrap();
        assert!(!status.exists);
        assert!(!status.would_rotate);
    }

    #[test]
    fn test_full_store_would_rotate() {
        let config = config(4);
        let backend = Arc::new(MemoryBackend::with_containers(["ledger"]));
        let mut book = SheetBook::with_sheet("log");
        let grid = book.sheet_mut("log").unwrap();
        for row in 1..=4 {
            grid.set(row, 1, CellValue::Number(f64::from(row))).unwrap();
        }
        backend.insert_file("ledger", "schedule_latest", book);
        let store = TabularStore::new(backend.clone(), StoreLayout::from(&config.store));

        let status = StoreStatus::inspect(&store, &config).unwrap();
        assert!(status.exists);
        assert_eq!(status.last_row, 4);
        assert_eq!(status.data_rows, 3);
        assert!(status.would_rotate);
        assert_eq!(backend.file_names("ledger"), vec!["schedule_latest".to_string()]);
    }
}

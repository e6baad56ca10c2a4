// Toggl Ledger - Toggl time reports to spreadsheet log sync
// Copyright (c) 2025 Toggl Ledger Contributors
// Licensed under the MIT License

//! # Toggl Ledger - Toggl time reports to spreadsheet log sync
//!
//! Toggl Ledger pulls detailed time-entry reports from the Toggl Reports API
//! and reconciles them into a tabular log kept in spreadsheet workbooks.
//!
//! ## Overview
//!
//! Each run:
//! - **Fetches** the report window (yesterday through now by default)
//! - **Opens** the live store, rotating it into a dated archive once it is full
//! - **Reconciles** every record: create a row, update it when the source is
//!   newer, or skip it
//! - **Sorts** the data area by start time, newest first, when anything changed
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (reconciliation, rotation, sync orchestration)
//! - [`adapters`] - External integrations (Toggl API, workbook storage)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toggl_ledger::adapters::sheet::WorkbookBackend;
//! use toggl_ledger::adapters::toggl::TogglClient;
//! use toggl_ledger::config::load_config;
//! use toggl_ledger::core::sync::{SyncJob, SyncOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("toggl-ledger.toml")?;
//!     let client = TogglClient::new(config.toggl.clone())?;
//!     let job = SyncJob::new(config, Arc::new(client), Arc::new(WorkbookBackend::new()))?;
//!
//!     let summary = job.run(SyncOptions::default()).await?;
//!     println!("{}", summary.counters);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`domain::Result`], whose error is
//! [`domain::SyncError`]. Records that cannot be parsed do not abort a run;
//! they are counted as skipped and listed in the run summary.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

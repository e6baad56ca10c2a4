//! Core business logic for Toggl Ledger.
//!
//! # Modules
//!
//! - [`store`] - row/column addressed access to one sheet of one file
//! - [`reconcile`] - create/update/skip decisions and row writes
//! - [`rotation`] - capacity check and retirement of full stores
//! - [`retry`] - bounded exponential backoff around remote and storage calls
//! - [`sync`] - the job tying them together, and its summary
//!
//! # Sync Workflow
//!
//! 1. **Fetch**: pull the report window from the source (with retry)
//! 2. **Open**: find the live store, rotating it if full or creating it if absent
//! 3. **Reconcile**: create, update or skip each record, in order
//! 4. **Sort**: reorder the data area by START, newest first, if anything changed
//! 5. **Report**: log the counters and return a [`sync::SyncSummary`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toggl_ledger::adapters::sheet::WorkbookBackend;
//! use toggl_ledger::adapters::toggl::TogglClient;
//! use toggl_ledger::config::load_config;
//! use toggl_ledger::core::sync::{SyncJob, SyncOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("toggl-ledger.toml")?;
//! let source = Arc::new(TogglClient::new(config.toggl.clone())?);
//! let job = SyncJob::new(config, source, Arc::new(WorkbookBackend::new()))?;
//!
//! let summary = job.run(SyncOptions::default()).await?;
//! println!("{}", summary.counters);
//! # Ok(())
//! # }
//! ```

pub mod reconcile;
pub mod retry;
pub mod rotation;
pub mod store;
pub mod sync;

//! External system integrations for Toggl Ledger.
//!
//! - [`toggl`] - Toggl Reports API client behind the [`toggl::TimeReportSource`] trait
//! - [`sheet`] - spreadsheet storage engine behind the [`sheet::SheetBackend`] trait
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies so the core can be tested with
//! in-process implementations ([`sheet::MemoryBackend`], or any type
//! implementing [`toggl::TimeReportSource`]).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toggl_ledger::adapters::sheet::{SheetBackend, WorkbookBackend};
//! use toggl_ledger::adapters::toggl::TogglClient;
//! use toggl_ledger::config::load_config;
//!
//! # fn example() -> toggl_ledger::domain::Result<()> {
//! let config = load_config("toggl-ledger.toml")?;
//! let source = TogglClient::new(config.toggl.clone())?;
//! let backend: Arc<dyn SheetBackend> = Arc::new(WorkbookBackend::new());
//! # Ok(())
//! # }
//! ```

pub mod sheet;
pub mod toggl;

//! Domain models and types for Toggl Ledger.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Records** ([`ExternalRecord`]) as delivered by the report source
//! - **Timestamp conventions** ([`timestamp`]) for cells and comparisons
//! - **Error types** ([`SyncError`], [`SourceError`], [`StorageError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SyncError>`]:
//!
//! ```rust,no_run
//! use toggl_ledger::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let config = toggl_ledger::config::load_config("toggl-ledger.toml")?;
//!     println!("{}", config.store.store_name);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod record;
pub mod result;
pub mod timestamp;

pub use errors::{RecordIssue, SourceError, StorageError, SyncError};
pub use record::ExternalRecord;
pub use result::Result;

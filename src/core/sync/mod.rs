//! Sync orchestration and reporting

pub mod job;
pub mod summary;

pub use job::{SyncJob, SyncOptions};
pub use summary::SyncSummary;

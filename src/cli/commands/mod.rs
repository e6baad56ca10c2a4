//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod init;
pub mod status;
pub mod sync;
pub mod validate;

use crate::core::sync::SyncSummary;
use crate::domain::SyncError;

/// Process exit code for a completed run: 1 when records were skipped as malformed
pub fn exit_code_for_summary(summary: &SyncSummary) -> i32 {
    if summary.is_clean() {
        0
    } else {
        1
    }
}

/// Process exit code for a failed command
///
/// Configuration problems exit with 2, an unreachable source or storage
/// with 4, anything else (a failed rotation included) with 5.
pub fn exit_code_for(error: &SyncError) -> i32 {
    match error {
        SyncError::Configuration(_) => 2,
        SyncError::Source(_) | SyncError::Storage(_) => 4,
        SyncError::Rotation(_)
        | SyncError::Serialization(_)
        | SyncError::Io(_)
        | SyncError::Other(_) => 5,
    }
}

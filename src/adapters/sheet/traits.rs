//! Storage engine traits
//!
//! This module defines the interface the tabular store is built on: named
//! files inside named containers, each holding named sheets of cells.

use super::grid::{CellValue, SortSpec};
use crate::domain::Result;
use std::fmt;

/// A file located inside a container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoredFile {
    /// Container (directory) holding the file
    pub container: String,

    /// Logical file name, without extension
    pub name: String,
}

impl StoredFile {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for StoredFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

/// Storage engine for sheet files
///
/// Implementations persist every mutation before returning, so a write is
/// visible to the next read. All row/column indices are 1-based.
///
/// Errors are reported as [`SyncError::Storage`](crate::domain::SyncError::Storage).
pub trait SheetBackend: Send + Sync {
    /// Looks up a file by name
    ///
    /// # Errors
    ///
    /// Returns `ContainerUnavailable` if the container cannot be reached.
    fn find_file(&self, container: &str, name: &str) -> Result<Option<StoredFile>>;

    /// Creates a file holding `sheet`, cloned from `template` when given
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the name is taken, `FileNotFound` if the
    /// template is missing, or `ContainerUnavailable`.
    fn create_file(
        &self,
        container: &str,
        name: &str,
        sheet: &str,
        template: Option<&str>,
    ) -> Result<StoredFile>;

    /// Whether the file holds a sheet with that name
    fn has_sheet(&self, file: &StoredFile, sheet: &str) -> Result<bool>;

    /// Renames a file inside its container
    fn rename_file(&self, file: &StoredFile, new_name: &str) -> Result<StoredFile>;

    /// Moves a file to another container, keeping its name
    fn move_file(&self, file: &StoredFile, container: &str) -> Result<StoredFile>;

    /// Index of the last non-empty row, 0 for a blank sheet
    fn last_row(&self, file: &StoredFile, sheet: &str) -> Result<u32>;

    /// Index of the last non-empty column, 0 for a blank sheet
    fn last_column(&self, file: &StoredFile, sheet: &str) -> Result<u32>;

    /// Reads a rectangular block
    fn read_range(
        &self,
        file: &StoredFile,
        sheet: &str,
        row: u32,
        column: u32,
        row_count: u32,
        column_count: u32,
    ) -> Result<Vec<Vec<CellValue>>>;

    /// Overwrites a rectangular block whose top-left corner is (`row`, `column`)
    fn write_range(
        &self,
        file: &StoredFile,
        sheet: &str,
        row: u32,
        column: u32,
        values: &[Vec<CellValue>],
    ) -> Result<()>;

    /// Reorders a block by one of its columns
    fn sort_range(&self, file: &StoredFile, sheet: &str, spec: SortSpec) -> Result<()>;
}

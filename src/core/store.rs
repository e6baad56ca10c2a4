//! Tabular store over one sheet of one file
//!
//! [`TabularStore`] is the addressable view the reconciler and the rotator
//! work against. Opening a store returns a [`StoreHandle`]; every other
//! operation takes that handle explicitly and goes straight to the backend,
//! so nothing is buffered between calls.

use crate::adapters::sheet::{CellValue, SheetBackend, SortSpec, StoredFile};
use crate::config::{ColumnSchema, DataAreaOrigin, StoreConfig};
use crate::domain::{Result, StorageError};
use std::sync::Arc;

/// Sheet name, data-area origin, capacity and column layout of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub sheet_name: String,
    pub origin: DataAreaOrigin,
    pub capacity_threshold: u32,
    pub columns: ColumnSchema,
}

impl StoreLayout {
    /// Number of columns the schema spans from the origin column
    pub fn width(&self) -> u32 {
        self.columns.width_from(self.origin.column)
    }
}

impl From<&StoreConfig> for StoreLayout {
    fn from(config: &StoreConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
            origin: config.data_area_origin,
            capacity_threshold: config.capacity_threshold,
            columns: config.columns,
        }
    }
}

/// An opened store: the file and the sheet holding the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHandle {
    pub file: StoredFile,
    pub sheet: String,
}

/// Row/column addressed access to stores sharing one layout
#[derive(Clone)]
pub struct TabularStore {
    backend: Arc<dyn SheetBackend>,
    layout: StoreLayout,
}

impl TabularStore {
    pub fn new(backend: Arc<dyn SheetBackend>, layout: StoreLayout) -> Self {
        Self { backend, layout }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn backend(&self) -> &dyn SheetBackend {
        self.backend.as_ref()
    }

    /// Looks up an existing store without creating anything
    ///
    /// # Errors
    ///
    /// Storage errors when the container cannot be reached, or `SheetNotFound`
    /// when the file exists but lacks the configured sheet.
    pub fn find(&self, container: &str, name: &str) -> Result<Option<StoreHandle>> {
        let Some(file) = self.backend.find_file(container, name)? else {
            return Ok(None);
        };

        if !self.backend.has_sheet(&file, &self.layout.sheet_name)? {
            return Err(StorageError::SheetNotFound(format!(
                "{} in {file}",
                self.layout.sheet_name
            ))
            .into());
        }

        Ok(Some(StoreHandle {
            file,
            sheet: self.layout.sheet_name.clone(),
        }))
    }

    /// Opens the named store, creating it (optionally from a template) if absent
    pub fn open(&self, container: &str, name: &str, template: Option<&str>) -> Result<StoreHandle> {
        match self.find(container, name)? {
            Some(handle) => Ok(handle),
            None => self.create(container, name, template),
        }
    }

    /// Provisions a new store
    ///
    /// Without a template the row just above the origin receives the column
    /// names, when the origin leaves room for it.
    pub fn create(&self, container: &str, name: &str, template: Option<&str>) -> Result<StoreHandle> {
        let file = self
            .backend
            .create_file(container, name, &self.layout.sheet_name, template)?;
        let handle = StoreHandle {
            file,
            sheet: self.layout.sheet_name.clone(),
        };

        if template.is_none() && self.layout.origin.row > 1 {
            let mut header = vec![CellValue::Empty; self.layout.width() as usize];
            for (label, column) in self.layout.columns.named() {
                header[(column - self.layout.origin.column) as usize] = CellValue::text(label);
            }
            self.write_range(&handle, &[header], self.layout.origin.row - 1, self.layout.origin.column)?;
        }

        tracing::info!(
            store = %handle.file,
            sheet = %handle.sheet,
            from_template = template.is_some(),
            "Created store"
        );
        Ok(handle)
    }

    /// Index of the last non-empty row, header rows included
    pub fn last_row(&self, handle: &StoreHandle) -> Result<u32> {
        self.backend.last_row(&handle.file, &handle.sheet)
    }

    /// Row the next appended record goes to; never above the origin
    pub fn next_append_row(&self, handle: &StoreHandle) -> Result<u32> {
        Ok((self.last_row(handle)? + 1).max(self.layout.origin.row))
    }

    /// Number of rows between the origin and the last row
    pub fn data_row_count(&self, handle: &StoreHandle) -> Result<u32> {
        let last_row = self.last_row(handle)?;
        Ok((last_row + 1).saturating_sub(self.layout.origin.row))
    }

    /// First data row whose cell in `column` equals `key`, if any
    pub fn locate_row(&self, handle: &StoreHandle, key: &str, column: u32) -> Result<Option<u32>> {
        let first = self.layout.origin.row;
        let last = self.last_row(handle)?;
        if last < first {
            return Ok(None);
        }

        let cells = self
            .backend
            .read_range(&handle.file, &handle.sheet, first, column, last - first + 1, 1)?;

        Ok(cells
            .iter()
            .position(|row| row.first().is_some_and(|cell| cell.to_string() == key))
            .map(|offset| first + offset as u32))
    }

    pub fn read_cell(&self, handle: &StoreHandle, row: u32, column: u32) -> Result<CellValue> {
        let cells = self
            .backend
            .read_range(&handle.file, &handle.sheet, row, column, 1, 1)?;
        Ok(cells
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or_default())
    }

    /// Reads `column_count` cells of one row
    pub fn read_row(&self, handle: &StoreHandle, row: u32, column: u32, column_count: u32) -> Result<Vec<CellValue>> {
        let cells = self
            .backend
            .read_range(&handle.file, &handle.sheet, row, column, 1, column_count)?;
        Ok(cells.into_iter().next().unwrap_or_default())
    }

    pub fn write_range(
        &self,
        handle: &StoreHandle,
        values: &[Vec<CellValue>],
        start_row: u32,
        start_column: u32,
    ) -> Result<()> {
        self.backend
            .write_range(&handle.file, &handle.sheet, start_row, start_column, values)
    }

    pub fn sort_range(&self, handle: &StoreHandle, spec: SortSpec) -> Result<()> {
        self.backend.sort_range(&handle.file, &handle.sheet, spec)
    }

    /// Sorts the whole data area by `column`
    pub fn sort_data_area(&self, handle: &StoreHandle, column: u32, ascending: bool) -> Result<()> {
        let row_count = self.data_row_count(handle)?;
        if row_count == 0 {
            return Ok(());
        }
        let last_column = self.backend.last_column(&handle.file, &handle.sheet)?;
        let column_count = (last_column + 1)
            .saturating_sub(self.layout.origin.column)
            .max(self.layout.width());

        self.sort_range(
            handle,
            SortSpec {
                by_column: column,
                ascending,
                from_row: self.layout.origin.row,
                from_column: self.layout.origin.column,
                row_count,
                column_count,
            },
        )
    }

    /// True once the last row has reached the capacity threshold
    pub fn is_at_capacity(&self, handle: &StoreHandle) -> Result<bool> {
        Ok(self.last_row(handle)? >= self.layout.capacity_threshold)
    }

    pub fn rename(&self, handle: &StoreHandle, new_name: &str) -> Result<StoreHandle> {
        let file = self.backend.rename_file(&handle.file, new_name)?;
        Ok(StoreHandle {
            file,
            sheet: handle.sheet.clone(),
        })
    }

    pub fn relocate(&self, handle: &StoreHandle, container: &str) -> Result<StoreHandle> {
        let file = self.backend.move_file(&handle.file, container)?;
        Ok(StoreHandle {
            file,
            sheet: handle.sheet.clone(),
        })
    }
}

//! Spreadsheet files on the local filesystem
//!
//! Containers are directories and files are `.xlsx` workbooks named
//! `{name}.xlsx`. Workbooks are read with calamine and written back whole with
//! rust_xlsxwriter after every mutation, so only cell values survive a write:
//! formatting from a template is kept until the first write.

use super::grid::{CellValue, SheetBook, SheetGrid, SortSpec};
use super::traits::{SheetBackend, StoredFile};
use crate::domain::{Result, StorageError};
use calamine::{open_workbook, DataType, Reader, Xlsx, XlsxError};
use rust_xlsxwriter::Workbook;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// File extension of stored workbooks
pub const WORKBOOK_EXTENSION: &str = "xlsx";

/// Sheet backend over `.xlsx` files in local directories
///
/// Loaded workbooks are cached for the lifetime of the backend; every write
/// goes through to disk before returning.
#[derive(Debug, Default)]
pub struct WorkbookBackend {
    books: Mutex<HashMap<PathBuf, SheetBook>>,
}

impl WorkbookBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the workbook for `name` inside `container`
    pub fn file_path(container: &str, name: &str) -> PathBuf {
        Path::new(container).join(format!("{name}.{WORKBOOK_EXTENSION}"))
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<PathBuf, SheetBook>> {
        self.books.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_sheet<T>(
        &self,
        file: &StoredFile,
        sheet: &str,
        f: impl FnOnce(&SheetGrid) -> Result<T>,
    ) -> Result<T> {
        let path = Self::file_path(&file.container, &file.name);
        let mut cache = self.cache();
        let book = cached_book(&mut cache, &path)?;
        let grid = book
            .sheet(sheet)
            .ok_or_else(|| StorageError::SheetNotFound(format!("{sheet} in {file}")))?;
        f(grid)
    }

    fn with_sheet_mut(
        &self,
        file: &StoredFile,
        sheet: &str,
        f: impl FnOnce(&mut SheetGrid) -> Result<()>,
    ) -> Result<()> {
        let path = Self::file_path(&file.container, &file.name);
        let mut cache = self.cache();
        let book = cached_book(&mut cache, &path)?;
        let mut updated = book.clone();
        let grid = updated
            .sheet_mut(sheet)
            .ok_or_else(|| StorageError::SheetNotFound(format!("{sheet} in {file}")))?;
        f(grid)?;
        save_book(&path, &updated)?;
        *book = updated;
        Ok(())
    }
}

impl SheetBackend for WorkbookBackend {
    fn find_file(&self, container: &str, name: &str) -> Result<Option<StoredFile>> {
        container_dir(container)?;
        let path = Self::file_path(container, name);
        Ok(path.is_file().then(|| StoredFile::new(container, name)))
    }

    fn create_file(
        &self,
        container: &str,
        name: &str,
        sheet: &str,
        template: Option<&str>,
    ) -> Result<StoredFile> {
        container_dir(container)?;
        let path = Self::file_path(container, name);
        if path.exists() {
            return Err(StorageError::AlreadyExists(path.display().to_string()).into());
        }

        let book = match template {
            Some(template) => {
                let template_path = Path::new(template);
                if !template_path.is_file() {
                    return Err(StorageError::FileNotFound(format!("template {template}")).into());
                }
                fs::copy(template_path, &path).map_err(|e| write_failed(&path, e))?;
                let mut book = load_book(&path)?;
                if book.ensure_sheet(sheet) {
                    save_book(&path, &book)?;
                }
                book
            }
            None => {
                let book = SheetBook::with_sheet(sheet);
                save_book(&path, &book)?;
                book
            }
        };

        tracing::debug!(path = %path.display(), sheet = sheet, "Created workbook");
        self.cache().insert(path, book);
        Ok(StoredFile::new(container, name))
    }

    fn has_sheet(&self, file: &StoredFile, sheet: &str) -> Result<bool> {
        let path = Self::file_path(&file.container, &file.name);
        let mut cache = self.cache();
        Ok(cached_book(&mut cache, &path)?.has_sheet(sheet))
    }

    fn rename_file(&self, file: &StoredFile, new_name: &str) -> Result<StoredFile> {
        let from = Self::file_path(&file.container, &file.name);
        let to = Self::file_path(&file.container, new_name);
        if !from.is_file() {
            return Err(StorageError::FileNotFound(from.display().to_string()).into());
        }
        if to.exists() {
            return Err(StorageError::AlreadyExists(to.display().to_string()).into());
        }

        fs::rename(&from, &to).map_err(|e| write_failed(&to, e))?;
        self.cache().remove(&from);
        Ok(StoredFile::new(file.container.clone(), new_name))
    }

    fn move_file(&self, file: &StoredFile, container: &str) -> Result<StoredFile> {
        container_dir(container)?;
        let from = Self::file_path(&file.container, &file.name);
        let to = Self::file_path(container, &file.name);
        if !from.is_file() {
            return Err(StorageError::FileNotFound(from.display().to_string()).into());
        }
        if to.exists() {
            return Err(StorageError::AlreadyExists(to.display().to_string()).into());
        }

        // rename fails across filesystems
        if fs::rename(&from, &to).is_err() {
            fs::copy(&from, &to).map_err(|e| write_failed(&to, e))?;
            fs::remove_file(&from).map_err(|e| write_failed(&from, e))?;
        }
        self.cache().remove(&from);
        Ok(StoredFile::new(container, file.name.clone()))
    }

    fn last_row(&self, file: &StoredFile, sheet: &str) -> Result<u32> {
        self.with_sheet(file, sheet, |grid| Ok(grid.last_row()))
    }

    fn last_column(&self, file: &StoredFile, sheet: &str) -> Result<u32> {
        self.with_sheet(file, sheet, |grid| Ok(grid.last_column()))
    }

    fn read_range(
        &self,
        file: &StoredFile,
        sheet: &str,
        row: u32,
        column: u32,
        row_count: u32,
        column_count: u32,
    ) -> Result<Vec<Vec<CellValue>>> {
        self.with_sheet(file, sheet, |grid| {
            Ok(grid.read_range(row, column, row_count, column_count)?)
        })
    }

    fn write_range(
        &self,
        file: &StoredFile,
        sheet: &str,
        row: u32,
        column: u32,
        values: &[Vec<CellValue>],
    ) -> Result<()> {
        self.with_sheet_mut(file, sheet, |grid| Ok(grid.write_range(row, column, values)?))
    }

    fn sort_range(&self, file: &StoredFile, sheet: &str, spec: SortSpec) -> Result<()> {
        self.with_sheet_mut(file, sheet, |grid| Ok(grid.sort_range(spec)?))
    }
}

fn container_dir(container: &str) -> Result<&Path> {
    let dir = Path::new(container);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(StorageError::ContainerUnavailable(format!("directory {container} does not exist")).into())
    }
}

fn cached_book<'a>(
    cache: &'a mut HashMap<PathBuf, SheetBook>,
    path: &Path,
) -> Result<&'a mut SheetBook> {
    if !cache.contains_key(path) {
        let book = load_book(path)?;
        cache.insert(path.to_path_buf(), book);
    }
    cache
        .get_mut(path)
        .ok_or_else(|| StorageError::ReadFailed(path.display().to_string()).into())
}

fn read_failed(path: &Path, e: impl Display) -> StorageError {
    StorageError::ReadFailed(format!("{}: {e}", path.display()))
}

fn write_failed(path: &Path, e: impl Display) -> StorageError {
    StorageError::WriteFailed(format!("{}: {e}", path.display()))
}

fn load_book(path: &Path) -> Result<SheetBook> {
    if !path.is_file() {
        return Err(StorageError::FileNotFound(path.display().to_string()).into());
    }

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: XlsxError| read_failed(path, e))?;
    let names: Vec<String> = workbook.sheet_names().to_vec();

    let mut book = SheetBook::default();
    for name in names {
        let mut grid = SheetGrid::new();
        if let Some(range) = workbook.worksheet_range(&name) {
            let range = range.map_err(|e| read_failed(path, e))?;
            let (row0, col0) = range.start().unwrap_or((0, 0));
            for (r, c, value) in range.cells() {
                let cell = cell_value(value);
                if !cell.is_empty() {
                    grid.set(row0 + r as u32 + 1, col0 + c as u32 + 1, cell)?;
                }
            }
        }
        book.insert_sheet(&name, grid);
    }

    Ok(book)
}

fn cell_value(value: &DataType) -> CellValue {
    match value {
        DataType::String(text) => CellValue::text(text.clone()),
        DataType::Float(number) => CellValue::Number(*number),
        DataType::Int(number) => CellValue::Number(*number as f64),
        DataType::Bool(flag) => CellValue::Text(flag.to_string()),
        DataType::Empty => CellValue::Empty,
        other => CellValue::text(other.to_string()),
    }
}

/// Writes the whole book next to `path` and swaps it into place
fn save_book(path: &Path, book: &SheetBook) -> Result<()> {
    let mut workbook = Workbook::new();

    for (name, grid) in book.sheets() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name).map_err(|e| write_failed(path, e))?;

        for (row, column, value) in grid.cells() {
            let (r, c) = (row - 1, (column - 1) as u16);
            match value {
                CellValue::Text(text) => {
                    worksheet
                        .write_string(r, c, text.as_str())
                        .map_err(|e| write_failed(path, e))?;
                }
                CellValue::Number(number) => {
                    worksheet
                        .write_number(r, c, *number)
                        .map_err(|e| write_failed(path, e))?;
                }
                CellValue::Empty => {}
            }
        }
    }

    let staging = path.with_extension(format!("{WORKBOOK_EXTENSION}.partial"));
    workbook
        .save(&staging)
        .map_err(|e| write_failed(path, e))?;
    fs::rename(&staging, path).map_err(|e| write_failed(path, e))?;
    Ok(())
}

//! In-process sheet backend
//!
//! Keeps every file in memory, keyed by container and name. Used by tests and
//! by anything that needs a store without touching the filesystem. Failures can
//! be injected per operation to exercise retry and rotation error paths.

use super::grid::{CellValue, SheetBook, SheetGrid, SortSpec};
use super::traits::{SheetBackend, StoredFile};
use crate::domain::{Result, StorageError};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Find,
    Create,
    Rename,
    Move,
    Read,
    Write,
    Sort,
}

#[derive(Debug, Default)]
struct MemoryState {
    containers: HashSet<String>,
    files: HashMap<(String, String), SheetBook>,
    templates: HashMap<String, SheetBook>,
    failures: HashMap<BackendOp, usize>,
    calls: HashMap<BackendOp, usize>,
}

impl MemoryState {
    /// Counts the call and consumes one injected failure, if any
    fn check(&mut self, op: BackendOp, target: &str) -> Result<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        match self.failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                let message = format!("injected {op:?} failure on {target}");
                Err(match op {
                    BackendOp::Find => StorageError::ContainerUnavailable(message),
                    BackendOp::Read => StorageError::ReadFailed(message),
                    _ => StorageError::WriteFailed(message),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn require_container(&self, container: &str) -> Result<()> {
        if self.containers.contains(container) {
            Ok(())
        } else {
            Err(StorageError::ContainerUnavailable(container.to_string()).into())
        }
    }

    fn book(&self, file: &StoredFile) -> Result<&SheetBook> {
        self.files
            .get(&key(&file.container, &file.name))
            .ok_or_else(|| StorageError::FileNotFound(file.to_string()).into())
    }

    fn grid(&self, file: &StoredFile, sheet: &str) -> Result<&SheetGrid> {
        self.book(file)?
            .sheet(sheet)
            .ok_or_else(|| StorageError::SheetNotFound(format!("{sheet} in {file}")).into())
    }

    fn grid_mut(&mut self, file: &StoredFile, sheet: &str) -> Result<&mut SheetGrid> {
        self.files
            .get_mut(&key(&file.container, &file.name))
            .ok_or_else(|| StorageError::FileNotFound(file.to_string()))?
            .sheet_mut(sheet)
            .ok_or_else(|| StorageError::SheetNotFound(format!("{sheet} in {file}")).into())
    }
}

fn key(container: &str, name: &str) -> (String, String) {
    (container.to_string(), name.to_string())
}

/// Sheet backend holding every file in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Backend with the given containers already reachable
    pub fn with_containers<I, S>(containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::default();
        {
            let mut state = backend.state();
            state.containers.extend(containers.into_iter().map(Into::into));
        }
        backend
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes a container reachable
    pub fn add_container(&self, container: &str) {
        self.state().containers.insert(container.to_string());
    }

    /// Registers a template that `create_file` can clone
    pub fn add_template(&self, reference: &str, book: SheetBook) {
        self.state().templates.insert(reference.to_string(), book);
    }

    /// Stores a file directly, replacing any previous one
    pub fn insert_file(&self, container: &str, name: &str, book: SheetBook) -> StoredFile {
        let mut state = self.state();
        state.containers.insert(container.to_string());
        state.files.insert(key(container, name), book);
        StoredFile::new(container, name)
    }

    /// Snapshot of one sheet
    pub fn grid(&self, file: &StoredFile, sheet: &str) -> Option<SheetGrid> {
        self.state().grid(file, sheet).ok().cloned()
    }

    /// Names of the files in a container, sorted
    pub fn file_names(&self, container: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .state()
            .files
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, n)| n.clone())
            .collect();
        names.sort();
        names
    }

    /// Makes the next `times` calls of `op` fail
    pub fn fail_next(&self, op: BackendOp, times: usize) {
        self.state().failures.insert(op, times);
    }

    /// Makes every call of `op` fail until [`clear_failures`](Self::clear_failures)
    pub fn fail_always(&self, op: BackendOp) {
        self.fail_next(op, usize::MAX);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// How many times `op` was attempted, failed attempts included
    pub fn calls(&self, op: BackendOp) -> usize {
        self.state().calls.get(&op).copied().unwrap_or(0)
    }
}

impl SheetBackend for MemoryBackend {
    fn find_file(&self, container: &str, name: &str) -> Result<Option<StoredFile>> {
        let mut state = self.state();
        state.check(BackendOp::Find, container)?;
        state.require_container(container)?;
        Ok(state
            .files
            .contains_key(&key(container, name))
            .then(|| StoredFile::new(container, name)))
    }

    fn create_file(
        &self,
        container: &str,
        name: &str,
        sheet: &str,
        template: Option<&str>,
    ) -> Result<StoredFile> {
        let mut state = self.state();
        state.check(BackendOp::Create, name)?;
        state.require_container(container)?;
        if state.files.contains_key(&key(container, name)) {
            return Err(StorageError::AlreadyExists(format!("{container}/{name}")).into());
        }

        let mut book = match template {
            Some(reference) => state
                .templates
                .get(reference)
                .cloned()
                .ok_or_else(|| StorageError::FileNotFound(format!("template {reference}")))?,
            None => SheetBook::default(),
        };
        book.ensure_sheet(sheet);
        state.files.insert(key(container, name), book);
        Ok(StoredFile::new(container, name))
    }

    fn has_sheet(&self, file: &StoredFile, sheet: &str) -> Result<bool> {
        let mut state = self.state();
        state.check(BackendOp::Find, &file.name)?;
        Ok(state.book(file)?.has_sheet(sheet))
    }

    fn rename_file(&self, file: &StoredFile, new_name: &str) -> Result<StoredFile> {
        let mut state = self.state();
        state.check(BackendOp::Rename, &file.name)?;
        let target = key(&file.container, new_name);
        if state.files.contains_key(&target) {
            return Err(StorageError::AlreadyExists(format!("{}/{new_name}", file.container)).into());
        }
        let book = state
            .files
            .remove(&key(&file.container, &file.name))
            .ok_or_else(|| StorageError::FileNotFound(file.to_string()))?;
        state.files.insert(target, book);
        Ok(StoredFile::new(file.container.clone(), new_name))
    }

    fn move_file(&self, file: &StoredFile, container: &str) -> Result<StoredFile> {
        let mut state = self.state();
        state.check(BackendOp::Move, &file.name)?;
        state.require_container(container)?;
        let target = key(container, &file.name);
        if state.files.contains_key(&target) {
            return Err(StorageError::AlreadyExists(format!("{container}/{}", file.name)).into());
        }
        let book = state
            .files
            .remove(&key(&file.container, &file.name))
            .ok_or_else(|| StorageError::FileNotFound(file.to_string()))?;
        state.files.insert(target, book);
        Ok(StoredFile::new(container, file.name.clone()))
    }

    fn last_row(&self, file: &StoredFile, sheet: &str) -> Result<u32> {
        let mut state = self.state();
        state.check(BackendOp::Read, &file.name)?;
        Ok(state.grid(file, sheet)?.last_row())
    }

    fn last_column(&self, file: &StoredFile, sheet: &str) -> Result<u32> {
        let mut state = self.state();
        state.check(BackendOp::Read, &file.name)?;
        Ok(state.grid(file, sheet)?.last_column())
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
        let mut state = self.state();
        state.check(BackendOp::Read, &file.name)?;
        Ok(state
            .grid(file, sheet)?
            .read_range(row, column, row_count, column_count)?)
    }

    fn write_range(
        &self,
        file: &StoredFile,
        sheet: &str,
        row: u32,
        column: u32,
        values: &[Vec<CellValue>],
    ) -> Result<()> {
        let mut state = self.state();
        state.check(BackendOp::Write, &file.name)?;
        Ok(state.grid_mut(file, sheet)?.write_range(row, column, values)?)
    }

    fn sort_range(&self, file: &StoredFile, sheet: &str, spec: SortSpec) -> Result<()> {
        let mut state = self.state();
        state.check(BackendOp::Sort, &file.name)?;
        Ok(state.grid_mut(file, sheet)?.sort_range(spec)?)
    }
}

//! Sheet storage engine
//!
//! - [`SheetBackend`] - the storage interface (files, sheets, cell ranges)
//! - [`WorkbookBackend`] - `.xlsx` workbooks in local directories
//! - [`MemoryBackend`] - in-process files with failure injection
//! - [`SheetGrid`] / [`CellValue`] - the cell model shared by both

pub mod grid;
pub mod memory;
pub mod traits;
pub mod workbook;

pub use grid::{CellValue, SheetBook, SheetGrid, SortSpec};
pub use memory::{BackendOp, MemoryBackend};
pub use traits::{SheetBackend, StoredFile};
pub use workbook::WorkbookBackend;

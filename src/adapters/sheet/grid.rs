//! In-memory cell grid shared by every sheet backend
//!
//! All addressing is 1-based: row 1 / column 1 is the top-left cell. The grid
//! grows on write and never shrinks; trailing empty cells do not count towards
//! [`SheetGrid::last_row`] or [`SheetGrid::last_column`].

use crate::domain::StorageError;
use std::cmp::Ordering;
use std::fmt;

/// Largest row index a worksheet can address
pub const MAX_ROWS: u32 = 1_048_576;

/// Largest column index a worksheet can address
pub const MAX_COLUMNS: u32 = 16_384;

/// Value of a single cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Builds a text cell; an empty string becomes [`CellValue::Empty`]
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Ascending order among non-empty cells: numbers first, then text
    fn ascending_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Number(_), _) => Ordering::Less,
            (_, CellValue::Number(_)) => Ordering::Greater,
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Rectangular block to reorder by one of its columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// Column whose values order the rows (absolute index)
    pub by_column: u32,
    pub ascending: bool,
    pub from_row: u32,
    pub from_column: u32,
    pub row_count: u32,
    pub column_count: u32,
}

/// Cells of one worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetGrid {
    rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the last row holding a non-empty cell, 0 for a blank sheet
    pub fn last_row(&self) -> u32 {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(0, |idx| idx as u32 + 1)
    }

    /// Index of the last column holding a non-empty cell, 0 for a blank sheet
    pub fn last_column(&self) -> u32 {
        self.rows
            .iter()
            .filter_map(|row| row.iter().rposition(|cell| !cell.is_empty()))
            .max()
            .map_or(0, |idx| idx as u32 + 1)
    }

    /// Reads one cell; addresses beyond the used area are empty
    pub fn get(&self, row: u32, column: u32) -> CellValue {
        if row == 0 || column == 0 {
            return CellValue::Empty;
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|cells| cells.get(column as usize - 1))
            .cloned()
            .unwrap_or_default()
    }

    /// Writes one cell, growing the grid as needed
    pub fn set(&mut self, row: u32, column: u32, value: CellValue) -> Result<(), StorageError> {
        check_address(row, column)?;
        let (r, c) = (row as usize - 1, column as usize - 1);
        if value.is_empty() && r >= self.rows.len() {
            return Ok(());
        }
        if r >= self.rows.len() {
            self.rows.resize_with(r + 1, Vec::new);
        }
        let cells = &mut self.rows[r];
        if c >= cells.len() {
            if value.is_empty() {
                return Ok(());
            }
            cells.resize_with(c + 1, CellValue::default);
        }
        cells[c] = value;
        Ok(())
    }

    /// Reads a `row_count` x `column_count` block starting at (`row`, `column`)
    pub fn read_range(
        &self,
        row: u32,
        column: u32,
        row_count: u32,
        column_count: u32,
    ) -> Result<Vec<Vec<CellValue>>, StorageError> {
        check_block(row, column, row_count, column_count)?;
        Ok((row..row + row_count)
            .map(|r| (column..column + column_count).map(|c| self.get(r, c)).collect())
            .collect())
    }

    /// Overwrites a block whose top-left corner is (`row`, `column`)
    ///
    /// Rows of `values` may differ in length; each row overwrites exactly as
    /// many cells as it holds.
    pub fn write_range(
        &mut self,
        row: u32,
        column: u32,
        values: &[Vec<CellValue>],
    ) -> Result<(), StorageError> {
        let width = values.iter().map(Vec::len).max().unwrap_or(0) as u32;
        check_block(row, column, values.len() as u32, width.max(1))?;
        for (dr, cells) in values.iter().enumerate() {
            for (dc, value) in cells.iter().enumerate() {
                self.set(row + dr as u32, column + dc as u32, value.clone())?;
            }
        }
        Ok(())
    }

    /// Stable sort of the block described by `spec`
    ///
    /// Empty keys always go last, whichever the direction.
    pub fn sort_range(&mut self, spec: SortSpec) -> Result<(), StorageError> {
        if spec.row_count == 0 || spec.column_count == 0 {
            return Ok(());
        }
        check_block(spec.from_row, spec.from_column, spec.row_count, spec.column_count)?;
        if spec.by_column < spec.from_column
            || spec.by_column >= spec.from_column + spec.column_count
        {
            return Err(StorageError::InvalidRange(format!(
                "sort column {} lies outside columns {}..{}",
                spec.by_column,
                spec.from_column,
                spec.from_column + spec.column_count - 1
            )));
        }

        let key_offset = (spec.by_column - spec.from_column) as usize;
        let mut block = self.read_range(
            spec.from_row,
            spec.from_column,
            spec.row_count,
            spec.column_count,
        )?;

        block.sort_by(|a, b| {
            let (ka, kb) = (&a[key_offset], &b[key_offset]);
            match (ka.is_empty(), kb.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) if spec.ascending => ka.ascending_cmp(kb),
                (false, false) => kb.ascending_cmp(ka),
            }
        });

        self.write_range(spec.from_row, spec.from_column, &block)
    }

    /// Non-empty cells as (row, column, value), row-major
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, &CellValue)> {
        self.rows.iter().enumerate().flat_map(|(r, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.is_empty())
                .map(move |(c, value)| (r as u32 + 1, c as u32 + 1, value))
        })
    }
}

fn check_address(row: u32, column: u32) -> Result<(), StorageError> {
    if row == 0 || column == 0 {
        return Err(StorageError::InvalidRange(format!(
            "cell ({row}, {column}) is not addressable; indices start at 1"
        )));
    }
    if row > MAX_ROWS || column > MAX_COLUMNS {
        return Err(StorageError::InvalidRange(format!(
            "cell ({row}, {column}) exceeds the sheet limits"
        )));
    }
    Ok(())
}

fn check_block(row: u32, column: u32, row_count: u32, column_count: u32) -> Result<(), StorageError> {
    check_address(row, column)?;
    if row_count == 0 || column_count == 0 {
        return Ok(());
    }
    check_address(
        row.saturating_add(row_count - 1),
        column.saturating_add(column_count - 1),
    )
}

/// Named sheets of one file, in tab order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetBook {
    sheets: Vec<(String, SheetGrid)>,
}

impl SheetBook {
    /// Book with a single blank sheet
    pub fn with_sheet(name: &str) -> Self {
        Self {
            sheets: vec![(name.to_string(), SheetGrid::new())],
        }
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheets.iter().any(|(n, _)| n == name)
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetGrid> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, g)| g)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetGrid> {
        self.sheets
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
    }

    /// Appends a blank sheet unless one with that name exists; returns true if added
    pub fn ensure_sheet(&mut self, name: &str) -> bool {
        if self.has_sheet(name) {
            return false;
        }
        self.sheets.push((name.to_string(), SheetGrid::new()));
        true
    }

    /// Adds or replaces a sheet
    pub fn insert_sheet(&mut self, name: &str, grid: SheetGrid) {
        match self.sheet_mut(name) {
            Some(existing) => *existing = grid,
            None => self.sheets.push((name.to_string(), grid)),
        }
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&str, &SheetGrid)> {
        self.sheets.iter().map(|(n, g)| (n.as_str(), g))
    }
}

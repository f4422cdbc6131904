//! The tabular cell-grid abstraction the extraction engine reads from.
//!
//! A [`CellGrid`] is a read-only, zero-based `(row, column)` addressable
//! region of typed cells with a used range. [`Grid`] is the in-memory
//! implementation produced by the xlsx reader and used throughout the tests;
//! [`Workbook`] is an ordered list of named sheets.

mod address;

pub use address::{column_index, column_letter, CellRef};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// A non-empty cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// The numeric value, if the cell holds a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    /// The text value, if the cell holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Number(_) => None,
            CellValue::Text(s) => Some(s),
        }
    }

    /// Whether the cell carries nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// Bounds of the occupied region of a grid, all inclusive and zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedRange {
    pub min_row: u32,
    pub max_row: u32,
    pub min_col: u32,
    pub max_col: u32,
}

impl UsedRange {
    /// Row indices covered by the range.
    pub fn rows(&self) -> RangeInclusive<u32> {
        self.min_row..=self.max_row
    }

    /// Column indices covered by the range.
    pub fn cols(&self) -> RangeInclusive<u32> {
        self.min_col..=self.max_col
    }
}

/// Read-only access to a sheet's cells.
///
/// Implementations must return `None` for empty cells so callers never have
/// to distinguish "missing" from "blank".
pub trait CellGrid {
    /// The value at `(row, col)`, or `None` if the cell is empty.
    fn cell(&self, row: u32, col: u32) -> Option<&CellValue>;

    /// The occupied region, or `None` for an empty sheet.
    fn used_range(&self) -> Option<UsedRange>;

    /// The cell rendered as text.
    fn text(&self, row: u32, col: u32) -> Option<String> {
        self.cell(row, col).map(|v| v.to_string())
    }
}

/// An in-memory sparse grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl Grid {
    /// Create an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from rows of values starting at `A1`. Blank text is skipped.
    pub fn from_rows<R, C, V>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = V>,
        V: Into<CellValue>,
    {
        let mut grid = Self::new();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                grid.set(r as u32, c as u32, value);
            }
        }
        grid
    }

    /// Store a value. Blank text clears the cell instead.
    pub fn set(&mut self, row: u32, col: u32, value: impl Into<CellValue>) {
        let value = value.into();
        if value.is_blank() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, row: u32, col: u32, value: impl Into<CellValue>) -> Self {
        self.set(row, col, value);
        self
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl CellGrid for Grid {
    fn cell(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    fn used_range(&self) -> Option<UsedRange> {
        let (&(min_row, _), _) = self.cells.first_key_value()?;
        let (&(max_row, _), _) = self.cells.last_key_value()?;
        let (min_col, max_col) = self
            .cells
            .keys()
            .fold((u32::MAX, 0), |(lo, hi), &(_, c)| (lo.min(c), hi.max(c)));

        Some(UsedRange {
            min_row,
            max_row,
            min_col,
            max_col,
        })
    }
}

/// A named sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
}

/// An ordered collection of sheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Create an empty workbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet.
    pub fn add_sheet(&mut self, name: impl Into<String>, grid: Grid) {
        self.sheets.push(Sheet {
            name: name.into(),
            grid,
        });
    }

    /// Builder-style [`add_sheet`](Self::add_sheet).
    pub fn with_sheet(mut self, name: impl Into<String>, grid: Grid) -> Self {
        self.add_sheet(name, grid);
        self
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look a sheet up by its exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_used_range() {
        let grid = Grid::new()
            .with(3, 5, "x")
            .with(1, 2, 10.0)
            .with(7, 1, "y");
        assert_eq!(
            grid.used_range(),
            Some(UsedRange {
                min_row: 1,
                max_row: 7,
                min_col: 1,
                max_col: 5,
            })
        );
        assert_eq!(Grid::new().used_range(), None);
    }

    #[test]
    fn test_blank_text_is_empty() {
        let mut grid = Grid::new().with(0, 0, "   ");
        assert!(grid.is_empty());
        grid.set(0, 0, "value");
        grid.set(0, 0, "");
        assert_eq!(grid.cell(0, 0), None);
    }

    #[test]
    fn test_from_rows() {
        let grid = Grid::from_rows(vec![vec!["a", "", "c"], vec!["", "e", ""]]);
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.text(0, 2).as_deref(), Some("c"));
        assert_eq!(grid.text(1, 1).as_deref(), Some("e"));
        assert_eq!(grid.cell(1, 0), None);
    }

    #[test]
    fn test_number_display() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Number(-12.0).to_string(), "-12");
    }

    #[test]
    fn test_workbook_lookup() {
        let wb = Workbook::new()
            .with_sheet("ENERO", Grid::new())
            .with_sheet("FEBRERO", Grid::new());
        assert_eq!(wb.sheet_names(), vec!["ENERO", "FEBRERO"]);
        assert!(wb.sheet("FEBRERO").is_some());
        assert!(wb.sheet("febrero").is_none());
    }
}

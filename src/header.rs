//! Header block discovery.
//!
//! Payroll sheets put their column labels somewhere near the top, often
//! spread over several visually merged rows. The locator finds the rows that
//! look like headers within a bounded window, widens them to one contiguous
//! block and then checks that a single "anchor" row inside the block carries
//! the labels of every required field.

use crate::error::{Error, Result};
use crate::grid::{CellGrid, UsedRange};
use crate::options::{ExtractOptions, HeaderStrategy};
use crate::schema::{FieldKey, Schema};
use crate::text::{fuzzy_match, normalize};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// The contiguous rows holding column labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderBlock {
    first_row: u32,
    last_row: u32,
    anchor_row: u32,
}

impl HeaderBlock {
    pub(crate) fn new(first_row: u32, last_row: u32, anchor_row: u32) -> Self {
        debug_assert!(first_row <= anchor_row && anchor_row <= last_row);
        Self {
            first_row,
            last_row,
            anchor_row,
        }
    }

    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    pub fn last_row(&self) -> u32 {
        self.last_row
    }

    /// The row carrying every required label.
    pub fn anchor_row(&self) -> u32 {
        self.anchor_row
    }

    pub fn rows(&self) -> RangeInclusive<u32> {
        self.first_row..=self.last_row
    }

}

/// Normalized, non-blank cells of one row, left to right.
pub(crate) fn normalized_row(
    grid: &dyn CellGrid,
    row: u32,
    range: &UsedRange,
) -> Vec<(u32, String)> {
    range
        .cols()
        .filter_map(|col| {
            let text = normalize(&grid.text(row, col)?);
            (!text.is_empty()).then_some((col, text))
        })
        .collect()
}

/// Locates the header block of a sheet.
#[derive(Debug, Clone, Copy)]
pub struct HeaderLocator<'a> {
    options: &'a ExtractOptions,
    schema: &'a Schema,
}

impl<'a> HeaderLocator<'a> {
    pub fn new(options: &'a ExtractOptions, schema: &'a Schema) -> Self {
        Self { options, schema }
    }

    /// Find the header block, or fail with a diagnostic naming what was expected.
    pub fn locate(&self, grid: &dyn CellGrid) -> Result<HeaderBlock> {
        let Some(range) = grid.used_range() else {
            return Err(Error::HeaderNotFound { scanned_rows: 0 });
        };

        let window_len = self.options.header_scan_rows.saturating_sub(1);
        let last_scanned = range
            .max_row
            .min(range.min_row.saturating_add(window_len));
        let window = range.min_row..=last_scanned;
        let scanned_rows = last_scanned - range.min_row + 1;

        let qualifying: Vec<u32> = window
            .filter(|&row| self.qualifies(grid, row, &range))
            .collect();

        let (Some(&first_row), Some(&last_row)) = (qualifying.first(), qualifying.last()) else {
            return Err(Error::HeaderNotFound { scanned_rows });
        };

        let anchor_row = self.find_anchor(grid, first_row..=last_row, &range)?;

        tracing::info!(
            first_row,
            last_row,
            anchor_row,
            matched = ?qualifying,
            "header block located"
        );

        Ok(HeaderBlock::new(first_row, last_row, anchor_row))
    }

    fn qualifies(&self, grid: &dyn CellGrid, row: u32, range: &UsedRange) -> bool {
        match self.options.header_strategy {
            HeaderStrategy::KeywordScan => {
                let cells = normalized_row(grid, row, range);
                if cells.is_empty() {
                    return false;
                }
                let hits = self
                    .schema
                    .keywords()
                    .iter()
                    .filter(|k| {
                        cells
                            .iter()
                            .any(|(_, text)| k.matches(text, self.options.header_threshold))
                    })
                    .count();
                hits >= self.options.min_keyword_hits
            }
            HeaderStrategy::ExplicitMarker => {
                grid.text(row, range.min_col).is_some_and(|text| {
                    fuzzy_match(
                        &text,
                        &[self.options.marker_token.as_str()],
                        self.options.marker_threshold,
                    )
                    .is_some()
                })
            }
        }
    }

    /// The first row in the block matching every required field.
    fn find_anchor(
        &self,
        grid: &dyn CellGrid,
        block: RangeInclusive<u32>,
        range: &UsedRange,
    ) -> Result<u32> {
        let threshold = self.options.header_threshold;
        let mut best_missing: Option<Vec<FieldKey>> = None;

        for row in block.clone() {
            let cells = normalized_row(grid, row, range);
            let missing: Vec<FieldKey> = FieldKey::REQUIRED
                .iter()
                .copied()
                .filter(|&key| {
                    !self.schema.field(key).is_some_and(|matcher| {
                        cells.iter().any(|(_, text)| matcher.matches(text, threshold))
                    })
                })
                .collect();

            if missing.is_empty() {
                return Ok(row);
            }
            if best_missing.as_ref().is_none_or(|b| missing.len() < b.len()) {
                best_missing = Some(missing);
            }
        }

        Err(Error::AnchorRowMissing {
            first_row: *block.start(),
            last_row: *block.end(),
            missing: best_missing.unwrap_or_else(|| FieldKey::REQUIRED.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use pretty_assertions::assert_eq;

    fn locate(grid: &Grid, options: &ExtractOptions) -> Result<HeaderBlock> {
        let schema = Schema::compile(options);
        HeaderLocator::new(options, &schema).locate(grid)
    }

    fn anchor_labels(grid: Grid, row: u32) -> Grid {
        grid.with(row, 0, "No.")
            .with(row, 1, "NOMBRE")
            .with(row, 2, "PUESTO")
            .with(row, 3, "ORDINARIO MENSUAL")
    }

    #[test]
    fn test_single_header_row() {
        let grid = anchor_labels(Grid::new().with(1, 1, "EMPRESA S.A."), 5)
            .with(6, 0, 1.0)
            .with(6, 1, "Ana");
        let block = locate(&grid, &ExtractOptions::default()).unwrap();
        assert_eq!(block.rows(), 5..=5);
        assert_eq!(block.anchor_row(), 5);
    }

    #[test]
    fn test_gap_between_header_rows_is_absorbed() {
        let grid = anchor_labels(Grid::new(), 3)
            .with(4, 4, "DECRETO 37-2001")
            .with(5, 5, "IGSS")
            .with(5, 6, "ISR")
            .with(6, 0, 1.0);
        let block = locate(&grid, &ExtractOptions::default()).unwrap();
        assert_eq!(block.rows().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(block.rows().count(), 3);
        assert_eq!(block.anchor_row(), 3);
    }

    #[test]
    fn test_anchor_can_be_below_first_header_row() {
        let grid = Grid::new()
            .with(2, 4, "BONIFICACION DECRETO")
            .with(2, 5, "BONIFICACION ESPECIAL")
            .with(3, 0, "No.")
            .with(3, 1, "Nombre del empleado")
            .with(3, 2, "Puesto")
            .with(3, 3, "Ordinario mensual");
        let block = locate(&grid, &ExtractOptions::default()).unwrap();
        assert_eq!(block.rows(), 2..=3);
        assert_eq!(block.anchor_row(), 3);
    }

    #[test]
    fn test_no_header_found() {
        let grid = Grid::from_rows(vec![vec!["foo", "bar"], vec!["1", "2"]]);
        let err = locate(&grid, &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, Error::HeaderNotFound { scanned_rows: 2 }));
    }

    #[test]
    fn test_header_outside_scan_window() {
        let grid = anchor_labels(Grid::new().with(0, 0, "x"), 40);
        let options = ExtractOptions::default().with_header_scan_rows(30);
        let err = locate(&grid, &options).unwrap_err();
        assert!(matches!(err, Error::HeaderNotFound { scanned_rows: 30 }));
    }

    #[test]
    fn test_empty_grid() {
        let err = locate(&Grid::new(), &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, Error::HeaderNotFound { scanned_rows: 0 }));
    }

    #[test]
    fn test_missing_anchor_names_missing_fields() {
        let grid = Grid::new()
            .with(4, 0, "No.")
            .with(4, 1, "NOMBRE")
            .with(4, 2, "PUESTO")
            .with(4, 3, "IGSS");
        let err = locate(&grid, &ExtractOptions::default()).unwrap_err();
        match err {
            Error::AnchorRowMissing {
                first_row,
                last_row,
                missing,
            } => {
                assert_eq!((first_row, last_row), (4, 4));
                assert_eq!(missing, vec![FieldKey::BaseSalary]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_explicit_marker_strategy() {
        let grid = Grid::new()
            .with(0, 1, "No.")
            .with(0, 2, "NOMBRE")
            .with(4, 0, "ENCABEZADO")
            .with(4, 1, "No.")
            .with(4, 2, "NOMBRE")
            .with(4, 3, "PUESTO")
            .with(4, 4, "ORDINARIO MENSUAL")
            .with(5, 0, "encabezdo")
            .with(5, 5, "IGSS")
            .with(6, 1, 1.0);
        let options =
            ExtractOptions::default().with_header_strategy(HeaderStrategy::ExplicitMarker);
        let block = locate(&grid, &options).unwrap();
        assert_eq!(block.rows(), 4..=5);
        assert_eq!(block.anchor_row(), 4);
    }

    #[test]
    fn test_explicit_marker_ignores_keyword_rows() {
        let grid = anchor_labels(Grid::new(), 2);
        let options =
            ExtractOptions::default().with_header_strategy(HeaderStrategy::ExplicitMarker);
        assert!(matches!(
            locate(&grid, &options),
            Err(Error::HeaderNotFound { .. })
        ));
    }
}

//! Record extraction from the data rows below the header block.

use crate::columns::{ColumnBinding, ColumnMap};
use crate::error::{Error, Result};
use crate::grid::{CellGrid, CellRef};
use crate::header::HeaderBlock;
use crate::model::{Amounts, ParseResult, Period, ReceiptRecord, Warning};
use crate::options::ExtractOptions;
use crate::schema::FieldKey;
use crate::text::normalize;
use crate::value::{parse_number, parse_receipt_date};

const MONETARY_FIELDS: [FieldKey; 6] = [
    FieldKey::BaseSalary,
    FieldKey::SpecialBonus,
    FieldKey::SocialSecurityDeduction,
    FieldKey::IncomeTaxDeduction,
    FieldKey::AdvanceDeduction,
    FieldKey::OtherDeduction,
];

/// Walk the data rows below `header` and build one record per qualifying row.
///
/// A row qualifies when its ordinal cell is numeric and its employee name has
/// at least `min_name_len` normalized characters; every other row is skipped.
/// Monetary fields are read through [`parse_number`], summing aggregate
/// bindings, and totals are always recomputed.
pub fn extract_records(
    grid: &dyn CellGrid,
    header: &HeaderBlock,
    columns: &ColumnMap,
    options: &ExtractOptions,
) -> Result<ParseResult> {
    let ordinal_col = required_column(columns, FieldKey::Ordinal)?;
    let name_col = required_column(columns, FieldKey::EmployeeName)?;
    let position_col = columns
        .get(FieldKey::Position)
        .and_then(ColumnBinding::first_column);

    let period = read_period(grid, options);
    let Some(range) = grid.used_range() else {
        return Err(Error::NoDataRows("the sheet is empty".into()));
    };

    let first_row = first_data_row(grid, header, ordinal_col, options)?;

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for row in first_row..=range.max_row {
        let Some(ordinal) = grid.cell(row, ordinal_col).and_then(parse_number) else {
            tracing::debug!(row, "skipping row without numeric ordinal");
            continue;
        };
        let Some(name) = grid.text(row, name_col).map(|t| t.trim().to_string()) else {
            tracing::debug!(row, "skipping row without employee name");
            continue;
        };
        if normalize(&name).chars().count() < options.min_name_len {
            tracing::debug!(row, name = %name, "skipping row with short employee name");
            continue;
        }

        let position = position_col
            .and_then(|col| grid.text(row, col))
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        let mut amounts = Amounts::default();
        for key in MONETARY_FIELDS {
            if let Some(binding) = columns.get(key) {
                amounts.set(key, read_amount(grid, row, key, binding, &mut warnings));
            }
        }

        records.push(ReceiptRecord::new(
            ordinal, row, &period, name, position, amounts,
        ));
    }

    if records.is_empty() {
        return Err(Error::NoDataRows(format!(
            "no row from {} to {} has a numeric ordinal and an employee name",
            u64::from(first_row) + 1,
            u64::from(range.max_row) + 1
        )));
    }

    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    tracing::info!(records = records.len(), "records extracted");

    Ok(ParseResult {
        sheet_name: None,
        company_name: period.company_name,
        period_label: period.label,
        receipt_date: period.receipt_date,
        header: header.clone(),
        columns: columns.clone(),
        records,
        warnings,
    })
}

fn required_column(columns: &ColumnMap, key: FieldKey) -> Result<u32> {
    columns
        .get(key)
        .and_then(ColumnBinding::first_column)
        .ok_or_else(|| Error::MissingColumns(vec![key]))
}

fn read_period(grid: &dyn CellGrid, options: &ExtractOptions) -> Period {
    let read = |cell: CellRef| {
        grid.text(cell.row, cell.col)
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    };

    let label = read(options.period_cell);
    Period {
        company_name: read(options.company_cell),
        receipt_date: parse_receipt_date(&label),
        label,
    }
}

/// The row right below the header, or the first of the next
/// `first_row_probe` rows whose ordinal is numeric.
fn first_data_row(
    grid: &dyn CellGrid,
    header: &HeaderBlock,
    ordinal_col: u32,
    options: &ExtractOptions,
) -> Result<u32> {
    let Some(start) = header.last_row().checked_add(1) else {
        return Err(Error::NoDataRows(
            "the header block ends on the last addressable row".into(),
        ));
    };
    let probe_end = start.saturating_add(options.first_row_probe);

    let found = (start..=probe_end)
        .find(|&row| grid.cell(row, ordinal_col).and_then(parse_number).is_some());

    match found {
        Some(row) => {
            if row != start {
                tracing::debug!(skipped = row - start, "first data row is below the header gap");
            }
            Ok(row)
        }
        None => Err(Error::NoDataRows(format!(
            "no numeric ordinal within {} rows below the header (rows {} to {})",
            options.first_row_probe,
            u64::from(start) + 1,
            u64::from(probe_end) + 1
        ))),
    }
}

/// Read a monetary field, summing aggregate bindings. Unreadable text counts as zero.
fn read_amount(
    grid: &dyn CellGrid,
    row: u32,
    key: FieldKey,
    binding: &ColumnBinding,
    warnings: &mut Vec<Warning>,
) -> f64 {
    binding
        .columns()
        .into_iter()
        .map(|col| {
            let Some(value) = grid.cell(row, col) else {
                return 0.0;
            };
            parse_number(value).unwrap_or_else(|| {
                if !value.is_blank() {
                    warnings.push(Warning::NonNumericCell {
                        row,
                        column: col,
                        field: key,
                        value: value.to_string(),
                    });
                }
                0.0
            })
        })
        .sum()
}

//! The extraction pipeline: header block, column map, records.

use crate::columns::resolve_columns;
use crate::error::{Error, Result};
use crate::extract::extract_records;
use crate::grid::{CellGrid, Sheet, Workbook};
use crate::header::HeaderLocator;
use crate::model::ParseResult;
use crate::options::ExtractOptions;
use crate::schema::Schema;
use crate::text::fuzzy_match;

/// Extracts payroll receipts from spreadsheet grids.
///
/// The label table is compiled once, so one extractor can parse any number
/// of sheets.
///
/// # Example
///
/// ```
/// use paystub::grid::Grid;
/// use paystub::Extractor;
///
/// let grid = Grid::from_rows(vec![
///     vec!["No.", "NOMBRE", "PUESTO", "ORDINARIO MENSUAL", "IGSS"],
///     vec!["1", "Ana Lopez", "Contadora", "3000", "144.90"],
/// ]);
///
/// let result = Extractor::default().parse_grid(&grid)?;
/// assert_eq!(result.records.len(), 1);
/// assert_eq!(result.records[0].net_pay(), 2855.10);
/// # Ok::<(), paystub::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    options: ExtractOptions,
    schema: Schema,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

impl Extractor {
    /// Create an extractor from options.
    ///
    /// Options built in code are not validated here; use
    /// [`ExtractOptions::validate`] or [`ExtractOptions::from_toml`] for
    /// untrusted input.
    pub fn new(options: ExtractOptions) -> Self {
        let schema = Schema::compile(&options);
        Self { options, schema }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Parse a single grid.
    pub fn parse_grid(&self, grid: &dyn CellGrid) -> Result<ParseResult> {
        let header = HeaderLocator::new(&self.options, &self.schema).locate(grid)?;
        let resolution =
            resolve_columns(grid, &header, &self.schema, self.options.header_threshold)?;

        let mut result = extract_records(grid, &header, &resolution.columns, &self.options)?;

        let mut warnings = resolution.warnings;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;

        Ok(result)
    }

    /// Select a sheet by name and parse it.
    ///
    /// An exact name wins; otherwise the closest name within the sheet
    /// threshold is used.
    pub fn parse(&self, workbook: &Workbook, selector: &str) -> Result<ParseResult> {
        let sheet = self.select_sheet(workbook, selector)?;
        tracing::info!(sheet = %sheet.name, selector, "parsing sheet");

        let mut result = self.parse_grid(&sheet.grid)?;
        result.sheet_name = Some(sheet.name.clone());
        Ok(result)
    }

    /// Resolve a sheet selector against the workbook.
    pub fn select_sheet<'w>(&self, workbook: &'w Workbook, selector: &str) -> Result<&'w Sheet> {
        if let Some(sheet) = workbook.sheet(selector) {
            return Ok(sheet);
        }

        let names = workbook.sheet_names();
        fuzzy_match(selector, &names, self.options.sheet_threshold)
            .and_then(|hit| workbook.sheet(hit.candidate))
            .ok_or_else(|| Error::SheetNotFound {
                query: selector.to_string(),
                available: names.iter().map(|n| n.to_string()).collect(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::model::Warning;
    use crate::schema::{FieldKey, FieldSpec};
    use pretty_assertions::assert_eq;

    fn payroll() -> Grid {
        Grid::from_rows(vec![
            vec!["", ""],
            vec!["", "EMPRESA S.A."],
            vec!["", ""],
            vec!["", "DEL 1 AL 31 DE ENERO 2024"],
            vec!["No.", "NOMBRE", "PUESTO", "ORDINARIO MENSUAL", "IGSS", "ISR"],
            vec!["1", "Ana Lopez", "Contadora", "4000", "193.20", "100"],
            vec!["2", "Luis Perez", "Piloto", "3500", "169.05", "0"],
        ])
    }

    #[test]
    fn test_parse_grid() {
        let result = Extractor::default().parse_grid(&payroll()).unwrap();
        assert_eq!(result.sheet_name, None);
        assert_eq!(result.company_name, "EMPRESA S.A.");
        assert_eq!(result.receipt_date, "31 de enero de 2024");
        assert_eq!(result.header.anchor_row(), 4);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[1].employee_name(), "Luis Perez");
        assert_eq!(result.summary().total_income, 7500.0);
    }

    #[test]
    fn test_parse_selects_sheet_fuzzily() {
        let workbook = Workbook::new()
            .with_sheet("RESUMEN", Grid::new())
            .with_sheet("PLANILLA ENERO", payroll());
        let result = Extractor::default()
            .parse(&workbook, "planilla enero")
            .unwrap();
        assert_eq!(result.sheet_name.as_deref(), Some("PLANILLA ENERO"));
    }

    #[test]
    fn test_exact_sheet_name_wins() {
        let workbook = Workbook::new()
            .with_sheet("ENERO", Grid::new())
            .with_sheet("ENERO 2", payroll());
        let extractor = Extractor::default();
        let sheet = extractor.select_sheet(&workbook, "ENERO 2").unwrap();
        assert_eq!(sheet.name, "ENERO 2");
    }

    #[test]
    fn test_unknown_sheet_lists_available() {
        let workbook = Workbook::new()
            .with_sheet("ENERO", payroll())
            .with_sheet("FEBRERO", payroll());
        let err = Extractor::default()
            .parse(&workbook, "vacaciones")
            .unwrap_err();
        match err {
            Error::SheetNotFound { query, available } => {
                assert_eq!(query, "vacaciones");
                assert_eq!(available, vec!["ENERO", "FEBRERO"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolution_warnings_come_first() {
        let options = ExtractOptions::default()
            .with_field(FieldSpec::new(FieldKey::OtherDeduction, &["igss"]));
        let mut grid = payroll();
        grid.set(5, 3, "pendiente");

        let result = Extractor::new(options).parse_grid(&grid).unwrap();
        assert_eq!(result.warnings.len(), 2);
        assert!(matches!(result.warnings[0], Warning::DuplicateColumn { column: 4, .. }));
        assert!(matches!(
            result.warnings[1],
            Warning::NonNumericCell { row: 5, column: 3, .. }
        ));
    }
}

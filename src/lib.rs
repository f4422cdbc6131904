//! # paystub
//!
//! Heuristic extraction of payroll receipts from loosely structured
//! spreadsheets.
//!
//! Payroll sheets are typed by hand: the header may sit anywhere in the
//! first rows, span several merged rows, carry accents, stray punctuation
//! or typos, and split one concept (special bonuses) over several columns.
//! This crate finds the header block, maps each semantic field to its
//! column(s) by fuzzy label matching, and turns every employee row into a
//! [`ReceiptRecord`] with recomputed totals.
//!
//! ## Quick Start
//!
//! ```no_run
//! let result = paystub::parse_file("planilla.xlsx", "enero")?;
//! for record in &result.records {
//!     println!("{:<30} {:>10.2}", record.employee_name(), record.net_pay());
//! }
//! for warning in result.warning_messages() {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok::<(), paystub::Error>(())
//! ```
//!
//! ## Custom label tables
//!
//! ```no_run
//! use paystub::{ExtractOptions, Extractor};
//!
//! let options = ExtractOptions::from_path("planilla.toml")?;
//! let workbook = paystub::xlsx::XlsxReader::open("planilla.xlsx")?.read_workbook()?;
//! let result = Extractor::new(options).parse(&workbook, "PLANILLA ENERO")?;
//! # Ok::<(), paystub::Error>(())
//! ```
//!
//! ## Features
//!
//! - `xlsx` (default): read `.xlsx` workbooks into [`Workbook`]s

pub mod columns;
pub mod engine;
pub mod error;
pub mod extract;
pub mod grid;
pub mod header;
pub mod model;
pub mod options;
pub mod render;
pub mod schema;
pub mod text;
pub mod value;

#[cfg(feature = "xlsx")]
pub mod xlsx;

// Re-exports
pub use columns::{ColumnBinding, ColumnMap};
pub use engine::Extractor;
pub use error::{Error, Result};
pub use grid::{CellGrid, CellRef, CellValue, Grid, Sheet, UsedRange, Workbook};
pub use header::HeaderBlock;
pub use model::{Amounts, BatchSummary, ParseResult, Period, ReceiptRecord, Warning};
pub use options::{ExtractOptions, HeaderStrategy};
pub use schema::{FieldKey, FieldSpec};

/// Parse the sheet of `workbook` selected by `selector` with default options.
///
/// # Example
///
/// ```
/// use paystub::{Grid, Workbook};
///
/// let grid = Grid::from_rows(vec![
///     vec!["No.", "NOMBRE", "PUESTO", "ORDINARIO MENSUAL"],
///     vec!["1", "Ana Lopez", "Contadora", "3000"],
/// ]);
/// let workbook = Workbook::new().with_sheet("PLANILLA ENERO", grid);
///
/// let result = paystub::parse(&workbook, "planilla enero")?;
/// assert_eq!(result.sheet_name.as_deref(), Some("PLANILLA ENERO"));
/// assert_eq!(result.summary().net_pay, 3000.0);
/// # Ok::<(), paystub::Error>(())
/// ```
pub fn parse(workbook: &Workbook, selector: &str) -> Result<ParseResult> {
    Extractor::default().parse(workbook, selector)
}

/// Read an `.xlsx` file and parse the sheet selected by `selector`.
#[cfg(feature = "xlsx")]
pub fn parse_file(path: impl AsRef<std::path::Path>, selector: &str) -> Result<ParseResult> {
    let workbook = xlsx::XlsxReader::open(path)?.read_workbook()?;
    parse(&workbook, selector)
}

/// Find the sheet name closest to `query`, if any is close enough.
///
/// # Example
///
/// ```
/// let names = ["ENERO 2024", "FEBRERO 2024", "RESUMEN"];
/// assert_eq!(paystub::find_sheet("febrero", &names), Some("FEBRERO 2024"));
/// assert_eq!(paystub::find_sheet("vacaciones", &names), None);
/// ```
pub fn find_sheet<'a, S: AsRef<str>>(query: &str, names: &'a [S]) -> Option<&'a str> {
    text::find_sheet(query, names)
}

//! Error types for the paystub library.

use crate::schema::FieldKey;
use std::io;
use thiserror::Error;

/// Result type alias for paystub operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a workbook or extracting payroll records.
///
/// Every variant aborts the parse. Recoverable data problems are reported as
/// [`Warning`](crate::model::Warning)s on the result instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a spreadsheet workbook.
    #[error("Unknown file format")]
    UnknownFormat,

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// Invalid or malformed data in the workbook.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A required workbook part is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),

    /// Configuration could not be parsed or failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error serializing a parse result.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No sheet matched the selector, even approximately.
    #[error("Sheet \"{query}\" not found. Available sheets: {}", .available.join(", "))]
    SheetNotFound { query: String, available: Vec<String> },

    /// No row in the scan window looked like a header row.
    #[error("No header rows found in the first {scanned_rows} rows (expected labels such as No., NOMBRE, PUESTO, ORDINARIO MENSUAL)")]
    HeaderNotFound { scanned_rows: u32 },

    /// The header block exists but no single row carries all required labels.
    #[error(
        "Header rows {}-{} contain no row with all required labels; missing: {}",
        one_based(.first_row),
        one_based(.last_row),
        join_keys(.missing)
    )]
    AnchorRowMissing {
        first_row: u32,
        last_row: u32,
        missing: Vec<FieldKey>,
    },

    /// Required fields did not resolve to any column.
    #[error("Required columns not found: {}", join_keys(.0))]
    MissingColumns(Vec<FieldKey>),

    /// No row below the header qualified as a record.
    #[error("No valid data rows: {0}")]
    NoDataRows(String),
}

impl Error {
    /// Whether this error is a structural failure of the sheet layout,
    /// as opposed to an I/O, format or configuration problem.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::SheetNotFound { .. }
                | Error::HeaderNotFound { .. }
                | Error::AnchorRowMissing { .. }
                | Error::MissingColumns(_)
                | Error::NoDataRows(_)
        )
    }
}

fn one_based(row: &u32) -> u64 {
    u64::from(*row) + 1
}

fn join_keys(keys: &[FieldKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(feature = "xlsx")]
impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipArchive(err.to_string())
    }
}

#[cfg(feature = "xlsx")]
impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlParse(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(err.to_string(), "Unknown file format");

        let err = Error::MissingColumns(vec![FieldKey::Position, FieldKey::BaseSalary]);
        assert_eq!(
            err.to_string(),
            "Required columns not found: position, baseSalary"
        );
    }

    #[test]
    fn test_sheet_not_found_lists_sheets() {
        let err = Error::SheetNotFound {
            query: "febrero".to_string(),
            available: vec!["ENERO".to_string(), "RESUMEN".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"febrero\""));
        assert!(msg.contains("ENERO, RESUMEN"));
    }

    #[test]
    fn test_anchor_row_missing_uses_one_based_rows() {
        let err = Error::AnchorRowMissing {
            first_row: 5,
            last_row: 7,
            missing: vec![FieldKey::BaseSalary],
        };
        assert_eq!(
            err.to_string(),
            "Header rows 6-8 contain no row with all required labels; missing: baseSalary"
        );
    }

    #[test]
    fn test_structural_classification() {
        assert!(Error::HeaderNotFound { scanned_rows: 30 }.is_structural());
        assert!(Error::NoDataRows("empty".into()).is_structural());
        assert!(!Error::UnknownFormat.is_structural());
        assert!(!Error::Config("bad".into()).is_structural());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

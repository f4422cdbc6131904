//! Extraction options and their TOML representation.
//!
//! Every constant the engine relies on lives here, so a site with differently
//! labeled sheets can adjust thresholds or the field table without code
//! changes:
//!
//! ```toml
//! header_strategy = "explicit_marker"
//! marker_token = "ENCABEZADO"
//! company_cell = "C2"
//!
//! [[fields]]
//! key = "baseSalary"
//! targets = ["sueldo quincenal", "ordinario mensual"]
//! ```
//!
//! Field entries replace the built-in entry with the same key; fields that
//! are not mentioned keep their defaults.

use crate::error::{Error, Result};
use crate::grid::CellRef;
use crate::schema::{default_field_specs, default_header_keywords, FieldKey, FieldSpec};
use crate::text::{normalize, SHEET_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How rows of the header block are recognized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStrategy {
    /// Rows containing at least `min_keyword_hits` header keywords
    #[default]
    KeywordScan,
    /// Rows whose first used column holds the marker token
    ExplicitMarker,
}

/// Options for locating, resolving and extracting payroll records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Header row recognition strategy
    pub header_strategy: HeaderStrategy,

    /// Number of rows from the top of the used range searched for headers
    pub header_scan_rows: u32,

    /// Distinct keywords a row needs to count as a header row
    pub min_keyword_hits: usize,

    /// Keywords used by [`HeaderStrategy::KeywordScan`]
    pub header_keywords: Vec<String>,

    /// Token used by [`HeaderStrategy::ExplicitMarker`]
    pub marker_token: String,

    /// Maximum distance ratio for the marker token
    pub marker_threshold: f64,

    /// Maximum distance ratio for header labels
    pub header_threshold: f64,

    /// Maximum distance ratio when selecting a sheet by name
    pub sheet_threshold: f64,

    /// Rows probed below the header for the first numeric ordinal
    pub first_row_probe: u32,

    /// Minimum normalized length of an employee name
    pub min_name_len: usize,

    /// Cell holding the company name
    pub company_cell: CellRef,

    /// Cell holding the payroll period label
    pub period_cell: CellRef,

    /// Field label table
    pub fields: Vec<FieldSpec>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            header_strategy: HeaderStrategy::KeywordScan,
            header_scan_rows: 30,
            min_keyword_hits: 2,
            header_keywords: default_header_keywords(),
            marker_token: "ENCABEZADO".to_string(),
            marker_threshold: 0.45,
            header_threshold: 0.4,
            sheet_threshold: SHEET_THRESHOLD,
            first_row_probe: 5,
            min_name_len: 2,
            company_cell: CellRef::new(1, 1),
            period_cell: CellRef::new(3, 1),
            fields: default_field_specs(),
        }
    }
}

impl ExtractOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from TOML, filling unspecified fields from the defaults.
    pub fn from_toml(input: &str) -> Result<Self> {
        let mut options: ExtractOptions = toml::from_str(input)?;
        options.fields = merge_fields(options.fields)?;
        options.validate()?;
        Ok(options)
    }

    /// Read options from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let input = std::fs::read_to_string(path)?;
        Self::from_toml(&input)
    }

    /// Select the header strategy.
    pub fn with_header_strategy(mut self, strategy: HeaderStrategy) -> Self {
        self.header_strategy = strategy;
        self
    }

    /// Set the header-label distance threshold.
    pub fn with_header_threshold(mut self, threshold: f64) -> Self {
        self.header_threshold = threshold;
        self
    }

    /// Set the sheet-name distance threshold.
    pub fn with_sheet_threshold(mut self, threshold: f64) -> Self {
        self.sheet_threshold = threshold;
        self
    }

    /// Set the number of rows searched for the header block.
    pub fn with_header_scan_rows(mut self, rows: u32) -> Self {
        self.header_scan_rows = rows;
        self
    }

    /// Set the marker token for [`HeaderStrategy::ExplicitMarker`].
    pub fn with_marker_token(mut self, token: impl Into<String>) -> Self {
        self.marker_token = token.into();
        self
    }

    /// Set the company-name and period-label cells.
    pub fn with_metadata_cells(mut self, company: CellRef, period: CellRef) -> Self {
        self.company_cell = company;
        self.period_cell = period;
        self
    }

    /// Replace the spec for one field.
    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.key == spec.key) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// Replace the specs for several fields at once.
    pub fn with_fields(self, specs: impl IntoIterator<Item = FieldSpec>) -> Self {
        specs.into_iter().fold(self, Self::with_field)
    }

    /// Check that the options describe a usable configuration.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("header_threshold", self.header_threshold),
            ("marker_threshold", self.marker_threshold),
            ("sheet_threshold", self.sheet_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }

        if self.header_scan_rows == 0 {
            return Err(Error::Config("header_scan_rows must be at least 1".into()));
        }
        if self.min_name_len == 0 {
            return Err(Error::Config("min_name_len must be at least 1".into()));
        }

        match self.header_strategy {
            HeaderStrategy::KeywordScan => {
                if self.min_keyword_hits == 0 {
                    return Err(Error::Config("min_keyword_hits must be at least 1".into()));
                }
                let usable = self
                    .header_keywords
                    .iter()
                    .filter(|k| !normalize(k).is_empty())
                    .count();
                if usable < self.min_keyword_hits {
                    return Err(Error::Config(format!(
                        "{usable} header keyword(s) cannot satisfy min_keyword_hits = {}",
                        self.min_keyword_hits
                    )));
                }
            }
            HeaderStrategy::ExplicitMarker => {
                if normalize(&self.marker_token).is_empty() {
                    return Err(Error::Config("marker_token must not be blank".into()));
                }
            }
        }

        for key in FieldKey::ALL {
            let specs: Vec<&FieldSpec> = self.fields.iter().filter(|f| f.key == key).collect();
            match specs.as_slice() {
                [] => return Err(Error::Config(format!("field '{key}' is not configured"))),
                [spec] => {
                    if !spec.targets.iter().any(|t| !normalize(t).is_empty()) {
                        return Err(Error::Config(format!(
                            "field '{key}' needs at least one non-blank target"
                        )));
                    }
                    if spec.multi_column && key.is_textual() {
                        return Err(Error::Config(format!(
                            "field '{key}' cannot be multi-column"
                        )));
                    }
                }
                _ => {
                    return Err(Error::Config(format!(
                        "field '{key}' is configured more than once"
                    )))
                }
            }
        }

        Ok(())
    }
}

/// Overlay configured field specs onto the default table.
fn merge_fields(configured: Vec<FieldSpec>) -> Result<Vec<FieldSpec>> {
    let mut merged = default_field_specs();
    let mut seen = Vec::new();

    for spec in configured {
        if seen.contains(&spec.key) {
            return Err(Error::Config(format!(
                "field '{}' is configured more than once",
                spec.key
            )));
        }
        seen.push(spec.key);
        if let Some(slot) = merged.iter_mut().find(|f| f.key == spec.key) {
            *slot = spec;
        }
    }

    Ok(merged)
}

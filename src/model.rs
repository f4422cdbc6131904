//! Extraction output: receipt records, warnings and batch totals.

use crate::columns::ColumnMap;
use crate::grid::{column_letter, CellRef};
use crate::header::HeaderBlock;
use crate::schema::FieldKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-fatal data-quality issue found while parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Warning {
    /// One column was claimed by several fields.
    DuplicateColumn { column: u32, fields: Vec<FieldKey> },
    /// A monetary cell held text that is not a number; zero was used.
    NonNumericCell {
        row: u32,
        column: u32,
        field: FieldKey,
        value: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DuplicateColumn { column, fields } => {
                let names: Vec<&str> = fields.iter().map(|k| k.as_str()).collect();
                write!(
                    f,
                    "Column {} assigned to multiple fields: {}",
                    column_letter(*column),
                    names.join(", ")
                )
            }
            Warning::NonNumericCell {
                row,
                column,
                field,
                value,
            } => write!(
                f,
                "Cell {} ({field}): {value:?} is not a number, using 0",
                CellRef::new(*row, *column)
            ),
        }
    }
}

/// Monetary amounts read from one data row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amounts {
    pub base_salary: f64,
    pub special_bonus: f64,
    pub social_security_deduction: f64,
    pub income_tax_deduction: f64,
    pub advance_deduction: f64,
    pub other_deduction: f64,
}

impl Amounts {
    pub fn total_income(&self) -> f64 {
        self.base_salary + self.special_bonus
    }

    pub fn total_deductions(&self) -> f64 {
        self.social_security_deduction
            + self.income_tax_deduction
            + self.advance_deduction
            + self.other_deduction
    }

    /// Set the amount belonging to a monetary field. Text fields are ignored.
    pub(crate) fn set(&mut self, key: FieldKey, value: f64) {
        match key {
            FieldKey::BaseSalary => self.base_salary = value,
            FieldKey::SpecialBonus => self.special_bonus = value,
            FieldKey::SocialSecurityDeduction => self.social_security_deduction = value,
            FieldKey::IncomeTaxDeduction => self.income_tax_deduction = value,
            FieldKey::AdvanceDeduction => self.advance_deduction = value,
            FieldKey::OtherDeduction => self.other_deduction = value,
            FieldKey::Ordinal | FieldKey::EmployeeName | FieldKey::Position => {}
        }
    }
}

/// Sheet-level metadata shared by every record of one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub company_name: String,
    /// The period label as written in the sheet
    pub label: String,
    /// The period's last day, e.g. `"15 de marzo de 2024"`
    pub receipt_date: String,
}

/// One employee's computed receipt for a pay period.
///
/// Totals are derived from [`Amounts`] at construction and cannot drift from
/// them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    ordinal: f64,
    row: u32,
    company_name: String,
    period_label: String,
    receipt_date: String,
    employee_name: String,
    position: String,
    #[serde(flatten)]
    amounts: Amounts,
    total_income: f64,
    total_deductions: f64,
    net_pay: f64,
}

impl ReceiptRecord {
    pub fn new(
        ordinal: f64,
        row: u32,
        period: &Period,
        employee_name: impl Into<String>,
        position: impl Into<String>,
        amounts: Amounts,
    ) -> Self {
        let total_income = amounts.total_income();
        let total_deductions = amounts.total_deductions();
        Self {
            ordinal,
            row,
            company_name: period.company_name.clone(),
            period_label: period.label.clone(),
            receipt_date: period.receipt_date.clone(),
            employee_name: employee_name.into(),
            position: position.into(),
            amounts,
            total_income,
            total_deductions,
            net_pay: total_income - total_deductions,
        }
    }

    /// Sequence number as written in the sheet.
    pub fn ordinal(&self) -> f64 {
        self.ordinal
    }

    /// Zero-based source row.
    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn period_label(&self) -> &str {
        &self.period_label
    }

    pub fn receipt_date(&self) -> &str {
        &self.receipt_date
    }

    pub fn employee_name(&self) -> &str {
        &self.employee_name
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn amounts(&self) -> &Amounts {
        &self.amounts
    }

    pub fn total_income(&self) -> f64 {
        self.total_income
    }

    pub fn total_deductions(&self) -> f64 {
        self.total_deductions
    }

    pub fn net_pay(&self) -> f64 {
        self.net_pay
    }
}

/// Totals over every record of a parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub receipt_count: usize,
    pub total_income: f64,
    pub total_deductions: f64,
    pub net_pay: f64,
}

/// The outcome of a successful parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    /// Sheet the records came from, when parsed from a workbook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    pub company_name: String,
    pub period_label: String,
    pub receipt_date: String,
    pub header: HeaderBlock,
    pub columns: ColumnMap,
    /// Records in source row order
    pub records: Vec<ReceiptRecord>,
    pub warnings: Vec<Warning>,
}

impl ParseResult {
    /// Sum the derived totals of every record.
    pub fn summary(&self) -> BatchSummary {
        self.records.iter().fold(
            BatchSummary {
                receipt_count: self.records.len(),
                ..Default::default()
            },
            |mut acc, r| {
                acc.total_income += r.total_income();
                acc.total_deductions += r.total_deductions();
                acc.net_pay += r.net_pay();
                acc
            },
        )
    }

    /// Warnings rendered for an operator log.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

//! Plain text report of a parse result.

use crate::grid::{column_letter, CellRef};
use crate::model::ParseResult;

/// Render a human-readable summary: sheet, header block, column map,
/// totals and warnings. Rows and columns are shown in spreadsheet notation.
pub fn to_report(result: &ParseResult) -> String {
    let mut out = String::new();
    let summary = result.summary();
    let header = &result.header;

    if let Some(ref sheet) = result.sheet_name {
        out.push_str(&format!("Sheet:        {sheet}\n"));
    }
    out.push_str(&format!("Company:      {}\n", result.company_name));
    out.push_str(&format!("Period:       {}\n", result.period_label));
    out.push_str(&format!("Receipt date: {}\n", result.receipt_date));
    out.push_str(&format!(
        "Header rows:  {}-{} (anchor {})\n",
        display_row(header.first_row()),
        display_row(header.last_row()),
        display_row(header.anchor_row())
    ));

    out.push_str("\nColumns:\n");
    for (key, binding) in result.columns.iter() {
        let letters: Vec<String> = binding.columns().into_iter().map(column_letter).collect();
        out.push_str(&format!("  {:<26}{}\n", key.as_str(), letters.join(" + ")));
    }

    out.push_str(&format!("\nReceipts:         {}\n", summary.receipt_count));
    out.push_str(&format!("Total income:     {:.2}\n", summary.total_income));
    out.push_str(&format!("Total deductions: {:.2}\n", summary.total_deductions));
    out.push_str(&format!("Net pay:          {:.2}\n", summary.net_pay));

    if let (Some(first), Some(last)) = (result.records.first(), result.records.last()) {
        out.push_str(&format!(
            "Data rows:        {}-{}\n",
            display_row(first.row()),
            display_row(last.row())
        ));
    }

    if !result.warnings.is_empty() {
        out.push_str(&format!("\nWarnings ({}):\n", result.warnings.len()));
        for message in result.warning_messages() {
            out.push_str(&format!("  - {message}\n"));
        }
    }

    out
}

/// One-based spreadsheet row number.
fn display_row(row: u32) -> u64 {
    u64::from(row) + 1
}

/// One line per record: ordinal, source cell, name and net pay.
pub fn to_record_lines(result: &ParseResult, name_col: u32) -> Vec<String> {
    result
        .records
        .iter()
        .map(|r| {
            format!(
                "{:>4}  {:<6} {:<32} {:>12.2}",
                r.ordinal(),
                CellRef::new(r.row(), name_col).to_string(),
                r.employee_name(),
                r.net_pay()
            )
        })
        .collect()
}

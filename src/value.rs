//! Locale-tolerant number parsing and Spanish period-date rendering.

use crate::grid::CellValue;
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading decimal number, the way spreadsheet users type them.
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number pattern")
});

/// "... AL <day> [DE] <month> [DE] <year>" at the end of a payroll period label.
static PERIOD_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bAL\s+(\d{1,2})\s+(?:DE\s+)?(\p{L}+)\.?\s+(?:DEL?\s+)?(\d{4})")
        .expect("valid period pattern")
});

const MONTHS: &[(&str, &[&str])] = &[
    ("enero", &["ene"]),
    ("febrero", &["feb"]),
    ("marzo", &["mar"]),
    ("abril", &["abr"]),
    ("mayo", &["may"]),
    ("junio", &["jun"]),
    ("julio", &["jul"]),
    ("agosto", &["ago"]),
    ("septiembre", &["sep", "sept", "set", "setiembre"]),
    ("octubre", &["oct"]),
    ("noviembre", &["nov"]),
    ("diciembre", &["dic"]),
];

/// Parse a cell as a number.
///
/// Numbers pass through. Text has its thousands-separator commas removed and
/// its leading numeric prefix parsed, so `"1,234.5"` is `1234.5` and
/// `"15 días"` is `15`. Returns `None` when no number can be read.
pub fn parse_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => n.is_finite().then_some(*n),
        CellValue::Text(s) => {
            let cleaned = s.replace(',', "");
            let prefix = LEADING_NUMBER.find(cleaned.trim())?;
            prefix.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
        }
    }
}

/// Read a cell as a number, treating empty or unreadable cells as zero.
pub fn to_number(value: Option<&CellValue>) -> f64 {
    value.and_then(parse_number).unwrap_or(0.0)
}

/// Render the last day of a payroll period label as `"<day> de <month> de <year>"`.
///
/// `"DEL 1 AL 15 DE MARZO 2024"` becomes `"15 de marzo de 2024"`. Month
/// abbreviations are expanded. Labels without a recognizable end date are
/// returned trimmed but otherwise unchanged.
pub fn parse_receipt_date(label: &str) -> String {
    let label = label.trim();
    let Some(caps) = PERIOD_END.captures_iter(label).last() else {
        return label.to_string();
    };

    let day: u32 = caps[1].parse().unwrap_or_default();
    let month = month_name(&caps[2].to_lowercase());
    let year = &caps[3];

    format!("{day} de {month} de {year}")
}

fn month_name(raw: &str) -> String {
    MONTHS
        .iter()
        .find(|(full, abbrevs)| *full == raw || abbrevs.contains(&raw))
        .map(|(full, _)| full.to_string())
        .unwrap_or_else(|| raw.to_string())
}

//! A1-style cell addressing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Render a zero-based column index as spreadsheet letters (`0` → `A`, `26` → `AA`).
pub fn column_letter(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col as u64 + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parse spreadsheet column letters into a zero-based index.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (c.to_ascii_uppercase() as u8 - b'A' + 1) as u64;
        if n > u32::MAX as u64 {
            return None;
        }
    }
    Some((n - 1) as u32)
}

/// A zero-based cell position, written and parsed in A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().replace('$', "");
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| format!("invalid cell reference: {s:?}"))?;
        let (letters, digits) = trimmed.split_at(split);

        let col = column_index(letters).ok_or_else(|| format!("invalid cell reference: {s:?}"))?;
        let row: u32 = digits
            .parse()
            .map_err(|_| format!("invalid cell reference: {s:?}"))?;
        if row == 0 {
            return Err(format!("invalid cell reference: {s:?}"));
        }

        Ok(Self { row: row - 1, col })
    }
}

impl TryFrom<String> for CellRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellRef> for String {
    fn from(value: CellRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.col), self.row as u64 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(2), "C");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("aa"), Some(26));
        assert_eq!(column_index("ZZ"), Some(701));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!("B2".parse::<CellRef>().unwrap(), CellRef::new(1, 1));
        assert_eq!("$b$4".parse::<CellRef>().unwrap(), CellRef::new(3, 1));
        assert_eq!("AA10".parse::<CellRef>().unwrap(), CellRef::new(9, 26));
        assert!("B0".parse::<CellRef>().is_err());
        assert!("12".parse::<CellRef>().is_err());
        assert!("B".parse::<CellRef>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CellRef::new(3, 1).to_string(), "B4");
        assert_eq!(CellRef::new(0, 27).to_string(), "AB1");
    }
}

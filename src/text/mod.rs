//! Text canonicalization and approximate string matching.
//!
//! Both the header locator and the column resolver compare spreadsheet labels
//! through these two primitives, so that `"Número"`, `"NUMERO"` and `"numero "`
//! are treated as the same label and small typos still match.
//!
//! # Example
//!
//! ```
//! use paystub::text::{fuzzy_match, normalize};
//!
//! assert_eq!(normalize("Í.G.S.S."), "igss");
//!
//! let hit = fuzzy_match("Bonificacion Especal", &["bonificación especial"], 0.4).unwrap();
//! assert_eq!(hit.candidate, "bonificación especial");
//! ```

mod normalize;
mod similarity;

pub use normalize::normalize;
pub use similarity::{find_sheet, fuzzy_match, levenshtein, score, FuzzyMatch, SHEET_THRESHOLD};

//! Excel (.xlsx) workbook reading.
//!
//! Only what the extractor needs is read: sheet order and names, the shared
//! string table and each worksheet's cell values. Styles, formulas and
//! merged regions are ignored; a formula cell contributes its cached value.

mod archive;
mod reader;
mod shared_strings;

pub use archive::{is_zip_file, XlsxArchive};
pub use reader::XlsxReader;
pub use shared_strings::SharedStrings;

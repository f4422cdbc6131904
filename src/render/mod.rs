//! Output rendering for parse results.
//!
//! # Example
//!
//! ```no_run
//! use paystub::render::{to_json, to_report, JsonFormat};
//!
//! let result = paystub::parse_file("planilla.xlsx", "ENERO")?;
//! println!("{}", to_report(&result));
//! std::fs::write("enero.json", to_json(&result, JsonFormat::Pretty)?)?;
//! # Ok::<(), paystub::Error>(())
//! ```

mod json;
mod text;

pub use json::{to_json, to_json_default, JsonFormat};
pub use text::{to_record_lines, to_report};

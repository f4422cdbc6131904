//! Workbook and worksheet reading.

use crate::error::{Error, Result};
use crate::grid::{CellRef, CellValue, Grid, Workbook};
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::path::Path;

use super::archive::XlsxArchive;
use super::shared_strings::SharedStrings;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// A sheet entry from `workbook.xml`, with its resolved part path.
#[derive(Debug, Clone)]
struct SheetEntry {
    name: String,
    path: String,
}

/// Reads `.xlsx` workbooks into [`Grid`]s.
///
/// # Example
///
/// ```no_run
/// use paystub::xlsx::XlsxReader;
///
/// let reader = XlsxReader::open("planilla.xlsx")?;
/// for name in reader.sheet_names() {
///     let grid = reader.read_sheet(name)?;
///     println!("{name}: {} cells", grid.len());
/// }
/// # Ok::<(), paystub::Error>(())
/// ```
#[derive(Debug)]
pub struct XlsxReader {
    archive: XlsxArchive,
    shared_strings: SharedStrings,
    sheets: Vec<SheetEntry>,
}

impl XlsxReader {
    /// Open a workbook file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_archive(XlsxArchive::open(path)?)
    }

    /// Read a workbook from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_archive(XlsxArchive::from_bytes(data)?)
    }

    fn from_archive(archive: XlsxArchive) -> Result<Self> {
        let shared_strings = match archive.read_optional_xml(SHARED_STRINGS_PART)? {
            Some(xml) => SharedStrings::parse(&xml)?,
            None => SharedStrings::default(),
        };

        let targets = match archive.read_optional_xml(WORKBOOK_RELS_PART)? {
            Some(xml) => parse_relationships(&xml)?,
            None => HashMap::new(),
        };
        let sheets = parse_workbook(&archive.read_xml(WORKBOOK_PART)?, &targets)?;

        tracing::debug!(
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            "workbook opened"
        );

        Ok(Self {
            archive,
            shared_strings,
            sheets,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Read one sheet by its exact name.
    pub fn read_sheet(&self, name: &str) -> Result<Grid> {
        let entry = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SheetNotFound {
                query: name.to_string(),
                available: self.sheets.iter().map(|s| s.name.clone()).collect(),
            })?;

        let xml = self.archive.read_xml(&entry.path)?;
        parse_worksheet(&xml, &self.shared_strings)
    }

    /// Read every sheet.
    pub fn read_workbook(&self) -> Result<Workbook> {
        let mut workbook = Workbook::new();
        for entry in &self.sheets {
            workbook.add_sheet(entry.name.clone(), self.read_sheet(&entry.name)?);
        }
        Ok(workbook)
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Map relationship ids to worksheet part paths.
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut targets = HashMap::new();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr_value(&e, b"Id"), attr_value(&e, b"Target"))
                {
                    targets.insert(id, XlsxArchive::resolve_path(WORKBOOK_PART, &target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}

/// Read sheet names and their parts from `workbook.xml`.
fn parse_workbook(xml: &str, targets: &HashMap<String, String>) -> Result<Vec<SheetEntry>> {
    let mut sheets = Vec::new();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                if let Some(name) = attr_value(&e, b"name") {
                    // The relationship id is namespaced, usually as `r:id`.
                    let rel_id = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == b"id")
                        .map(|a| String::from_utf8_lossy(&a.value).into_owned());

                    let path = rel_id
                        .and_then(|id| targets.get(&id).cloned())
                        .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", sheets.len() + 1));
                    sheets.push(SheetEntry { name, path });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// The cell being read inside `<c>`.
#[derive(Debug)]
struct PendingCell {
    at: CellRef,
    kind: Option<String>,
    raw: String,
}

/// Parse a worksheet's `<sheetData>` into a grid.
fn parse_worksheet(xml: &str, shared: &SharedStrings) -> Result<Grid> {
    let mut grid = Grid::new();
    let mut reader = quick_xml::Reader::from_str(xml);

    let mut buf = Vec::new();
    let mut next_row = 0u32;
    let mut row = 0u32;
    let mut next_col = 0u32;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut phonetic_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_index(&e).unwrap_or(next_row);
                    next_row = row.saturating_add(1);
                    next_col = 0;
                }
                b"c" => {
                    let at = cell_position(&e, row, next_col);
                    next_col = at.col.saturating_add(1);
                    cell = Some(PendingCell {
                        at,
                        kind: attr_value(&e, b"t"),
                        raw: String::new(),
                    });
                }
                b"rPh" => phonetic_depth += 1,
                b"v" | b"t" if cell.is_some() && phonetic_depth == 0 => in_value = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row = row_index(&e).unwrap_or(next_row);
                    next_row = row.saturating_add(1);
                }
                b"c" => next_col = cell_position(&e, row, next_col).col.saturating_add(1),
                _ => {}
            },
            Ok(Event::Text(e)) if in_value => {
                if let Some(pending) = cell.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::XmlParse(err.to_string()))?;
                    pending.raw.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(pending) = cell.take() {
                        if let Some(value) =
                            resolve_cell_value(&pending.raw, pending.kind.as_deref(), shared)?
                        {
                            grid.set(pending.at.row, pending.at.col, value);
                        }
                    }
                    in_value = false;
                }
                b"v" | b"t" => in_value = false,
                b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

/// Zero-based row index from a `<row r="..">` attribute.
fn row_index(e: &BytesStart<'_>) -> Option<u32> {
    attr_value(e, b"r")?
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|r| r.checked_sub(1))
}

/// Cell position from its `r` attribute, or the next free column of the row.
fn cell_position(e: &BytesStart<'_>, row: u32, next_col: u32) -> CellRef {
    attr_value(e, b"r")
        .and_then(|r| r.parse::<CellRef>().ok())
        .unwrap_or(CellRef::new(row, next_col))
}

/// Turn raw cell content into a typed value according to the cell's `t` attribute.
fn resolve_cell_value(
    raw: &str,
    kind: Option<&str>,
    shared: &SharedStrings,
) -> Result<Option<CellValue>> {
    if raw.is_empty() {
        return Ok(None);
    }

    let value = match kind {
        Some("s") => {
            let index: usize = raw.trim().parse().map_err(|_| {
                Error::InvalidData(format!("invalid shared string index: {raw:?}"))
            })?;
            let text = shared.get(index).ok_or_else(|| {
                Error::InvalidData(format!(
                    "shared string index {index} out of range ({} strings)",
                    shared.len()
                ))
            })?;
            CellValue::Text(text.to_string())
        }
        Some("b") => CellValue::Text(if raw.trim() == "1" { "TRUE" } else { "FALSE" }.to_string()),
        Some("e") | Some("str") | Some("inlineStr") => CellValue::Text(raw.to_string()),
        _ => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(raw.to_string()),
        },
    };

    Ok(Some(value))
}

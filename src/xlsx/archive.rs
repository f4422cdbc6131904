//! ZIP package access for `.xlsx` workbooks.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::io::{Cursor, Read};
use std::path::Path;

/// ZIP file magic bytes: PK\x03\x04
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Content types of a workbook main part (plain and macro-enabled).
const WORKBOOK_CONTENT_TYPES: [&str; 2] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
    "application/vnd.ms-excel.sheet.macroEnabled.main+xml",
];

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Check if data starts with ZIP magic bytes.
pub fn is_zip_file(data: &[u8]) -> bool {
    data.len() >= 4 && data[..4] == ZIP_MAGIC
}

/// The ZIP package of a spreadsheet workbook.
pub struct XlsxArchive {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl XlsxArchive {
    /// Open a workbook package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Open a workbook package from bytes, rejecting anything that is not a spreadsheet.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if !is_zip_file(&data) {
            return Err(Error::UnknownFormat);
        }

        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        let package = Self {
            archive: RefCell::new(archive),
        };

        if !package.is_workbook()? {
            return Err(Error::UnknownFormat);
        }
        Ok(package)
    }

    fn is_workbook(&self) -> Result<bool> {
        match self.read_optional_xml(CONTENT_TYPES_PART)? {
            Some(types) if WORKBOOK_CONTENT_TYPES.iter().any(|t| types.contains(t)) => Ok(true),
            // Some writers omit the override; fall back to the workbook part itself.
            _ => Ok(self.exists("xl/workbook.xml")),
        }
    }

    /// Read an XML part as a string.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        self.read_optional_xml(path)?
            .ok_or_else(|| Error::MissingComponent(path.to_string()))
    }

    /// Read an XML part that may legitimately be absent.
    pub fn read_optional_xml(&self, path: &str) -> Result<Option<String>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = match archive.by_name(path) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        decode_xml_bytes(&bytes).map(Some)
    }

    /// Check if a part exists in the archive.
    pub fn exists(&self, path: &str) -> bool {
        self.archive.borrow().file_names().any(|n| n == path)
    }

    /// Resolve a relationship target relative to the part that declares it.
    pub fn resolve_path(base: &str, target: &str) -> String {
        if let Some(absolute) = target.strip_prefix('/') {
            return absolute.to_string();
        }

        let mut parts: Vec<&str> = base.split('/').collect();
        parts.pop();
        for segment in target.split('/') {
            match segment {
                ".." => {
                    parts.pop();
                }
                "." | "" => {}
                other => parts.push(other),
            }
        }
        parts.join("/")
    }
}

impl std::fmt::Debug for XlsxArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XlsxArchive")
            .field("parts", &self.archive.borrow().len())
            .finish()
    }
}

/// Decode XML bytes, handling a UTF-8 BOM and UTF-16 LE/BE.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec())
            .map_err(|e| Error::InvalidData(format!("invalid UTF-8 in XML part: {e}"))),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes).map(|s| fix_declaration(&s)),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes).map(|s| fix_declaration(&s)),
        _ => Ok(String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String> {
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::InvalidData(format!("invalid UTF-16 in XML part: {e}")))
}

/// Rewrite a UTF-16 encoding declaration once the content has been decoded.
fn fix_declaration(content: &str) -> String {
    let Some(end) = content.starts_with("<?xml").then(|| content.find("?>")).flatten() else {
        return content.to_string();
    };
    let (decl, rest) = content.split_at(end + 2);
    let decl = decl
        .replace("\"UTF-16\"", "\"UTF-8\"")
        .replace("'UTF-16'", "'UTF-8'")
        .replace("\"utf-16\"", "\"UTF-8\"")
        .replace("'utf-16'", "'UTF-8'");
    format!("{decl}{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file(&[0x50, 0x4B, 0x03, 0x04, 0x00]));
        assert!(!is_zip_file(&[0x00, 0x00, 0x00, 0x00]));
        assert!(!is_zip_file(&[0x50, 0x4B]));
    }

    #[test]
    fn test_rejects_non_zip() {
        let result = XlsxArchive::from_bytes(b"No.;NOMBRE;PUESTO".to_vec());
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            XlsxArchive::resolve_path("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            XlsxArchive::resolve_path("xl/workbook.xml", "/xl/worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
        assert_eq!(
            XlsxArchive::resolve_path("xl/worksheets/sheet1.xml", "../sharedStrings.xml"),
            "xl/sharedStrings.xml"
        );
    }

    #[test]
    fn test_decode_xml_bytes() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le).unwrap(), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be).unwrap(), "<?xml>");

        let utf8_bom = b"\xEF\xBB\xBF<?xml>";
        assert_eq!(decode_xml_bytes(utf8_bom).unwrap(), "<?xml>");

        assert_eq!(decode_xml_bytes(b"<?xml>").unwrap(), "<?xml>");
    }

    #[test]
    fn test_utf16_declaration_is_rewritten() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><sst/>";
        let bytes: Vec<u8> = [0xFF, 0xFE]
            .into_iter()
            .chain(xml.encode_utf16().flat_map(|u| u.to_le_bytes()))
            .collect();
        let decoded = decode_xml_bytes(&bytes).unwrap();
        assert_eq!(decoded, "<?xml version=\"1.0\" encoding=\"UTF-8\"?><sst/>");
    }
}

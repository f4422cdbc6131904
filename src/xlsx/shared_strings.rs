//! Shared string table (`xl/sharedStrings.xml`).

use crate::error::{Error, Result};
use quick_xml::events::Event;

/// Strings referenced by index from `t="s"` cells.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    /// Parse the table. Rich-text runs are concatenated; phonetic runs are skipped.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut strings = Vec::new();
        let mut reader = quick_xml::Reader::from_str(xml);

        let mut buf = Vec::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut phonetic_depth = 0usize;
        let mut current = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => phonetic_depth += 1,
                    b"t" if in_si && phonetic_depth == 0 => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                }
                Ok(Event::Text(e)) if in_t => {
                    let text = e
                        .unescape()
                        .map_err(|err| Error::XmlParse(err.to_string()))?;
                    current.push_str(&text);
                }
                Ok(Event::CData(e)) if in_t => {
                    current.push_str(&String::from_utf8_lossy(&e));
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"si" => {
                        strings.push(std::mem::take(&mut current));
                        in_si = false;
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { strings })
    }

    /// Get a string by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

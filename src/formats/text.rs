use super::{Document, ExtractedUnit, FormatHandler, Location};
use crate::errors::{Error, Result};
use std::fs;
use std::path::Path;

/// UTF-8 text files, one unit per line.
pub struct TextFormat;

/// A text file split into lines, remembering each line's terminator so the
/// file can be written back byte-for-byte apart from rewritten lines.
#[derive(Debug)]
pub struct TextDocument {
    lines: Vec<ExtractedUnit>,
    endings: Vec<&'static str>,
}

impl TextDocument {
    pub fn parse(content: &str) -> Self {
        let mut lines = Vec::new();
        let mut endings = Vec::new();

        for (idx, raw) in content.split_inclusive('\n').enumerate() {
            let (text, ending) = if let Some(t) = raw.strip_suffix("\r\n") {
                (t, "\r\n")
            } else if let Some(t) = raw.strip_suffix('\n') {
                (t, "\n")
            } else {
                (raw, "")
            };
            lines.push(ExtractedUnit {
                location: Location::Line(idx + 1),
                value: text.to_string(),
            });
            endings.push(ending);
        }

        Self { lines, endings }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (line, ending) in self.lines.iter().zip(&self.endings) {
            out.push_str(&line.value);
            out.push_str(ending);
        }
        out
    }
}

impl Document for TextDocument {
    fn units(&self) -> &[ExtractedUnit] {
        &self.lines
    }

    fn set_value(&mut self, index: usize, value: String) {
        if let Some(line) = self.lines.get_mut(index) {
            line.value = value;
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.to_text().into_bytes())
    }
}

impl FormatHandler for TextFormat {
    fn load(&self, path: &Path) -> Result<Box<dyn Document>> {
        let bytes = fs::read(path).map_err(|e| Error::file_read(path, e))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| Error::file_read(path, format!("not valid UTF-8 text ({e})")))?;
        Ok(Box::new(TextDocument::parse(&content)))
    }

    fn check_writable(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

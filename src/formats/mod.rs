//! Per-format extraction and rewriting.
//!
//! Every format family implements [`FormatHandler`], which loads a file into a
//! [`Document`]: an in-memory copy that exposes the file's text-bearing units
//! (lines or cells), accepts new values for them, and encodes itself back to
//! bytes in the original format. The matcher and the replace engine only ever
//! see this interface.

pub mod spreadsheet;
pub mod text;

use crate::errors::Result;
use crate::walker::FormatKind;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::path::Path;

pub use spreadsheet::SpreadsheetFormat;
pub use text::TextFormat;

/// Where a unit lives inside its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A 1-based line number in a text file.
    Line(usize),
    /// A 1-based cell position in a named worksheet.
    Cell { sheet: String, row: u32, col: u32 },
}

// Cells also carry `sheet` and the Excel column letter so a result row can be
// shown as-is.
impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Location::Line(line) => {
                let mut s = serializer.serialize_struct("Location", 1)?;
                s.serialize_field("line", line)?;
                s.end()
            }
            Location::Cell { sheet, row, col } => {
                let mut s = serializer.serialize_struct("Location", 4)?;
                s.serialize_field("line", row)?;
                s.serialize_field("sheet", sheet)?;
                s.serialize_field("col", col)?;
                s.serialize_field("column", &column_letter(*col))?;
                s.end()
            }
        }
    }
}

/// The smallest text-bearing element of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedUnit {
    pub location: Location,
    pub value: String,
}

/// A fully loaded file.
pub trait Document {
    /// Units in file order: lines top to bottom, or cells sheet by sheet in row-major order.
    fn units(&self) -> &[ExtractedUnit];

    /// Replaces the text of the unit at `index`.
    fn set_value(&mut self, index: usize, value: String);

    /// Serializes the document, including any new values, in its original format.
    fn encode(&self) -> Result<Vec<u8>>;
}

/// One format family.
pub trait FormatHandler {
    /// Reads and parses a file. Failures surface as `Error::FileRead`.
    fn load(&self, path: &Path) -> Result<Box<dyn Document>>;

    /// Checks that [`Document::encode`] can produce this file's format.
    /// Failures surface as `Error::UnsupportedFormat`.
    fn check_writable(&self, path: &Path) -> Result<()>;
}

/// Returns the handler for a format family.
pub fn handler_for(kind: FormatKind) -> &'static dyn FormatHandler {
    match kind {
        FormatKind::Spreadsheet => &SpreadsheetFormat,
        FormatKind::PlainText => &TextFormat,
    }
}

/// Converts a 1-based column number to its Excel letters (1 → A, 27 → AA).
pub fn column_letter(col: u32) -> String {
    let mut n = col;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

use super::{Document, ExtractedUnit, FormatHandler, Location};
use crate::errors::{Error, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

/// Workbooks read through `calamine` (xlsx, xlsm, xls, ods) and written back
/// through `rust_xlsxwriter` (xlsx only).
pub struct SpreadsheetFormat;

/// A typed cell value, kept so untouched cells are written back with their type.
#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// An Excel serial date-time.
    DateTime(f64),
}

#[derive(Debug)]
struct Cell {
    // 0-based
    row: u32,
    col: u32,
    value: CellValue,
}

#[derive(Debug)]
struct Sheet {
    name: String,
    cells: Vec<Cell>,
}

/// Every sheet of a workbook with its non-empty cells.
#[derive(Debug)]
pub struct SpreadsheetDocument {
    path: PathBuf,
    sheets: Vec<Sheet>,
    units: Vec<ExtractedUnit>,
    // unit index -> (sheet index, cell index)
    positions: Vec<(usize, usize)>,
}

impl SpreadsheetDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path).map_err(|e| Error::file_read(path, e))?;

        let mut sheets = Vec::new();
        let mut units = Vec::new();
        let mut positions = Vec::new();

        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| Error::file_read(path, format!("sheet '{name}': {e}")))?;
            let (row0, col0) = range.start().unwrap_or((0, 0));

            let mut cells = Vec::new();
            for (r, c, data) in range.used_cells() {
                let Some(text) = cell_text(data) else {
                    continue;
                };
                let row = row0 + r as u32;
                let col = col0 + c as u32;

                positions.push((sheets.len(), cells.len()));
                units.push(ExtractedUnit {
                    location: Location::Cell {
                        sheet: name.clone(),
                        row: row + 1,
                        col: col + 1,
                    },
                    value: text.clone(),
                });
                cells.push(Cell {
                    row,
                    col,
                    value: typed_value(data, text),
                });
            }
            sheets.push(Sheet { name, cells });
        }

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
            units,
            positions,
        })
    }

    /// Names of the sheets in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

impl Document for SpreadsheetDocument {
    fn units(&self) -> &[ExtractedUnit] {
        &self.units
    }

    fn set_value(&mut self, index: usize, value: String) {
        let Some(&(sheet_idx, cell_idx)) = self.positions.get(index) else {
            return;
        };
        self.sheets[sheet_idx].cells[cell_idx].value = CellValue::Text(value.clone());
        self.units[index].value = value;
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for cell in &sheet.cells {
                let col = u16::try_from(cell.col).map_err(|_| {
                    Error::write(&self.path, format!("column {} is out of range", cell.col + 1))
                })?;
                match &cell.value {
                    CellValue::Text(s) => worksheet.write_string(cell.row, col, s)?,
                    CellValue::Number(n) => worksheet.write_number(cell.row, col, *n)?,
                    CellValue::Bool(b) => worksheet.write_boolean(cell.row, col, *b)?,
                    CellValue::DateTime(serial) => {
                        worksheet.write_number_with_format(cell.row, col, *serial, &date_format)?
                    }
                };
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

impl FormatHandler for SpreadsheetFormat {
    fn load(&self, path: &Path) -> Result<Box<dyn Document>> {
        Ok(Box::new(SpreadsheetDocument::open(path)?))
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".xlsx") {
            Ok(())
        } else {
            Err(Error::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: "only .xlsx workbooks can be rewritten".to_string(),
            })
        }
    }
}

/// One worksheet opened for random cell access.
pub struct SheetGrid {
    range: Range<Data>,
    /// Last used row, 1-based. Zero for an empty sheet.
    pub max_row: u32,
    /// Last used column, 1-based. Zero for an empty sheet.
    pub max_col: u32,
}

impl SheetGrid {
    /// Opens `sheet` in the workbook at `path`.
    pub fn open(path: &Path, sheet: &str) -> Result<Self> {
        let mut workbook = open_workbook_auto(path).map_err(|e| Error::file_read(path, e))?;
        if !workbook.sheet_names().iter().any(|n| n == sheet) {
            return Err(Error::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| Error::file_read(path, e))?;
        let (max_row, max_col) = range.end().map(|(r, c)| (r + 1, c + 1)).unwrap_or((0, 0));
        Ok(Self {
            range,
            max_row,
            max_col,
        })
    }

    /// The display text of a 1-based cell; empty when the cell is blank or out of range.
    pub fn value(&self, row: u32, col: u32) -> String {
        if row == 0 || col == 0 {
            return String::new();
        }
        self.range
            .get_value((row - 1, col - 1))
            .and_then(cell_text)
            .unwrap_or_default()
    }
}

/// Renders a cell the same way on every platform and locale. Blank cells yield `None`.
pub fn cell_text(data: &Data) -> Option<String> {
    let text = match data {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

fn typed_value(data: &Data, text: String) -> CellValue {
    match data {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        _ => CellValue::Text(text),
    }
}

/// Integral values print without a fractional part; others use the shortest
/// representation that round-trips.
pub fn format_number(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

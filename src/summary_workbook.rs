//! Exports keyword hits as a formatted results workbook.

use crate::errors::Result;
use crate::formats::column_letter;
use crate::scanner::KeywordHit;
use chrono::Local;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatUnderline, Url, Workbook};
use std::path::{Path, PathBuf};
use tracing::info;

const SHEET_NAME: &str = "Search Results";
const HEADERS: [&str; 7] = [
    "File name",
    "Sheet",
    "Row",
    "Column",
    "Cell value",
    "Keyword",
    "File path",
];
const HEADER_FILL: u32 = 0x4472C4;
// Fills for rows hit by the first, second and third keyword.
const KEYWORD_FILLS: [u32; 3] = [0xFFE6E6, 0xE6F3FF, 0xE6FFE6];
const MAX_COLUMN_WIDTH: usize = 50;

/// A timestamped file name for a new export inside `results_dir`.
pub fn export_path(results_dir: &Path) -> PathBuf {
    results_dir.join(format!(
        "search_results_{}.xlsx",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Writes one row per hit to a new workbook at `path`.
///
/// File name and path cells link to the source workbook, and the value cell
/// links straight to the hit's cell. Rows are tinted by keyword for the first
/// three keywords in `keywords`.
pub fn write_summary_workbook(hits: &[KeywordHit], keywords: &[String], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center);

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (idx, hit) in hits.iter().enumerate() {
        let row = idx as u32 + 1;
        let fill = keywords
            .iter()
            .position(|k| *k == hit.keyword)
            .and_then(|i| KEYWORD_FILLS.get(i))
            .copied();

        let mut plain = Format::new();
        let mut link = Format::new()
            .set_font_color(Color::RGB(0x0563C1))
            .set_underline(FormatUnderline::Single);
        if let Some(fill) = fill {
            plain = plain.set_background_color(Color::RGB(fill));
            link = link.set_background_color(Color::RGB(fill));
        }

        let source_url = file_url(&hit.file_path);
        let path_text = hit.file_path.display().to_string();
        let column = column_letter(hit.col);

        worksheet.write_url_with_format(
            row,
            0,
            Url::new(&source_url)
                .set_text(&hit.file_name)
                .set_tip("Open file"),
            &link,
        )?;
        worksheet.write_string_with_format(row, 1, &hit.sheet, &plain)?;
        worksheet.write_number_with_format(row, 2, hit.row, &plain)?;
        worksheet.write_string_with_format(row, 3, &column, &plain)?;
        worksheet.write_url_with_format(
            row,
            4,
            Url::new(format!(
                "{}#{}!{}{}",
                source_url,
                sheet_reference(&hit.sheet),
                column,
                hit.row
            ))
            .set_text(&hit.value)
            .set_tip("Open file at this cell"),
            &link,
        )?;
        worksheet.write_string_with_format(row, 5, &hit.keyword, &plain)?;
        worksheet.write_url_with_format(
            row,
            6,
            Url::new(&source_url).set_text(&path_text),
            &link,
        )?;

        let row_text = hit.row.to_string();
        let cells: [&str; 7] = [
            &hit.file_name,
            &hit.sheet,
            &row_text,
            &column,
            &hit.value,
            &hit.keyword,
            &path_text,
        ];
        for (width, text) in widths.iter_mut().zip(cells) {
            *width = (*width).max(text.chars().count());
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let width = (width + 2).min(MAX_COLUMN_WIDTH);
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    workbook.save(path)?;
    info!(file = %path.display(), rows = hits.len(), "results workbook written");
    Ok(())
}

fn file_url(path: &Path) -> String {
    let path = path.display().to_string().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

// Sheet names with anything but letters, digits and underscores must be quoted
// in a cell reference, with embedded quotes doubled.
fn sheet_reference(sheet: &str) -> String {
    if sheet.chars().all(|c| c.is_alphanumeric() || c == '_') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::spreadsheet::cell_text;
    use calamine::{Reader, open_workbook_auto};
    use tempfile::TempDir;

    fn hit(keyword: &str, row: u32) -> KeywordHit {
        KeywordHit {
            file_name: "fruit.xlsx".to_string(),
            file_path: PathBuf::from("/data/fruit.xlsx"),
            sheet: "Price List".to_string(),
            row,
            col: 2,
            value: format!("{keyword} tart"),
            keyword: keyword.to_string(),
        }
    }

    #[test]
    fn test_workbook_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("results.xlsx");
        let keywords = vec!["apple".to_string(), "pear".to_string()];

        write_summary_workbook(&[hit("apple", 3), hit("pear", 7)], &keywords, &path).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let text = |r: u32, c: u32| range.get_value((r, c)).and_then(cell_text).unwrap_or_default();

        for (col, header) in HEADERS.iter().enumerate() {
            assert_eq!(text(0, col as u32), *header);
        }
        assert_eq!(text(1, 0), "fruit.xlsx");
        assert_eq!(text(1, 1), "Price List");
        assert_eq!(text(1, 2), "3");
        assert_eq!(text(1, 3), "B");
        assert_eq!(text(1, 4), "apple tart");
        assert_eq!(text(2, 5), "pear");
        assert_eq!(text(2, 6), "/data/fruit.xlsx");
    }

    #[test]
    fn test_sheet_reference_quoting() {
        assert_eq!(sheet_reference("Sheet1"), "Sheet1");
        assert_eq!(sheet_reference("Price List"), "'Price List'");
        assert_eq!(sheet_reference("Bob's"), "'Bob''s'");
    }

    #[test]
    fn test_file_url() {
        assert_eq!(file_url(Path::new("/data/a.xlsx")), "file:///data/a.xlsx");
    }

    #[test]
    fn test_export_path_is_timestamped() {
        let path = export_path(Path::new("results"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("search_results_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(name.len(), "search_results_20240101_120000.xlsx".len());
    }
}

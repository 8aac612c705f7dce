//! The neighbouring-cell window around one spreadsheet cell.

use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::formats::column_letter;
use crate::formats::spreadsheet::SheetGrid;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Rows shown above and below the target when a request does not say.
pub const DEFAULT_CONTEXT_ROWS: u32 = 5;

/// Asks for the cells around `(row, col)` of `sheet_name`, both 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDetailsRequest {
    pub file_path: PathBuf,
    pub sheet_name: String,
    pub row: u32,
    pub col: u32,
    /// The keyword that led to this cell, echoed back in the answer.
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub context_rows: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCell {
    pub row: u32,
    pub col: u32,
    pub column: String,
    pub value: String,
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextCell {
    pub row: u32,
    pub col: u32,
    pub value: String,
    pub is_target: bool,
    /// Cells of row 1 are treated as column headers.
    pub is_header: bool,
}

/// The window of rows around a target cell, every column of each row included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellContext {
    pub success: bool,
    pub file_name: String,
    pub sheet_name: String,
    pub target_cell: TargetCell,
    pub context: Vec<Vec<ContextCell>>,
    pub max_row: u32,
    pub max_col: u32,
}

/// Loads the rows `max(1, row - r) ..= min(max_row, row + r)` around the
/// requested cell, where `r` is the request's context radius.
pub fn cell_details(request: &CellDetailsRequest) -> Result<CellContext> {
    if request.row == 0 || request.col == 0 {
        return Err(Error::InvalidRequest(
            "row and column are 1-based and must be at least 1".to_string(),
        ));
    }
    let path = request.file_path.as_path();
    if !path.is_file() {
        return Err(Error::file_read(path, "file does not exist"));
    }

    let grid = SheetGrid::open(path, &request.sheet_name)?;
    let radius = request.context_rows.unwrap_or(DEFAULT_CONTEXT_ROWS);

    let first = request.row.saturating_sub(radius).max(1);
    let last = request.row.saturating_add(radius).min(grid.max_row);
    debug!(
        file = %path.display(),
        sheet = %request.sheet_name,
        first,
        last,
        "loading cell context"
    );

    let context: Vec<Vec<ContextCell>> = (first..=last)
        .map(|row| {
            (1..=grid.max_col)
                .map(|col| ContextCell {
                    row,
                    col,
                    value: grid.value(row, col),
                    is_target: row == request.row && col == request.col,
                    is_header: row == 1,
                })
                .collect()
        })
        .collect();

    Ok(CellContext {
        success: true,
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        sheet_name: request.sheet_name.clone(),
        target_cell: TargetCell {
            row: request.row,
            col: request.col,
            column: column_letter(request.col),
            value: grid.value(request.row, request.col),
            keyword: request.keyword.clone(),
        },
        context,
        max_row: grid.max_row,
        max_col: grid.max_col,
    })
}

/// The main entry point for the `details` command.
pub fn run_details(mut request: CellDetailsRequest, settings: &Settings) -> Result<()> {
    if request.context_rows.is_none() {
        request.context_rows = Some(settings.context_rows);
    }
    let details = cell_details(&request)?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}

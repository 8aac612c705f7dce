//! `cellsweep` searches folders of spreadsheets and text files, and rewrites
//! matches in bulk with a backup of every changed file.
//!
//! It provides the core logic for the `cellsweep` command-line tool but can also
//! be used as a standalone library. The main components are:
//!
//! - `paths` and `walker`: resolve a user-supplied folder and enumerate the
//!   candidate files below it, filtered by extension.
//! - `formats`: load workbooks and text files as editable documents made of
//!   cells or lines.
//! - `patterns`: literal or regex matching with surrounding context, and the
//!   case-insensitive keyword set.
//! - `replacer`: the backup, rewrite and atomic write of one file, plus undo and
//!   backup cleanup.
//! - `scanner`: the request pipeline (`run_search_replace`) and the keyword
//!   search (`search_keywords`).
//! - `details` and `summary_workbook`: the cell context lookup and the results
//!   workbook export.
//!
//! Files are processed one at a time in a stable order; a failure on one file
//! is recorded in its result and never stops the run.

pub mod cli;
pub mod config;
pub mod details;
pub mod errors;
pub mod formats;
pub mod output_formatter;
pub mod paths;
pub mod patterns;
pub mod replacer;
pub mod results;
pub mod scanner;
pub mod summary_workbook;
pub mod walker;

// Re-export main types for easier access by library users.
pub use config::Settings;
pub use details::{CellContext, CellDetailsRequest, cell_details};
pub use errors::{Error, Result};
pub use output_formatter::{OutputFormat, OutputFormatter};
pub use replacer::{Replacer, clean_backups, restore_backups};
pub use results::{FileResult, SearchReport};
pub use scanner::{KeywordHit, KeywordReport, SearchRequest, run_search_replace, search_keywords};
pub use summary_workbook::write_summary_workbook;

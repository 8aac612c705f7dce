use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in `cellsweep`.
///
/// The first group of variants is the request/file taxonomy the search and
/// replace pipeline reports to callers. Request-level errors (`InvalidPath`,
/// `InvalidPattern`, `InvalidRequest`) fail a whole request before any file is
/// touched. File-level errors (`FileRead`, `Backup`, `Write`,
/// `UnsupportedFormat`) are recorded on the affected file's result and the run
/// carries on with the next file.
#[derive(Error, Debug)]
pub enum Error {
    /// The root folder is missing, not a directory, or otherwise unusable.
    #[error("Invalid folder path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The search pattern could not be compiled or is not usable.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// The request is missing a field or carries inconsistent values.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A file could not be opened, decoded or parsed.
    #[error("Failed to read {path}: {reason}")]
    FileRead { path: PathBuf, reason: String },

    /// The backup copy of a file could not be created. The original is untouched.
    #[error("Backup failed for {path}: {source}")]
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing the rewritten file failed after its backup was taken.
    #[error("Write failed for {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// The file's format can be searched but not rewritten.
    #[error("Cannot rewrite {path}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// A worksheet named in a detail lookup does not exist.
    #[error("Sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),

    /// An error related to file system I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that occurred while parsing a YAML configuration file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An error from the `walkdir` crate.
    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// An error related to persisting a temporary file.
    #[error("Tempfile error: {0}")]
    TempFile(#[from] tempfile::PersistError),

    /// An error related to CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error raised while reading a workbook.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// An error raised while building or saving a workbook.
    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// A convenient type alias for `Result<T, cellsweep::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn file_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::FileRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::InvalidPattern(e.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::invalid_path("/nope", "folder does not exist");
        assert_eq!(
            err.to_string(),
            "Invalid folder path '/nope': folder does not exist"
        );

        let err = Error::file_read("book.xlsx", "corrupt zip");
        assert_eq!(err.to_string(), "Failed to read book.xlsx: corrupt zip");
    }

    #[test]
    fn test_regex_error_maps_to_invalid_pattern() {
        let err: Error = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(err, Error::InvalidPattern(_)));
    }
}

use crate::errors::Error;
use crate::patterns::Match;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The class of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    /// The file could not be opened, decoded or parsed. Nothing was matched.
    FileRead,
    /// The backup could not be written. The original is untouched.
    Backup,
    /// The rewrite failed after the backup was taken.
    Write,
    /// The format cannot be rewritten. No backup was taken.
    UnsupportedFormat,
}

impl FileErrorKind {
    pub fn of(error: &Error) -> Self {
        match error {
            Error::Backup { .. } => FileErrorKind::Backup,
            Error::Write { .. } | Error::TempFile(_) | Error::Xlsx(_) => FileErrorKind::Write,
            Error::UnsupportedFormat { .. } => FileErrorKind::UnsupportedFormat,
            _ => FileErrorKind::FileRead,
        }
    }
}

/// The outcome for one processed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    pub file_path: PathBuf,
    pub file_name: String,
    pub matches: Vec<Match>,
    pub total_matches: usize,
    pub replaced: bool,
    pub backup_path: Option<PathBuf>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FileErrorKind>,
}

impl FileResult {
    pub fn new(path: &Path) -> Self {
        Self {
            file_path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            matches: Vec::new(),
            total_matches: 0,
            replaced: false,
            backup_path: None,
            error: None,
            error_kind: None,
        }
    }

    pub fn with_matches(mut self, matches: Vec<Match>) -> Self {
        self.total_matches = matches.len();
        self.matches = matches;
        self
    }

    /// Records a failure. Read failures also clear any matches.
    pub fn record_error(&mut self, error: &Error) {
        let kind = FileErrorKind::of(error);
        if kind == FileErrorKind::FileRead {
            self.matches.clear();
            self.total_matches = 0;
        }
        self.replaced = false;
        self.error = Some(error.to_string());
        self.error_kind = Some(kind);
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// The top-level answer to a search/replace request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    pub success: bool,
    pub results: Vec<FileResult>,
    /// Candidate files processed, including those that failed.
    pub total_files: usize,
    pub files_with_matches: usize,
    /// Matches rewritten across every file that was actually replaced.
    pub total_replacements: usize,
    pub preview_only: bool,
}

impl SearchReport {
    pub fn total_matches(&self) -> usize {
        self.results.iter().map(|r| r.total_matches).sum()
    }

    pub fn errors(&self) -> impl Iterator<Item = &FileResult> {
        self.results.iter().filter(|r| r.is_error())
    }
}

/// Collects file results in processing order and derives the folder totals.
#[derive(Debug, Default)]
pub struct Aggregator {
    results: Vec<FileResult>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn finish(self, preview_only: bool) -> SearchReport {
        let total_files = self.results.len();
        let files_with_matches = self.results.iter().filter(|r| r.total_matches > 0).count();
        let total_replacements = self
            .results
            .iter()
            .filter(|r| r.replaced)
            .map(|r| r.total_matches)
            .sum();

        SearchReport {
            success: true,
            results: self.results,
            total_files,
            files_with_matches,
            total_replacements,
            preview_only,
        }
    }
}

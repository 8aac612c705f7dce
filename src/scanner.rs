use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::formats::spreadsheet::SpreadsheetDocument;
use crate::formats::{Document, Location, handler_for};
use crate::output_formatter::{OutputFormat, OutputFormatter};
use crate::paths::resolve_folder;
use crate::patterns::{KeywordSet, Match, SearchPattern};
use crate::replacer::{Replacer, backup_path_for};
use crate::results::{Aggregator, FileErrorKind, FileResult, SearchReport};
use crate::summary_workbook::{export_path, write_summary_workbook};
use crate::walker::{CandidateFile, ExtensionFilter, FileEnumerator, FormatKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A search or search-and-replace request, as accepted from the command line
/// or from a JSON request file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub folder_path: String,
    pub search_pattern: String,
    #[serde(default)]
    pub use_regex: bool,
    /// Required, possibly empty, when `preview_only` is false.
    #[serde(default)]
    pub replace_pattern: Option<String>,
    /// `None` selects the configured text extensions.
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,
    #[serde(default = "default_preview_only")]
    pub preview_only: bool,
}

fn default_preview_only() -> bool {
    true
}

impl SearchRequest {
    /// Reads a request from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// One (cell, keyword) hit from the keyword search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordHit {
    pub file_name: String,
    pub file_path: PathBuf,
    pub sheet: String,
    /// 1-based.
    pub row: u32,
    /// 1-based.
    pub col: u32,
    pub value: String,
    pub keyword: String,
}

/// A workbook the keyword search could not open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file_path: PathBuf,
    pub error: String,
}

/// The answer to a keyword search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordReport {
    pub success: bool,
    pub keywords: Vec<String>,
    pub results: Vec<KeywordHit>,
    pub total_matches: usize,
    pub files_searched: usize,
    pub failed_files: Vec<FailedFile>,
}

/// Runs a search, and in execute mode a replace, over every candidate file below
/// the request's folder.
///
/// The request is validated in full before any file is opened: the folder must
/// exist, the pattern must compile, the extension list must not be empty, and
/// execute mode needs a replacement whose group references exist. After that,
/// per-file failures are recorded on that file's result and the run carries on.
pub fn run_search_replace(request: &SearchRequest, settings: &Settings) -> Result<SearchReport> {
    let root = resolve_folder(&request.folder_path)?;
    let pattern = SearchPattern::new(&request.search_pattern, request.use_regex)?;
    let extensions = request
        .file_extensions
        .as_deref()
        .unwrap_or(&settings.text_extensions);
    let filter = ExtensionFilter::new(extensions)?;

    let replacer = if request.preview_only {
        None
    } else {
        let replacement = request.replace_pattern.as_deref().ok_or_else(|| {
            Error::InvalidRequest("a replacement is required unless previewing".to_string())
        })?;
        Some(Replacer::new(&pattern, replacement, &settings.backup_suffix)?)
    };

    info!(
        root = %root.display(),
        pattern = pattern.as_str(),
        regex = pattern.is_regex(),
        preview_only = request.preview_only,
        "starting search"
    );

    let mut aggregator = Aggregator::new();
    for candidate in FileEnumerator::new(root, filter).iter() {
        let result = process_file(&candidate, &pattern, replacer.as_ref(), settings.context_chars);
        aggregator.push(result);
    }

    let report = aggregator.finish(request.preview_only);
    info!(
        files = report.total_files,
        files_with_matches = report.files_with_matches,
        replacements = report.total_replacements,
        "search finished"
    );
    Ok(report)
}

fn process_file(
    candidate: &CandidateFile,
    pattern: &SearchPattern,
    replacer: Option<&Replacer<'_>>,
    context_chars: usize,
) -> FileResult {
    let path = candidate.path.as_path();
    let mut result = FileResult::new(path);
    let handler = handler_for(candidate.kind);

    let mut doc = match handler.load(path) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "skipping unreadable file");
            result.record_error(&e);
            return result;
        }
    };

    let matches: Vec<Match> = doc
        .units()
        .iter()
        .flat_map(|unit| pattern.find_matches(unit, context_chars))
        .collect();
    let mut result = result.with_matches(matches);
    debug!(file = %path.display(), matches = result.total_matches, "scanned");

    let Some(replacer) = replacer else {
        return result;
    };
    if result.total_matches == 0 {
        return result;
    }

    match replacer.rewrite(path, handler, doc.as_mut()) {
        Ok(outcome) => {
            result.replaced = true;
            result.backup_path = Some(outcome.backup_path);
            info!(file = %path.display(), replacements = outcome.replacements, "rewritten");
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "replace failed");
            result.record_error(&e);
            // The backup was taken before the write failed and is kept for recovery.
            if result.error_kind == Some(FileErrorKind::Write) {
                result.backup_path = Some(backup_path_for(path, replacer.backup_suffix()));
            }
        }
    }
    result
}

/// Searches every cell of every spreadsheet below `folder` for the given
/// keywords, case-insensitively. Each (cell, keyword) pair is one hit.
pub fn search_keywords(
    folder: &str,
    keywords: &[String],
    extensions: &[String],
) -> Result<KeywordReport> {
    let root = resolve_folder(folder)?;
    let keyword_set = KeywordSet::new(keywords)?;
    let filter = ExtensionFilter::new(extensions)?;

    info!(root = %root.display(), keywords = ?keyword_set.keywords(), "starting keyword search");

    let mut results = Vec::new();
    let mut failed_files = Vec::new();
    let mut files_searched = 0;

    for candidate in FileEnumerator::new(root, filter).iter() {
        if candidate.kind != FormatKind::Spreadsheet {
            debug!(file = %candidate.path.display(), "not a spreadsheet, skipped");
            continue;
        }
        files_searched += 1;

        let doc = match SpreadsheetDocument::open(&candidate.path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(file = %candidate.path.display(), error = %e, "skipping unreadable workbook");
                failed_files.push(FailedFile {
                    file_path: candidate.path.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let file_name = candidate
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for unit in doc.units() {
            let Location::Cell { sheet, row, col } = &unit.location else {
                continue;
            };
            for keyword in keyword_set.matching(&unit.value) {
                results.push(KeywordHit {
                    file_name: file_name.clone(),
                    file_path: candidate.path.clone(),
                    sheet: sheet.clone(),
                    row: *row,
                    col: *col,
                    value: unit.value.clone(),
                    keyword: keyword.to_string(),
                });
            }
        }
    }

    Ok(KeywordReport {
        success: true,
        keywords: keyword_set.keywords().iter().map(|k| k.to_string()).collect(),
        total_matches: results.len(),
        results,
        files_searched,
        failed_files,
    })
}

/// The main entry point for the `search` command.
pub fn run_search(
    dir: &str,
    keywords: &[String],
    extensions: &[String],
    format: OutputFormat,
    export: bool,
    settings: &Settings,
) -> Result<()> {
    let extensions = if extensions.is_empty() {
        settings.spreadsheet_extensions.as_slice()
    } else {
        extensions
    };
    let report = search_keywords(dir, keywords, extensions)?;

    let formatter = OutputFormatter::new(format);
    formatter.write_keyword_report(&mut std::io::stdout(), &report)?;

    if export && !report.results.is_empty() {
        let path = export_path(&settings.results_dir);
        match export_hits(&report, &path) {
            Ok(()) => eprintln!("Results workbook written to {}", path.display()),
            // The report is already printed; a failed export does not undo it.
            Err(e) => warn!(file = %path.display(), error = %e, "results workbook not written"),
        }
    }

    Ok(())
}

fn export_hits(report: &KeywordReport, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    write_summary_workbook(&report.results, &report.keywords, path)
}

/// The main entry point for the `replace` command.
pub fn run_replace(request: &SearchRequest, format: OutputFormat, settings: &Settings) -> Result<()> {
    let report = run_search_replace(request, settings)?;

    let formatter = OutputFormatter::new(format);
    formatter.write_report(&mut std::io::stdout(), &report)?;

    if report.preview_only && report.files_with_matches > 0 {
        eprintln!("\nPreview only. Run with --execute to apply the replacements.");
    }
    Ok(())
}

use crate::errors::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Extensions handled as workbooks rather than as lines of text.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &[".xlsx", ".xlsm", ".xls", ".ods"];

/// How a file's content is extracted and written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// A workbook made of sheets of addressable cells.
    Spreadsheet,
    /// A UTF-8 file read line by line.
    PlainText,
}

impl FormatKind {
    /// Picks the format family for a normalized extension such as `.xlsx`.
    pub fn for_extension(extension: &str) -> Self {
        if SPREADSHEET_EXTENSIONS.contains(&extension) {
            FormatKind::Spreadsheet
        } else {
            FormatKind::PlainText
        }
    }
}

/// A file selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path to the file.
    pub path: PathBuf,
    /// The allow-list entry the file name matched, lowercase with a leading dot.
    pub extension: String,
    pub kind: FormatKind,
}

/// A case-insensitive allow-list of file name suffixes.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: Vec<String>,
}

impl ExtensionFilter {
    /// Builds a filter from user-supplied entries.
    ///
    /// Entries are trimmed, lowercased and given a leading dot when it is
    /// missing. Blank entries are ignored; a list with no usable entry is an
    /// [`Error::InvalidRequest`].
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut extensions: Vec<String> = entries
            .iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty() && e != ".")
            .map(|e| if e.starts_with('.') { e } else { format!(".{e}") })
            .collect();
        extensions.sort();
        extensions.dedup();

        if extensions.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one file extension is required".to_string(),
            ));
        }
        Ok(Self { extensions })
    }

    /// Returns the longest allow-list entry the file name ends with.
    pub fn matching(&self, path: &Path) -> Option<&str> {
        let name = file_name_lowercase(path);
        self.extensions
            .iter()
            .filter(|ext| name.len() > ext.len() && name.ends_with(ext.as_str()))
            .max_by_key(|ext| ext.len())
            .map(String::as_str)
    }
}

/// Lists candidate files below a root folder.
///
/// The walk is recursive with no depth limit. Symbolic links are not followed,
/// so link cycles cannot trap it. Entries inside each directory are visited in
/// file-name order, which makes the sequence identical across runs as long as
/// the tree does not change.
pub struct FileEnumerator {
    root: PathBuf,
    filter: ExtensionFilter,
}

impl FileEnumerator {
    pub fn new(root: impl Into<PathBuf>, filter: ExtensionFilter) -> Self {
        Self {
            root: root.into(),
            filter,
        }
    }

    /// Starts a fresh, lazy walk over the tree.
    ///
    /// Unreadable entries are logged and skipped.
    pub fn iter(&self) -> impl Iterator<Item = CandidateFile> + '_ {
        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| {
                let extension = self.filter.matching(entry.path())?.to_string();
                Some(CandidateFile {
                    kind: FormatKind::for_extension(&extension),
                    path: entry.into_path(),
                    extension,
                })
            })
    }
}

fn file_name_lowercase(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(files: &[CandidateFile], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_filter_normalizes_entries() {
        let filter = ExtensionFilter::new(&["TXT", " .Csv ", "", ".txt"]).unwrap();
        assert_eq!(filter.matching(Path::new("a.TXT")), Some(".txt"));
        assert_eq!(filter.matching(Path::new("b.csv")), Some(".csv"));
        assert_eq!(filter.matching(Path::new("c.md")), None);
    }

    #[test]
    fn test_empty_filter_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            ExtensionFilter::new(&empty).unwrap_err(),
            Error::InvalidRequest(_)
        ));
        assert!(ExtensionFilter::new(&["  "]).is_err());
    }

    #[test]
    fn test_filter_matches_case_insensitively() {
        let filter = ExtensionFilter::new(&[".txt", ".tar.gz", ".gz"]).unwrap();
        assert_eq!(filter.matching(Path::new("A/NOTES.TXT")), Some(".txt"));
        assert_eq!(filter.matching(Path::new("pkg.tar.gz")), Some(".tar.gz"));
        assert_eq!(filter.matching(Path::new("notes.txt.bak")), None);
        assert_eq!(filter.matching(Path::new(".txt")), None);
    }

    #[test]
    fn test_walks_recursively_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("sub/deeper")).unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("skip.md"), "no").unwrap();
        fs::write(root.join("sub/c.TXT"), "c").unwrap();
        fs::write(root.join("sub/deeper/d.xlsx"), "not really").unwrap();

        let filter = ExtensionFilter::new(&[".txt", ".xlsx"]).unwrap();
        let enumerator = FileEnumerator::new(root, filter);
        let files: Vec<_> = enumerator.iter().collect();

        assert_eq!(
            names(&files, root),
            vec!["a.txt", "b.txt", "sub/c.TXT", "sub/deeper/d.xlsx"]
        );
        assert_eq!(files[2].extension, ".txt");
        assert_eq!(files[3].kind, FormatKind::Spreadsheet);
        assert_eq!(files[0].kind, FormatKind::PlainText);
    }

    #[test]
    fn test_walk_is_restartable() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(temp_dir.path().join(format!("f{i}.csv")), "x").unwrap();
        }
        let enumerator =
            FileEnumerator::new(temp_dir.path(), ExtensionFilter::new(&[".csv"]).unwrap());
        let first: Vec<_> = enumerator.iter().collect();
        let second: Vec<_> = enumerator.iter().collect();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_kind_for_extension() {
        assert_eq!(FormatKind::for_extension(".xlsx"), FormatKind::Spreadsheet);
        assert_eq!(FormatKind::for_extension(".csv"), FormatKind::PlainText);
    }
}

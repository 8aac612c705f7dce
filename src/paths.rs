//! Turns a folder path typed or pasted by a user into a canonical directory path.

use crate::errors::{Error, Result};
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Normalizes and validates a user-supplied folder path.
///
/// Surrounding whitespace and one pair of matching quotes are removed (pasted
/// "copy as path" values carry them), separators are converted to the host
/// convention, and the result is canonicalized. Fails with
/// [`Error::InvalidPath`] when the input is empty, does not exist or is not a
/// directory.
pub fn resolve_folder(input: &str) -> Result<PathBuf> {
    let cleaned = strip_quotes(input.trim());
    if cleaned.is_empty() {
        return Err(Error::invalid_path(input, "no folder path given"));
    }

    let normalized = normalize_separators(cleaned);
    let candidate = Path::new(&normalized);

    if !candidate.exists() {
        return Err(Error::invalid_path(input, "folder does not exist"));
    }
    if !candidate.is_dir() {
        return Err(Error::invalid_path(input, "path is not a folder"));
    }

    let resolved = candidate
        .canonicalize()
        .map_err(|e| Error::invalid_path(input, e.to_string()))?;
    Ok(strip_unc_prefix(resolved))
}

/// Rewrites both separator conventions to the host's.
pub fn normalize_separators(path: &str) -> String {
    let foreign = if MAIN_SEPARATOR == '/' { '\\' } else { '/' };
    path.replace(foreign, &MAIN_SEPARATOR.to_string())
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return s[1..s.len() - 1].trim();
        }
    }
    s
}

/// Drops the `\\?\` prefix Windows adds to canonical paths.
fn strip_unc_prefix(path: PathBuf) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_prefix(r"\\?\")) {
        Some(stripped) => PathBuf::from(stripped),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolves_existing_folder() {
        let temp_dir = TempDir::new().unwrap();
        let resolved = resolve_folder(temp_dir.path().to_str().unwrap()).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_trims_whitespace_and_quotes() {
        let temp_dir = TempDir::new().unwrap();
        let quoted = format!("  \"{}\"  ", temp_dir.path().display());
        let resolved = resolve_folder(&quoted).unwrap();
        assert_eq!(resolved, temp_dir.path().canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_accepts_backslash_separators() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("inner")).unwrap();
        let input = format!("{}\\inner", temp_dir.path().display());
        let resolved = resolve_folder(&input).unwrap();
        assert!(resolved.ends_with("inner"));
    }

    #[test]
    fn test_missing_folder_is_invalid_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");
        let err = resolve_folder(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[test]
    fn test_file_is_not_a_folder() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        let err = resolve_folder(file.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("not a folder"));
    }

    #[test]
    fn test_blank_input_rejected() {
        assert!(matches!(
            resolve_folder("   ").unwrap_err(),
            Error::InvalidPath { .. }
        ));
    }
}

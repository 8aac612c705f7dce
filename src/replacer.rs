use crate::config::Settings;
use crate::errors::{Error, Result};
use crate::formats::{Document, FormatHandler};
use crate::paths::resolve_folder;
use crate::patterns::SearchPattern;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Core engine for rewriting matches inside loaded documents.
///
/// Each call to [`Replacer::rewrite`] is an independent transaction for one
/// file: check the format is writable, back the original up, rewrite the
/// in-memory copy, then swap it in atomically.
pub struct Replacer<'a> {
    pattern: &'a SearchPattern,
    replacement: &'a str,
    backup_suffix: &'a str,
}

/// The result of rewriting a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Where the original content was saved.
    pub backup_path: PathBuf,
    /// The number of matches rewritten.
    pub replacements: usize,
}

/// Statistics from an `undo` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoStats {
    /// The number of backup files found.
    pub found: usize,
    /// The number of files successfully restored from backups.
    pub restored: usize,
}

/// Statistics from a `clean-backups` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanStats {
    pub found: usize,
    pub removed: usize,
    /// Combined size of the backups found.
    pub bytes: u64,
}

impl<'a> Replacer<'a> {
    /// Creates a `Replacer`, checking that `replacement` only names groups the
    /// pattern defines.
    pub fn new(
        pattern: &'a SearchPattern,
        replacement: &'a str,
        backup_suffix: &'a str,
    ) -> Result<Self> {
        pattern.validate_replacement(replacement)?;
        Ok(Self {
            pattern,
            replacement,
            backup_suffix,
        })
    }

    pub fn backup_suffix(&self) -> &str {
        self.backup_suffix
    }

    /// Rewrites every match in `doc` and writes it over `path`.
    ///
    /// The steps are:
    /// 1. The format must be writable, else `UnsupportedFormat` and nothing is touched.
    /// 2. The original is copied to its backup path, else `Backup` and nothing is touched.
    /// 3. Every matched span is rewritten in memory.
    /// 4. The document is encoded and persisted through a temp file in the same
    ///    directory, keeping the original permissions. Failure here is `Write`;
    ///    the backup stays behind.
    pub fn rewrite(
        &self,
        path: &Path,
        handler: &dyn FormatHandler,
        doc: &mut dyn Document,
    ) -> Result<ReplaceOutcome> {
        handler.check_writable(path)?;

        let backup_path = backup_path_for(path, self.backup_suffix);
        fs::copy(path, &backup_path).map_err(|source| Error::Backup {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(backup = %backup_path.display(), "backup written");

        let mut replacements = 0;
        for idx in 0..doc.units().len() {
            let value = &doc.units()[idx].value;
            let count = self.pattern.count(value);
            if count == 0 {
                continue;
            }
            let rewritten = self.pattern.replace(value, self.replacement).into_owned();
            doc.set_value(idx, rewritten);
            replacements += count;
        }

        let bytes = doc.encode().map_err(|e| Error::write(path, e))?;
        write_atomically(path, &bytes).map_err(|e| Error::write(path, e))?;

        Ok(ReplaceOutcome {
            backup_path,
            replacements,
        })
    }
}

/// The backup location for `path`: its file name with `suffix` appended.
pub fn backup_path_for(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Replaces the file at `path` with `bytes` without ever leaving it half written.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        Some(_) => Path::new("."),
        None => {
            return Err(Error::write(path, "could not get parent directory"));
        }
    };

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(bytes)?;
    temp_file.flush()?;

    // Preserve file permissions
    let perms = fs::metadata(path)?.permissions();
    fs::set_permissions(temp_file.path(), perms)?;

    temp_file.persist(path)?;
    Ok(())
}

/// Scans a directory for backup files and copies each one back over its original.
///
/// # Arguments
///
/// * `dir` - The directory to scan for backup files.
/// * `suffix` - The backup suffix, e.g. `.bak`.
/// * `keep_backups` - If `false`, backups are deleted after being restored.
pub fn restore_backups(dir: &Path, suffix: &str, keep_backups: bool) -> Result<UndoStats> {
    let mut found = 0;
    let mut restored = 0;

    for backup in find_backups(dir, suffix) {
        found += 1;
        let Some(original) = original_path_for(&backup, suffix) else {
            continue;
        };
        fs::copy(&backup, &original)?;
        if !keep_backups {
            fs::remove_file(&backup)?;
        }
        restored += 1;
        info!(file = %original.display(), "restored from backup");
    }

    Ok(UndoStats { found, restored })
}

/// Removes every backup file below `dir`, or only counts them when `dry_run` is set.
pub fn clean_backups(dir: &Path, suffix: &str, dry_run: bool) -> Result<CleanStats> {
    let mut stats = CleanStats {
        found: 0,
        removed: 0,
        bytes: 0,
    };

    for backup in find_backups(dir, suffix) {
        stats.found += 1;
        if let Ok(metadata) = backup.metadata() {
            stats.bytes += metadata.len();
        }
        if dry_run {
            continue;
        }
        match fs::remove_file(&backup) {
            Ok(()) => stats.removed += 1,
            Err(e) => warn!(file = %backup.display(), error = %e, "failed to remove backup"),
        }
    }

    Ok(stats)
}

fn find_backups(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| original_path_for(entry.path(), suffix).is_some())
        .map(|entry| entry.into_path())
        .collect()
}

fn original_path_for(backup: &Path, suffix: &str) -> Option<PathBuf> {
    let name = backup.file_name()?.to_str()?;
    let original = name.strip_suffix(suffix)?;
    if original.is_empty() {
        return None;
    }
    Some(backup.with_file_name(original))
}

/// The main entry point for the `undo` command.
pub fn run_undo(dir: &str, settings: &Settings, keep_backups: bool) -> Result<()> {
    let root = resolve_folder(dir)?;
    let stats = restore_backups(&root, &settings.backup_suffix, keep_backups)?;
    println!(
        "\nBackups found: {}, restored: {}",
        stats.found, stats.restored
    );
    Ok(())
}

/// The main entry point for the `clean-backups` command.
pub fn run_clean_backups(dir: &str, settings: &Settings, dry_run: bool) -> Result<()> {
    let root = resolve_folder(dir)?;
    println!("Searching for backup files in {}...\n", root.display());

    if dry_run {
        for backup in find_backups(&root, &settings.backup_suffix) {
            println!("Would remove: {}", backup.display());
        }
    }
    let stats = clean_backups(&root, &settings.backup_suffix, dry_run)?;

    println!("\n{}", "-".repeat(50));
    println!("Backup files found: {}", stats.found);
    if dry_run {
        println!("Total size: {:.2} MB", stats.bytes as f64 / 1_048_576.0);
        println!("\nRun without --dry-run to remove these files");
    } else {
        println!("Backup files removed: {}", stats.removed);
        println!("Space freed: {:.2} MB", stats.bytes as f64 / 1_048_576.0);
    }

    Ok(())
}

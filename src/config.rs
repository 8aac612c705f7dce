use crate::errors::Result;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The file name looked up in the working folder when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "cellsweep.yaml";

/// Tunables shared by the search, replace and export operations.
///
/// Every field is optional in the YAML file; missing fields keep their defaults.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Extensions searched by `replace` when a request does not list its own.
    pub text_extensions: Vec<String>,
    /// Extensions searched by the keyword search.
    pub spreadsheet_extensions: Vec<String>,
    /// Suffix appended to a file name to form its backup name.
    pub backup_suffix: String,
    /// Characters of context kept on each side of a match.
    pub context_chars: usize,
    /// Rows shown above and below a cell in a detail lookup.
    pub context_rows: u32,
    /// Folder that receives exported results workbooks.
    pub results_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_extensions: [
                ".txt", ".csv", ".html", ".js", ".ts", ".tsx", ".jsx", ".py", ".json", ".xml",
                ".css",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            spreadsheet_extensions: vec![".xlsx".to_string(), ".xls".to_string()],
            backup_suffix: ".bak".to_string(),
            context_chars: 50,
            context_rows: 5,
            results_dir: PathBuf::from("results"),
        }
    }
}

impl Settings {
    /// Rejects values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.backup_suffix.trim().is_empty() {
            return Err("backup_suffix must not be empty".into());
        }
        if self.backup_suffix.contains(['/', '\\']) {
            return Err(format!(
                "backup_suffix '{}' must not contain path separators",
                self.backup_suffix
            )
            .into());
        }
        Ok(())
    }
}

/// A utility for locating and loading the settings file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the configuration file by searching in a prioritized list of locations.
    ///
    /// The search order is:
    /// 1. The path as given (absolute, or relative to the current directory).
    /// 2. A path relative to the `working_dir`.
    /// 3. Inside the `~/.cellsweep` directory.
    /// 4. Next to the executable, then its parent and grandparent directories
    ///    (to handle `target/release` builds).
    pub fn find_config(config_path: &Path, working_dir: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let mut candidates = vec![working_dir.join(config_path)];

        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".cellsweep").join(config_path));
        }

        if let Ok(exe_path) = env::current_exe() {
            let mut dir = exe_path.parent();
            for _ in 0..3 {
                match dir {
                    Some(d) => {
                        candidates.push(d.join(config_path));
                        dir = d.parent();
                    }
                    None => break,
                }
            }
        }

        if let Some(found) = candidates.iter().find(|c| c.exists()) {
            return Ok(found.clone());
        }

        let tried: Vec<String> = std::iter::once(config_path.display().to_string())
            .chain(candidates.iter().map(|c| c.display().to_string()))
            .collect();

        Err(format!(
            "Config file '{}' not found. Searched in:\n  - {}",
            config_path.display(),
            tried.join("\n  - ")
        )
        .into())
    }

    /// Loads `Settings` from a YAML file.
    pub fn load_settings(path: &Path) -> Result<Settings> {
        let file = File::open(path)?;
        let settings: Settings = serde_yaml::from_reader(file)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolves the settings for a run.
    ///
    /// An explicit path must exist somewhere on the search list. Without one,
    /// `cellsweep.yaml` in `working_dir` is used when present, else defaults.
    pub fn resolve(explicit: Option<&Path>, working_dir: &Path) -> Result<Settings> {
        match explicit {
            Some(path) => {
                let found = Self::find_config(path, working_dir)?;
                tracing::info!(config = %found.display(), "loading settings");
                Self::load_settings(&found)
            }
            None => {
                let local = working_dir.join(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    tracing::info!(config = %local.display(), "loading settings");
                    Self::load_settings(&local)
                } else {
                    Ok(Settings::default())
                }
            }
        }
    }
}

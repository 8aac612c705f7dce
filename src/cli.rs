use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keyword search across spreadsheet folders, plus bulk find/replace with backups.
///
/// `cellsweep` walks a folder tree, looks inside every workbook sheet and text
/// file it is allowed to open, and reports each match with its surrounding
/// context. Replacements are previewed by default and only written with
/// `--execute`, after a backup of each changed file has been taken.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Search spreadsheet folders and bulk-replace text with backups",
    long_about = "cellsweep - search folders of spreadsheets and text files, and replace at scale.

Features:
  • Case-insensitive keyword search over every sheet and cell
  • Literal or regex find/replace in .xlsx workbooks and text files
  • Preview by default, automatic backups when executing
  • Cell context lookup and an exportable results workbook

QUICK EXAMPLES:
  cellsweep search -d ./reports -k invoice,overdue     # Find keywords in workbooks
  cellsweep replace -d . -p 'foo' -r 'bar'             # Preview a replacement
  cellsweep replace -d . -p 'foo' -r 'bar' --execute   # Apply it, with backups
  cellsweep undo -d .                                  # Restore from backups

For detailed help on any command, use: cellsweep <command> --help"
)]
pub struct Args {
    /// Path to a YAML settings file. Defaults to `cellsweep.yaml` in the working folder.
    #[arg(long, global = true, env = "CELLSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log progress to stderr. `RUST_LOG` overrides this.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// The set of available commands for the `cellsweep` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search every cell of every workbook for keywords (case-insensitive)
    ///
    /// EXAMPLES:
    ///   cellsweep search -d ./reports -k invoice
    ///   cellsweep search -d . -k apple,pear -f json | jq '.results[]'
    ///   cellsweep search -d . -k total -x xlsx,xlsm --no-export
    Search {
        /// The folder to search.
        #[arg(short, long, required = true)]
        dir: String,

        /// A comma-separated list of keywords.
        #[arg(short, long, value_delimiter = ',', required = true)]
        keywords: Vec<String>,

        /// A comma-separated list of file extensions to include. Defaults to the
        /// configured spreadsheet extensions.
        #[arg(short = 'x', long = "ext", value_delimiter = ',')]
        extensions: Vec<String>,

        /// The output format (`text`, `json`, `csv`).
        #[arg(short = 'f', long = "format", default_value = "text")]
        format: String,

        /// Do not write the results workbook.
        #[arg(long)]
        no_export: bool,
    },

    /// Find and replace in workbooks and text files (preview unless --execute)
    ///
    /// EXAMPLES:
    ///   cellsweep replace -d . -p 'TODO' -r 'DONE'                 # Preview
    ///   cellsweep replace -d . -p 'TODO' -r 'DONE' --execute       # Apply
    ///   cellsweep replace -d . -p '(\d+)-(\d+)' -r '$2-$1' --regex --execute
    ///   cellsweep replace -d data/ -x xlsx,csv -p 'ACME' -r 'Acme Corp'
    ///   cellsweep replace --request request.json
    ///
    /// Request file format (request.json):
    ///   {"folder_path": "./data", "search_pattern": "foo",
    ///    "replace_pattern": "bar", "use_regex": false,
    ///    "file_extensions": [".txt", ".xlsx"], "preview_only": true}
    Replace {
        /// The folder to process.
        #[arg(short, long, required_unless_present = "request")]
        dir: Option<String>,

        /// The text or regex to search for.
        #[arg(short, long, required_unless_present = "request")]
        pattern: Option<String>,

        /// The replacement. Regex mode expands `$1` and `${name}`.
        #[arg(short, long)]
        replacement: Option<String>,

        /// Treat the pattern as a regular expression.
        #[arg(long)]
        regex: bool,

        /// A comma-separated list of file extensions to include. Defaults to the
        /// configured text extensions.
        #[arg(short = 'x', long = "ext", value_delimiter = ',')]
        extensions: Vec<String>,

        /// Write the replacements. Without this flag nothing is modified.
        #[arg(long)]
        execute: bool,

        /// Read the whole request from a JSON file instead of flags.
        #[arg(long, conflicts_with_all = ["dir", "pattern", "replacement", "regex", "extensions", "execute"])]
        request: Option<PathBuf>,

        /// The output format (`text`, `json`, `csv`).
        #[arg(short = 'f', long = "format", default_value = "text")]
        format: String,
    },

    /// Show the rows around one cell of a workbook
    ///
    /// EXAMPLES:
    ///   cellsweep details report.xlsx --sheet Sheet1 --row 3 --col 2
    ///   cellsweep details report.xlsx --sheet 'Q1 Sales' --row 40 --col 5 --context-rows 2
    Details {
        /// The workbook to open.
        file: PathBuf,

        /// The sheet holding the cell.
        #[arg(long, required = true)]
        sheet: String,

        /// The 1-based row of the cell.
        #[arg(long, required = true)]
        row: u32,

        /// The 1-based column of the cell.
        #[arg(long, required = true)]
        col: u32,

        /// The keyword that led to the cell, echoed in the output.
        #[arg(short, long, default_value = "")]
        keyword: String,

        /// Rows shown above and below the cell. Defaults to the configured value.
        #[arg(long)]
        context_rows: Option<u32>,
    },

    /// Restore files from backups (undo replacements)
    ///
    /// EXAMPLES:
    ///   cellsweep undo -d .                    # Restore all files in current dir
    ///   cellsweep undo -d data/ --keep-backups # Restore but keep .bak files
    Undo {
        /// The folder where the `replace` operation was run.
        #[arg(short, long, required = true)]
        dir: String,

        /// Keep the backup files after restoring the original files.
        #[arg(long)]
        keep_backups: bool,
    },

    /// Remove backup files without restoring
    ///
    /// EXAMPLES:
    ///   cellsweep clean-backups -d . --dry-run  # Preview what would be deleted
    ///   cellsweep clean-backups -d .            # Delete all .bak files
    CleanBackups {
        /// The folder to clean of backup files.
        #[arg(short, long, required = true)]
        dir: String,

        /// Preview which backup files would be removed without deleting them.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_replace_flags() {
        let args = Args::try_parse_from([
            "cellsweep", "-v", "replace", "-d", "data", "-p", "foo", "-r", "bar", "-x",
            "txt,xlsx", "--execute",
        ])
        .unwrap();
        assert!(args.verbose);
        match args.command {
            Commands::Replace {
                dir,
                pattern,
                replacement,
                extensions,
                execute,
                request,
                ..
            } => {
                assert_eq!(dir.as_deref(), Some("data"));
                assert_eq!(pattern.as_deref(), Some("foo"));
                assert_eq!(replacement.as_deref(), Some("bar"));
                assert_eq!(extensions, vec!["txt", "xlsx"]);
                assert!(execute);
                assert!(request.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_replace_needs_dir_or_request() {
        assert!(Args::try_parse_from(["cellsweep", "replace", "-p", "foo"]).is_err());
        assert!(Args::try_parse_from(["cellsweep", "replace", "--request", "r.json"]).is_ok());
        assert!(
            Args::try_parse_from(["cellsweep", "replace", "--request", "r.json", "-d", "."])
                .is_err()
        );
    }

    #[test]
    fn test_search_keywords_split_on_commas() {
        let args =
            Args::try_parse_from(["cellsweep", "search", "-d", ".", "-k", "apple,pear"]).unwrap();
        match args.command {
            Commands::Search {
                keywords, no_export, ..
            } => {
                assert_eq!(keywords, vec!["apple", "pear"]);
                assert!(!no_export);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

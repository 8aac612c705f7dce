//! The main entry point for the `cellsweep` command-line application.
//!
//! This file is responsible for parsing command-line arguments, setting up
//! logging and settings, and dispatching to the appropriate subcommand handler
//! in the `cellsweep` library.

use anyhow::{Context, Result};
use cellsweep::cli::{self, Commands};
use cellsweep::config::ConfigLoader;
use cellsweep::details::{self, CellDetailsRequest};
use cellsweep::output_formatter::OutputFormat;
use cellsweep::replacer;
use cellsweep::scanner::{self, SearchRequest};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Check if no arguments provided
    let args_vec: Vec<String> = env::args().collect();
    if args_vec.len() == 1 {
        println!("Search spreadsheet folders and bulk-replace text with backups\n");
        println!("QUICK START EXAMPLES:");
        println!("  cellsweep search -d ./reports -k invoice,overdue    # Keyword search");
        println!("  cellsweep replace -d . -p 'foo' -r 'bar'           # Preview a replacement");
        println!("  cellsweep replace -d . -p 'foo' -r 'bar' --execute # Apply it");
        println!("  cellsweep details book.xlsx --sheet Sheet1 --row 3 --col 2");
        println!("  cellsweep undo -d .                                # Restore from backups\n");
        println!("Run 'cellsweep --help' for full command list");
        println!("Run 'cellsweep <command> --help' for detailed command help");
        process::exit(0);
    }

    let args = cli::parse_args();
    init_logging(args.verbose);

    let working_dir = env::current_dir().context("cannot determine the working folder")?;
    let settings = ConfigLoader::resolve(args.config.as_deref(), &working_dir)?;

    match args.command {
        Commands::Search {
            dir,
            keywords,
            extensions,
            format,
            no_export,
        } => scanner::run_search(
            &dir,
            &keywords,
            &extensions,
            OutputFormat::from(format.as_str()),
            !no_export,
            &settings,
        )?,
        Commands::Replace {
            dir,
            pattern,
            replacement,
            regex,
            extensions,
            execute,
            request,
            format,
        } => {
            let request = match request {
                Some(path) => SearchRequest::from_json_file(&path)
                    .with_context(|| format!("cannot read request file {}", path.display()))?,
                None => SearchRequest {
                    folder_path: dir.unwrap_or_default(),
                    search_pattern: pattern.unwrap_or_default(),
                    use_regex: regex,
                    replace_pattern: replacement,
                    file_extensions: (!extensions.is_empty()).then_some(extensions),
                    preview_only: !execute,
                },
            };
            scanner::run_replace(&request, OutputFormat::from(format.as_str()), &settings)?
        }
        Commands::Details {
            file,
            sheet,
            row,
            col,
            keyword,
            context_rows,
        } => details::run_details(
            CellDetailsRequest {
                file_path: file,
                sheet_name: sheet,
                row,
                col,
                keyword,
                context_rows,
            },
            &settings,
        )?,
        Commands::Undo { dir, keep_backups } => replacer::run_undo(&dir, &settings, keep_backups)?,
        Commands::CleanBackups { dir, dry_run } => {
            replacer::run_clean_backups(&dir, &settings, dry_run)?
        }
    }

    Ok(())
}

/// Logs go to stderr so report output on stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let default = if verbose { "cellsweep=info" } else { "cellsweep=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

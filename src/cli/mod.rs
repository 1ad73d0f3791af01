//! The liquid-html command-line interface.
//!
//! Dispatches subcommands to the library and turns their outcome into an
//! exit code: 0 when everything parsed, 1 otherwise.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::{fs, io, process};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use crate::cli::args::{Command, LiquidHtmlArgs, ParseArgs};
use crate::errors::SourceContext;
use crate::syntax::build_cst;

pub mod args;
pub mod output;

/// Failures of the CLI itself, as opposed to templates that do not parse.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("could not write JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The main entry point for the CLI.
pub fn run() {
    init_tracing();
    let args = LiquidHtmlArgs::parse();

    let result = match args.command {
        Command::Check { path, parse } => handle_check(&path, parse),
        Command::Ast { file, parse } => handle_ast(&file, parse),
        Command::Cst { file, parse } => handle_cst(&file, parse),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_source(path: &Path) -> Result<SourceContext, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceContext::from_file(path.display().to_string(), content))
}

/// Every `.liquid` file under `root`, or `root` itself when it is a file.
fn discover(root: &Path) -> Result<Vec<PathBuf>, CliError> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| CliError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let is_template = entry.path().extension().is_some_and(|ext| ext == "liquid");
        if entry.file_type().is_file() && is_template {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn handle_check(root: &Path, parse: ParseArgs) -> Result<bool, CliError> {
    let files = discover(root)?;
    debug!(count = files.len(), root = %root.display(), "checking templates");
    let mut failed = 0;
    for file in &files {
        let ctx = read_source(file)?;
        match crate::parse_source(&ctx, &parse.options(), parse.entry()) {
            Ok(_) => output::print_ok(file),
            Err(error) => {
                failed += 1;
                output::print_failure(error);
            }
        }
    }
    output::print_summary(files.len(), failed);
    Ok(failed == 0)
}

fn handle_ast(file: &Path, parse: ParseArgs) -> Result<bool, CliError> {
    let ctx = read_source(file)?;
    match crate::parse_source(&ctx, &parse.options(), parse.entry()) {
        Ok(document) => {
            output::print_json(&document)?;
            Ok(true)
        }
        Err(error) => {
            output::print_failure(error);
            Ok(false)
        }
    }
}

fn handle_cst(file: &Path, parse: ParseArgs) -> Result<bool, CliError> {
    let ctx = read_source(file)?;
    match build_cst(&ctx, 0, &ctx.content, parse.mode, parse.entry()) {
        Ok(nodes) => {
            output::print_json(&nodes)?;
            Ok(true)
        }
        Err(error) => {
            output::print_failure(error);
            Ok(false)
        }
    }
}

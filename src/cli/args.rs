//! Command-line arguments and subcommands.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ParseMode, ParseOptions};
use crate::syntax::Entry;

#[derive(Debug, Parser)]
#[command(
    name = "liquid-html",
    version,
    about = "Parse Liquid + HTML templates and report structural errors."
)]
pub struct LiquidHtmlArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a template, or every `.liquid` file under a directory.
    Check {
        #[arg(required = true)]
        path: PathBuf,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Print the abstract syntax tree of a template as JSON.
    Ast {
        #[arg(required = true)]
        file: PathBuf,
        #[command(flatten)]
        parse: ParseArgs,
    },
    /// Print the flat concrete syntax tree of a template as JSON.
    Cst {
        #[arg(required = true)]
        file: PathBuf,
        #[command(flatten)]
        parse: ParseArgs,
    },
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Copy, Args)]
pub struct ParseArgs {
    /// How unparsable tag markup is treated.
    #[arg(long, value_enum, default_value_t = ParseMode::Tolerant)]
    pub mode: ParseMode,
    /// Accept templates that end with elements or tags still open.
    #[arg(long)]
    pub allow_unclosed: bool,
    /// Parse as Liquid only, treating HTML as text.
    #[arg(long)]
    pub liquid_only: bool,
}

impl ParseArgs {
    pub fn options(&self) -> ParseOptions {
        ParseOptions::new(self.mode).allow_unclosed(self.allow_unclosed)
    }

    pub fn entry(&self) -> Entry {
        if self.liquid_only {
            Entry::Liquid
        } else {
            Entry::LiquidHtml
        }
    }
}

//! Handles all user-facing output for the CLI.
//!
//! Trees go to stdout as JSON; progress and summaries are colorized with
//! termcolor; parse failures are rendered by miette on stderr.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::errors::{print_error, LiquidHtmlError};

/// Writes `value` to stdout as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)?;
    let _ = writeln!(handle);
    Ok(())
}

/// One line per file that parsed cleanly.
pub fn print_ok(path: &Path) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
    let _ = write!(stdout, "ok");
    let _ = stdout.reset();
    let _ = writeln!(stdout, "   {}", path.display());
}

pub fn print_failure(error: LiquidHtmlError) {
    print_error(error);
}

/// Totals after a `check` run.
pub fn print_summary(checked: usize, failed: usize) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let color = if failed == 0 { Color::Green } else { Color::Red };
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    if failed == 0 {
        let _ = writeln!(stdout, "{checked} file(s) parsed without errors");
    } else {
        let _ = writeln!(stdout, "{failed} of {checked} file(s) failed to parse");
    }
    let _ = stdout.reset();
}

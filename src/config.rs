//! Parse options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How forgiving the grammar is towards malformed tag markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Named-tag markup that does not parse is a syntax error.
    Strict,
    /// Named-tag markup that does not parse is kept as a raw string.
    #[default]
    Tolerant,
    /// Tolerant, and identifiers may contain the completion placeholder.
    Completion,
}

/// Character editors insert at the caret before asking for completions.
pub const PLACEHOLDER: char = '\u{2588}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    pub mode: ParseMode,
    /// Return nodes still open at end of input instead of failing.
    pub allow_unclosed_document_node: bool,
}

impl ParseOptions {
    pub fn new(mode: ParseMode) -> Self {
        Self {
            mode,
            allow_unclosed_document_node: false,
        }
    }

    pub fn strict() -> Self {
        Self::new(ParseMode::Strict)
    }

    pub fn tolerant() -> Self {
        Self::new(ParseMode::Tolerant)
    }

    pub fn completion() -> Self {
        Self::new(ParseMode::Completion)
    }

    pub fn allow_unclosed(mut self, allow: bool) -> Self {
        self.allow_unclosed_document_node = allow;
        self
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseMode::Strict => "strict",
            ParseMode::Tolerant => "tolerant",
            ParseMode::Completion => "completion",
        };
        f.write_str(name)
    }
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(ParseMode::Strict),
            "tolerant" => Ok(ParseMode::Tolerant),
            "completion" => Ok(ParseMode::Completion),
            other => Err(format!("unknown parse mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ParseOptions = serde_json::from_str(r#"{"mode":"strict"}"#).unwrap();
        assert_eq!(options.mode, ParseMode::Strict);
        assert!(!options.allow_unclosed_document_node);

        let options: ParseOptions =
            serde_json::from_str(r#"{"allowUnclosedDocumentNode":true}"#).unwrap();
        assert_eq!(options, ParseOptions::tolerant().allow_unclosed(true));
    }

    #[test]
    fn mode_round_trips_through_text() {
        for mode in [ParseMode::Strict, ParseMode::Tolerant, ParseMode::Completion] {
            assert_eq!(mode.to_string().parse::<ParseMode>(), Ok(mode));
        }
        assert!("lenient".parse::<ParseMode>().is_err());
    }
}

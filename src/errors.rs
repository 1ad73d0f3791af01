//! Error handling for both parsing stages.
//!
//! Syntax errors come out of the grammar, structural errors out of the
//! tree builder. Both abort the parse and both render through miette.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::position::Position;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Source text plus a display name, shared by every error of one parse call.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Context for sources that did not come from a file.
    pub fn anonymous(content: &str) -> Self {
        Self::from_file("<input>", content)
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.to_string()))
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// What was left open when the tree builder gave up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnclosedNode {
    pub kind: String,
    pub name: String,
    pub block_start_position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// The grammar could not match the input.
    Syntax,
    /// Well-formed tokens nested in an invalid arrangement.
    Structural,
}

#[derive(Debug, Error)]
pub enum LiquidHtmlError {
    #[error("{message}")]
    Syntax {
        message: String,
        position: Position,
        source_code: Arc<NamedSource<String>>,
    },
    #[error("{message}")]
    Structural {
        message: String,
        position: Position,
        unclosed: Option<UnclosedNode>,
        source_code: Arc<NamedSource<String>>,
    },
}

impl LiquidHtmlError {
    pub fn syntax(ctx: &SourceContext, message: impl Into<String>, position: Position) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
            source_code: ctx.to_named_source(),
        }
    }

    pub fn structural(
        ctx: &SourceContext,
        message: impl Into<String>,
        position: Position,
        unclosed: Option<UnclosedNode>,
    ) -> Self {
        Self::Structural {
            message: message.into(),
            position,
            unclosed,
            source_code: ctx.to_named_source(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            Self::Syntax { .. } => ErrorType::Syntax,
            Self::Structural { .. } => ErrorType::Structural,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { message, .. } | Self::Structural { message, .. } => message,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Self::Syntax { position, .. } | Self::Structural { position, .. } => *position,
        }
    }

    pub fn unclosed(&self) -> Option<&UnclosedNode> {
        match self {
            Self::Structural { unclosed, .. } => unclosed.as_ref(),
            Self::Syntax { .. } => None,
        }
    }

    fn primary_label(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "unexpected input",
            Self::Structural { unclosed: Some(_), .. } => "left open",
            Self::Structural { .. } => "invalid nesting",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::Syntax => write!(f, "syntax"),
            ErrorType::Structural => write!(f, "structural"),
        }
    }
}

impl Diagnostic for LiquidHtmlError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("liquid_html::{}", self.error_type())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Self::Syntax { .. } => Some(Box::new(
                "tolerant and completion modes accept unparsable tag markup as raw text",
            )),
            Self::Structural { unclosed: Some(node), .. } => Some(Box::new(format!(
                "add the closing tag for {} '{}'",
                node.kind, node.name
            ))),
            Self::Structural { .. } => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let mut labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label().to_string()),
            self.position().to_source_span(),
        )];
        if let Some(node) = self.unclosed() {
            if node.block_start_position != self.position() {
                labels.push(LabeledSpan::new_with_span(
                    Some("opened here".to_string()),
                    node.block_start_position.to_source_span(),
                ));
            }
        }
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            Self::Syntax { source_code, .. } | Self::Structural { source_code, .. } => {
                Some(&**source_code)
            }
        }
    }
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints an error with full miette diagnostics to stderr.
pub fn print_error(error: LiquidHtmlError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_names_the_tier() {
        let ctx = SourceContext::anonymous("</a>");
        let error = LiquidHtmlError::structural(&ctx, "boom", Position::new(0, 4), None);
        assert_eq!(
            error.code().map(|c| c.to_string()),
            Some("liquid_html::structural".to_string())
        );
        assert_eq!(error.error_type(), ErrorType::Structural);
    }

    #[test]
    fn unclosed_payload_adds_a_label() {
        let ctx = SourceContext::anonymous("<div>");
        let error = LiquidHtmlError::structural(
            &ctx,
            "Attempting to end parsing before HtmlElement 'div' was closed",
            Position::at(5),
            Some(UnclosedNode {
                kind: "HtmlElement".into(),
                name: "div".into(),
                block_start_position: Position::new(0, 5),
            }),
        );
        assert_eq!(error.labels().map(|l| l.count()), Some(2));
    }
}

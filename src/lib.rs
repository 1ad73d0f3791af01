//! Parser for Liquid templates interleaved with HTML.
//!
//! Parsing runs in two stages. The grammar cuts the source into a flat
//! concrete tree ([`syntax`]), then the tree builder nests it into a
//! [`Document`] ([`ast`]). Both stages report failures as
//! [`LiquidHtmlError`].
//!
//! ```rust
//! use liquid_html_parser::{parse_liquid_html, ParseOptions};
//!
//! let document = parse_liquid_html("<p>{{ product.title }}</p>", &ParseOptions::default()).unwrap();
//! assert_eq!(document.children.len(), 1);
//! ```

pub use crate::ast::Document;
pub use crate::config::{ParseMode, ParseOptions};
pub use crate::errors::{LiquidHtmlError, SourceContext, UnclosedNode};

pub mod ast;
pub mod cli;
pub mod config;
pub mod errors;
pub mod position;
pub mod syntax;

use tracing::debug;

use crate::ast::{build_ast, BuildContext};
use crate::position::Position;
use crate::syntax::{build_cst, Entry};

/// Parses Liquid interleaved with HTML.
pub fn parse_liquid_html(source: &str, options: &ParseOptions) -> Result<Document, LiquidHtmlError> {
    parse_source(&SourceContext::anonymous(source), options, Entry::LiquidHtml)
}

/// Parses Liquid only; anything that looks like HTML is text.
pub fn parse_liquid(source: &str, options: &ParseOptions) -> Result<Document, LiquidHtmlError> {
    parse_source(&SourceContext::anonymous(source), options, Entry::Liquid)
}

/// Parses the content of `ctx`; errors are reported against its name.
pub fn parse_source(
    ctx: &SourceContext,
    options: &ParseOptions,
    entry: Entry,
) -> Result<Document, LiquidHtmlError> {
    let source = &*ctx.content;
    let cst = build_cst(ctx, 0, source, options.mode, entry)?;
    let children = build_ast(cst, &BuildContext::new(ctx, options), source.len())?;
    debug!(
        name = %ctx.name,
        mode = %options.mode,
        nodes = children.len(),
        "parsed document"
    );
    Ok(Document {
        children,
        source: ctx.content.clone(),
        position: Position::new(0, source.len()),
    })
}

//! Maps the grammar's parse tree onto concrete nodes.
//!
//! A builder is bound to the absolute offset of the text it parses. Raw
//! bodies, `{% liquid %}` statements, `{% doc %}` bodies and tag markup are
//! parsed by a second builder created at the substring's offset, so every
//! position it produces is already in full-source terms.

use pest::iterators::Pair;
use tracing::{debug, trace};

use super::cst::*;
use super::grammar::{failure_range, match_rule, GrammarError, Rule};
use crate::config::ParseMode;
use crate::errors::{LiquidHtmlError, SourceContext};
use crate::position::Position;

pub type CstResult<T> = Result<T, LiquidHtmlError>;

/// Which document grammar a region is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Liquid interleaved with HTML.
    LiquidHtml,
    /// Liquid only; HTML is plain text.
    Liquid,
    /// The line-oriented statements of a `{% liquid %}` tag.
    LiquidStatements,
    /// The body of a `{% doc %}` tag.
    DocContents,
}

impl Entry {
    fn start_rule(self) -> Rule {
        match self {
            Entry::LiquidHtml => Rule::liquid_html_document,
            Entry::Liquid => Rule::liquid_document,
            Entry::LiquidStatements => Rule::liquid_tag_contents,
            Entry::DocContents => Rule::liquid_doc_contents,
        }
    }
}

/// Parses `text`, which starts at `offset` in the source held by `ctx`.
pub fn build_cst(
    ctx: &SourceContext,
    offset: usize,
    text: &str,
    mode: ParseMode,
    entry: Entry,
) -> CstResult<Vec<ConcreteNode>> {
    CstBuilder::new(ctx, offset, mode).build(text, entry)
}

pub struct CstBuilder<'ctx> {
    ctx: &'ctx SourceContext,
    offset: usize,
    mode: ParseMode,
}

/// Pieces shared by every `{% ... %}` shaped rule.
#[derive(Default)]
struct TagParts<'i> {
    name: Option<Pair<'i, Rule>>,
    markup: Option<Pair<'i, Rule>>,
    body: Option<Pair<'i, Rule>>,
    whitespace_start: bool,
    whitespace_end: bool,
}

impl<'ctx> CstBuilder<'ctx> {
    pub fn new(ctx: &'ctx SourceContext, offset: usize, mode: ParseMode) -> Self {
        Self { ctx, offset, mode }
    }

    /// A builder for a substring starting at absolute `offset`.
    pub(super) fn at(&self, offset: usize) -> Self {
        Self::new(self.ctx, offset, self.mode)
    }

    fn with_mode(self, mode: ParseMode) -> Self {
        Self { mode, ..self }
    }

    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    pub fn build(&self, text: &str, entry: Entry) -> CstResult<Vec<ConcreteNode>> {
        let pairs = match_rule(entry.start_rule(), text).map_err(|e| self.syntax_error(&e))?;
        let mut nodes = Vec::new();
        for root in pairs {
            for pair in root.into_inner() {
                if pair.as_rule() != Rule::EOI {
                    nodes.push(self.node(pair)?);
                }
            }
        }
        debug!(
            ?entry,
            offset = self.offset,
            count = nodes.len(),
            "built concrete nodes"
        );
        Ok(nodes)
    }

    // ========================================================================
    // SHARED HELPERS
    // ========================================================================

    pub(super) fn position(&self, pair: &Pair<'_, Rule>) -> Position {
        Position::from(pair.as_span()).offset_by(self.offset)
    }

    pub(super) fn syntax_error(&self, error: &GrammarError) -> LiquidHtmlError {
        let (start, end) = failure_range(error);
        LiquidHtmlError::syntax(
            self.ctx,
            format!("SyntaxError: {}", error.variant.message()),
            Position::new(start + self.offset, end + self.offset),
        )
    }

    pub(super) fn error_at(&self, message: impl Into<String>, position: Position) -> LiquidHtmlError {
        LiquidHtmlError::syntax(self.ctx, message, position)
    }

    pub(super) fn unexpected(&self, pair: &Pair<'_, Rule>) -> LiquidHtmlError {
        self.error_at(
            format!("Unexpected {:?} in parse tree", pair.as_rule()),
            self.position(pair),
        )
    }

    /// Unwraps a child the grammar guarantees.
    pub(super) fn expect<'i>(
        &self,
        pair: Option<Pair<'i, Rule>>,
        what: &str,
        position: Position,
    ) -> CstResult<Pair<'i, Rule>> {
        pair.ok_or_else(|| self.error_at(format!("Missing {what}"), position))
    }

    fn text(&self, pair: &Pair<'_, Rule>) -> ConcreteNode {
        ConcreteNode::TextNode(ConcreteText {
            value: pair.as_str().to_string(),
            position: self.position(pair),
        })
    }

    fn collect_parts<'i>(&self, pair: Pair<'i, Rule>) -> CstResult<TagParts<'i>> {
        let mut parts = TagParts::default();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::strip_start => parts.whitespace_start = true,
                Rule::strip_end => parts.whitespace_end = true,
                Rule::block_name
                | Rule::tag_name
                | Rule::close_name
                | Rule::raw_tag_name
                | Rule::statement_name => parts.name = Some(inner),
                Rule::tag_markup | Rule::statement_markup => parts.markup = Some(inner),
                Rule::statement_comment_body => parts.body = Some(inner),
                _ => return Err(self.unexpected(&inner)),
            }
        }
        Ok(parts)
    }

    // ========================================================================
    // NODE CONSTRUCTION
    // ========================================================================

    fn node(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteNode> {
        let position = self.position(&pair);
        trace!(rule = ?pair.as_rule(), ?position, "concrete node");
        match pair.as_rule() {
            Rule::text_node | Rule::liquid_text_node | Rule::doc_text => Ok(self.text(&pair)),

            Rule::yaml_frontmatter => Ok(ConcreteNode::YamlFrontmatter {
                body: inner_text(pair),
                position,
            }),

            Rule::html_doctype => Ok(ConcreteNode::HtmlDoctype {
                legacy_doctype_string: pair.into_inner().next().map(|p| p.as_str().to_string()),
                position,
            }),

            Rule::html_comment => Ok(ConcreteNode::HtmlComment {
                body: inner_text(pair),
                position,
            }),

            Rule::html_raw_tag => self.html_raw_tag(pair),

            Rule::html_void_element => {
                let mut name = Vec::new();
                let mut attr_list = Vec::new();
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::void_name => name = vec![self.text(&inner)],
                        _ => attr_list.push(self.node(inner)?),
                    }
                }
                Ok(ConcreteNode::HtmlVoidElement {
                    name,
                    attr_list,
                    position,
                })
            }

            Rule::html_self_closing | Rule::html_tag_open | Rule::html_tag_close => {
                let rule = pair.as_rule();
                let mut name = Vec::new();
                let mut attr_list = Vec::new();
                for inner in pair.into_inner() {
                    match inner.as_rule() {
                        Rule::html_name => name = self.fragments(inner)?,
                        _ => attr_list.push(self.node(inner)?),
                    }
                }
                Ok(match rule {
                    Rule::html_self_closing => ConcreteNode::HtmlSelfClosingElement {
                        name,
                        attr_list,
                        position,
                    },
                    Rule::html_tag_open => ConcreteNode::HtmlTagOpen {
                        name,
                        attr_list,
                        position,
                    },
                    _ => ConcreteNode::HtmlTagClose { name, position },
                })
            }

            Rule::attr_double_quoted | Rule::attr_single_quoted | Rule::attr_unquoted => {
                self.attribute(pair)
            }

            Rule::attr_empty => {
                let name = match pair.into_inner().next() {
                    Some(attr_name) => self.fragments(attr_name)?,
                    None => Vec::new(),
                };
                Ok(ConcreteNode::AttrEmpty { name, position })
            }

            Rule::liquid_drop => self.liquid_drop(pair),

            Rule::liquid_tag_open | Rule::statement_open => self.liquid_tag(pair, true),
            Rule::liquid_tag | Rule::statement_tag => self.liquid_tag(pair, false),

            Rule::liquid_tag_close | Rule::statement_close => {
                let parts = self.collect_parts(pair)?;
                let name = self.expect(parts.name, "closing tag name", position)?;
                Ok(ConcreteNode::LiquidTagClose(ConcreteTagClose {
                    name: name.as_str().to_string(),
                    whitespace_start: parts.whitespace_start,
                    whitespace_end: parts.whitespace_end,
                    position,
                }))
            }

            Rule::liquid_raw_tag => self.liquid_raw_tag(pair),
            Rule::statement_comment => self.statement_comment(pair),

            Rule::doc_param => self.doc_param(pair),
            Rule::doc_example => Ok(ConcreteNode::LiquidDocExample {
                content: inner_text(pair).trim().to_string(),
                position,
            }),
            Rule::doc_description => Ok(ConcreteNode::LiquidDocDescription {
                content: inner_text(pair).trim().to_string(),
                position,
            }),

            _ => Err(self.unexpected(&pair)),
        }
    }

    /// Text and `{{ }}` pieces of a tag name, attribute name or value.
    fn fragments(&self, pair: Pair<'_, Rule>) -> CstResult<Vec<ConcreteNode>> {
        pair.into_inner()
            .map(|inner| match inner.as_rule() {
                Rule::name_text
                | Rule::attr_name_text
                | Rule::attr_dq_text
                | Rule::attr_sq_text
                | Rule::attr_uq_text => Ok(self.text(&inner)),
                _ => self.node(inner),
            })
            .collect()
    }

    fn attribute(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteNode> {
        let rule = pair.as_rule();
        let position = self.position(&pair);
        let mut attribute = ConcreteAttribute {
            name: Vec::new(),
            value: Vec::new(),
            value_position: Position::at(position.end()),
            position,
        };
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::attr_name => attribute.name = self.fragments(inner)?,
                Rule::attr_dq_value | Rule::attr_sq_value | Rule::attr_uq_value => {
                    attribute.value_position = self.position(&inner);
                    attribute.value = self.fragments(inner)?;
                }
                _ => return Err(self.unexpected(&inner)),
            }
        }
        Ok(match rule {
            Rule::attr_double_quoted => ConcreteNode::AttrDoubleQuoted(attribute),
            Rule::attr_single_quoted => ConcreteNode::AttrSingleQuoted(attribute),
            _ => ConcreteNode::AttrUnquoted(attribute),
        })
    }

    fn html_raw_tag(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteNode> {
        let position = self.position(&pair);
        let mut name = Vec::new();
        let mut attr_list = Vec::new();
        let mut body = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::html_raw_name => name = vec![self.text(&inner)],
                Rule::html_raw_body => body = Some(inner),
                _ => attr_list.push(self.node(inner)?),
            }
        }
        let body = self.expect(body, "raw element body", position)?;
        let body_position = self.position(&body);
        // Embedded Liquid in script/style bodies is always read tolerantly.
        let body_nodes = self
            .at(body_position.start())
            .with_mode(ParseMode::Tolerant)
            .build(body.as_str(), Entry::Liquid)?;
        Ok(ConcreteNode::HtmlRawTag(ConcreteHtmlRawTag {
            name,
            attr_list,
            body: body.as_str().to_string(),
            body_position,
            body_nodes,
            block_start_position: Position::new(position.start(), body_position.start()),
            block_end_position: Position::new(body_position.end(), position.end()),
            position,
        }))
    }

    fn liquid_drop(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteNode> {
        let position = self.position(&pair);
        let mut whitespace_start = false;
        let mut whitespace_end = false;
        let mut markup = ConcreteDropMarkup::Raw(String::new());
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::strip_start => whitespace_start = true,
                Rule::strip_end => whitespace_end = true,
                Rule::drop_markup => {
                    markup = self.drop_markup(inner.as_str(), self.position(&inner))?;
                }
                _ => return Err(self.unexpected(&inner)),
            }
        }
        Ok(ConcreteNode::LiquidDrop(ConcreteDrop {
            markup,
            whitespace_start,
            whitespace_end,
            position,
        }))
    }

    fn liquid_tag(&self, pair: Pair<'_, Rule>, open: bool) -> CstResult<ConcreteNode> {
        let position = self.position(&pair);
        let parts = self.collect_parts(pair)?;
        let name = self.expect(parts.name, "tag name", position)?;
        let (markup_text, markup_position) = match &parts.markup {
            Some(markup) => (markup.as_str(), self.position(markup)),
            None => ("", Position::at(self.position(&name).end())),
        };
        let markup = self.tag_markup(name.as_str(), markup_text, markup_position)?;
        let tag = ConcreteTag {
            name: name.as_str().to_string(),
            markup,
            markup_position,
            whitespace_start: parts.whitespace_start,
            whitespace_end: parts.whitespace_end,
            position,
        };
        Ok(if open {
            ConcreteNode::LiquidTagOpen(tag)
        } else {
            ConcreteNode::LiquidTag(tag)
        })
    }

    fn liquid_raw_tag(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteNode> {
        let position = self.position(&pair);
        let mut inner = pair.into_inner();
        let open = self.expect(inner.next(), "raw tag opening", position)?;
        let body = self.expect(inner.next(), "raw tag body", position)?;
        let close = self.expect(inner.next(), "raw tag closing", position)?;

        let block_start_position = self.position(&open);
        let block_end_position = self.position(&close);
        let body_position = self.position(&body);
        let open = self.collect_parts(open)?;
        let close = self.collect_parts(close)?;
        let name = self.expect(open.name, "raw tag name", position)?;
        let name = name.as_str().to_string();
        let body_nodes = self.raw_tag_body(&name, body.as_str(), body_position)?;

        Ok(ConcreteNode::LiquidRawTag(ConcreteRawTag {
            markup: open.markup.map(|m| m.as_str().to_string()).unwrap_or_default(),
            name,
            body: body.as_str().to_string(),
            body_position,
            body_nodes,
            whitespace_start: open.whitespace_start,
            whitespace_end: open.whitespace_end,
            delimiter_whitespace_start: close.whitespace_start,
            delimiter_whitespace_end: close.whitespace_end,
            block_start_position,
            block_end_position,
            position,
        }))
    }

    /// `comment ... endcomment` inside a `{% liquid %}` tag.
    fn statement_comment(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteNode> {
        let position = self.position(&pair);
        let parts = self.collect_parts(pair)?;
        let body = self.expect(parts.body, "comment body", position)?;
        let body_position = self.position(&body);
        Ok(ConcreteNode::LiquidRawTag(ConcreteRawTag {
            name: "comment".to_string(),
            markup: String::new(),
            body: body.as_str().to_string(),
            body_position,
            body_nodes: text_body(body.as_str(), body_position),
            whitespace_start: false,
            whitespace_end: false,
            delimiter_whitespace_start: false,
            delimiter_whitespace_end: false,
            block_start_position: Position::new(position.start(), body_position.start()),
            block_end_position: Position::new(body_position.end(), position.end()),
            position,
        }))
    }

    fn raw_tag_body(
        &self,
        name: &str,
        body: &str,
        body_position: Position,
    ) -> CstResult<Vec<ConcreteNode>> {
        match name {
            "doc" => self
                .at(body_position.start())
                .build(body, Entry::DocContents),
            "style" => self
                .at(body_position.start())
                .with_mode(ParseMode::Tolerant)
                .build(body, Entry::Liquid),
            _ => Ok(text_body(body, body_position)),
        }
    }

    fn doc_param(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteNode> {
        let position = self.position(&pair);
        let mut param = ConcreteDocParam {
            name: String::new(),
            param_type: None,
            description: None,
            required: true,
            position,
        };
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::doc_param_type => param.param_type = Some(inner_text(inner).trim().to_string()),
                Rule::doc_param_name => param.name = inner.as_str().to_string(),
                Rule::doc_optional_name => {
                    param.required = false;
                    param.name = inner_text(inner);
                }
                Rule::doc_param_description => param.description = Some(inner.as_str().to_string()),
                _ => return Err(self.unexpected(&inner)),
            }
        }
        Ok(ConcreteNode::LiquidDocParam(param))
    }
}

/// Text of the first child, or empty when the child matched nothing.
fn inner_text(pair: Pair<'_, Rule>) -> String {
    pair.into_inner()
        .next()
        .map(|inner| inner.as_str().to_string())
        .unwrap_or_default()
}

/// A verbatim body as a single trimmed text node, or nothing when blank.
fn text_body(body: &str, body_position: Position) -> Vec<ConcreteNode> {
    let value = body.trim();
    if value.is_empty() {
        return Vec::new();
    }
    let start = body_position.start() + (body.len() - body.trim_start().len());
    vec![ConcreteNode::TextNode(ConcreteText {
        value: value.to_string(),
        position: Position::new(start, start + value.len()),
    })]
}

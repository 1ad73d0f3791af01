//! Builds the nested tree out of the flat concrete sequence.
//!
//! The builder keeps a stack of open frames. Each frame owns the children
//! collected so far; closing a frame finalizes its node and appends it to
//! the frame below, or to the roots. Branching tags hold a branch frame on
//! top of their own frame for as long as they are open, so content always
//! lands inside a branch.

use tracing::{debug, trace};

use super::names::get_name;
use super::translate;
use super::*;
use crate::config::{ParseMode, ParseOptions};
use crate::errors::{LiquidHtmlError, SourceContext, UnclosedNode};
use crate::syntax::cst::{
    ConcreteAttribute, ConcreteHtmlRawTag, ConcreteNode, ConcreteRawTag, ConcreteTag,
    ConcreteTagClose,
};
use crate::syntax::named_tags::{is_branch_tag, is_branching_tag, is_conditional_tag};

pub type BuildResult<T> = Result<T, LiquidHtmlError>;

/// Open containers allowed at once before the input is rejected.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Settings shared by one tree build and the builds nested inside it.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub source: &'a SourceContext,
    pub mode: ParseMode,
    pub allow_unclosed_document_node: bool,
}

impl<'a> BuildContext<'a> {
    pub fn new(source: &'a SourceContext, options: &ParseOptions) -> Self {
        Self {
            source,
            mode: options.mode,
            allow_unclosed_document_node: options.allow_unclosed_document_node,
        }
    }

    /// Attribute lists, attribute values, names and `{% liquid %}` bodies.
    fn nested(&self) -> Self {
        Self {
            allow_unclosed_document_node: false,
            ..*self
        }
    }

    /// Liquid embedded in raw bodies.
    fn raw_body(&self) -> Self {
        Self {
            mode: ParseMode::Tolerant,
            allow_unclosed_document_node: true,
            ..*self
        }
    }
}

/// Nests `cst` into a node list. `end` is where the region ends, used for
/// nodes still open at the end when that is allowed.
pub fn build_ast(
    cst: Vec<ConcreteNode>,
    cx: &BuildContext<'_>,
    end: usize,
) -> BuildResult<Vec<AstNode>> {
    let mut builder = AstBuilder::new(*cx);
    for node in cst {
        builder.step(node)?;
    }
    builder.finish(end)
}

// ============================================================================
// FRAMES
// ============================================================================

enum Open {
    Element(HtmlElement),
    Tag(LiquidTag),
    Branch(LiquidBranch),
}

struct Frame {
    open: Open,
    children: Vec<AstNode>,
    /// Closed branches, for branching tags.
    branches: Vec<LiquidBranch>,
}

/// How a frame ends.
enum Ending {
    /// Implied by something else; zero-width at this offset.
    Implicit(usize),
    /// Its own closing tag.
    Explicit(CloseParts),
}

struct CloseParts {
    position: Position,
    whitespace_start: bool,
    whitespace_end: bool,
}

enum Closed {
    Node(AstNode),
    Branch(LiquidBranch),
}

impl Open {
    fn position(&self) -> Position {
        match self {
            Open::Element(element) => element.position,
            Open::Tag(tag) => tag.position,
            Open::Branch(branch) => branch.position,
        }
    }
}

impl Frame {
    fn kind(&self) -> &'static str {
        match self.open {
            Open::Element(_) => "HtmlElement",
            Open::Tag(_) => "LiquidTag",
            Open::Branch(_) => "LiquidBranch",
        }
    }

    fn name(&self) -> String {
        match &self.open {
            Open::Element(element) => get_name(&element.name),
            Open::Tag(tag) => tag.name.clone(),
            Open::Branch(branch) => branch.name.clone().unwrap_or_default(),
        }
    }

    fn is_default_branch(&self) -> bool {
        matches!(&self.open, Open::Branch(branch) if branch.name.is_none())
    }

    fn label(&self) -> String {
        format!("{} '{}'", self.kind(), self.name())
    }

    fn unclosed(&self) -> UnclosedNode {
        let block_start_position = match &self.open {
            Open::Element(element) => element.block_start_position,
            Open::Tag(tag) => tag.block_start_position,
            Open::Branch(branch) => branch.block_start_position,
        };
        UnclosedNode {
            kind: self.kind().to_string(),
            name: self.name(),
            block_start_position,
        }
    }

    fn close(self, ending: &Ending) -> Closed {
        let (end, block_end) = match ending {
            Ending::Implicit(at) => (*at, Position::at(*at)),
            Ending::Explicit(close) => (close.position.end(), close.position),
        };
        match self.open {
            Open::Element(mut element) => {
                element.position = Position::new(element.position.start(), end);
                element.block_end_position = block_end;
                element.children = self.children;
                Closed::Node(AstNode::HtmlElement(element))
            }
            Open::Tag(mut tag) => {
                tag.position = Position::new(tag.position.start(), end);
                tag.block_end_position = Some(block_end);
                if let Ending::Explicit(close) = ending {
                    tag.delimiter_whitespace_start = close.whitespace_start;
                    tag.delimiter_whitespace_end = close.whitespace_end;
                }
                let mut branches = self.branches.into_iter();
                tag.body = match branches.next() {
                    Some(default) => LiquidTagBody::Branched(Branches {
                        default,
                        alternates: branches.collect(),
                    }),
                    None => LiquidTagBody::Block(self.children),
                };
                Closed::Node(AstNode::LiquidTag(tag))
            }
            Open::Branch(mut branch) => {
                branch.position = Position::new(branch.position.start(), end);
                branch.block_end_position = block_end;
                branch.children = self.children;
                Closed::Branch(branch)
            }
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

struct AstBuilder<'a> {
    cx: BuildContext<'a>,
    roots: Vec<AstNode>,
    stack: Vec<Frame>,
}

impl<'a> AstBuilder<'a> {
    fn new(cx: BuildContext<'a>) -> Self {
        Self {
            cx,
            roots: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn structural(
        &self,
        message: String,
        position: Position,
        unclosed: Option<UnclosedNode>,
    ) -> LiquidHtmlError {
        debug!(%message, ?position, "structural error");
        LiquidHtmlError::structural(self.cx.source, message, position, unclosed)
    }

    /// The node a diagnostic should blame: the top frame, or the tag owning
    /// it when the top is an unnamed default branch.
    fn innermost(&self) -> Option<&Frame> {
        let mut frames = self.stack.iter().rev();
        let top = frames.next()?;
        if top.is_default_branch() {
            frames.next().or(Some(top))
        } else {
            Some(top)
        }
    }

    fn mismatched_close(&self, target: &str, position: Position) -> LiquidHtmlError {
        match self.innermost() {
            None => self.structural(
                format!("Attempting to close {target} before it was opened"),
                position,
                None,
            ),
            Some(frame) => self.structural(
                format!("Attempting to close {target} before {} was closed", frame.label()),
                position,
                Some(frame.unclosed()),
            ),
        }
    }

    // ------------------------------------------------------------------------
    // Stack primitives
    // ------------------------------------------------------------------------

    fn push(&mut self, node: AstNode) {
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(node),
            None => self.roots.push(node),
        }
    }

    fn open(&mut self, open: Open) -> BuildResult<()> {
        if self.stack.len() >= MAX_NESTING_DEPTH {
            return Err(self.structural(
                format!("Nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}"),
                open.position(),
                None,
            ));
        }
        self.stack.push(Frame {
            open,
            children: Vec::new(),
            branches: Vec::new(),
        });
        Ok(())
    }

    fn pop(&mut self, ending: Ending) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        trace!(node = %frame.label(), depth = self.stack.len(), "close");
        match frame.close(&ending) {
            Closed::Node(node) => self.push(node),
            Closed::Branch(branch) => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.branches.push(branch);
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    fn step(&mut self, node: ConcreteNode) -> BuildResult<()> {
        match node {
            ConcreteNode::TextNode(text) => self.push(translate::text(text)),
            ConcreteNode::YamlFrontmatter { body, position } => {
                self.push(AstNode::YamlFrontmatter(YamlFrontmatter { body, position }))
            }
            ConcreteNode::HtmlDoctype {
                legacy_doctype_string,
                position,
            } => self.push(AstNode::HtmlDoctype(HtmlDoctype {
                legacy_doctype_string,
                position,
            })),
            ConcreteNode::HtmlComment { body, position } => {
                self.push(AstNode::HtmlComment(HtmlComment { body, position }))
            }
            ConcreteNode::HtmlRawTag(raw) => {
                let node = self.html_raw_node(raw)?;
                self.push(node);
            }
            ConcreteNode::HtmlVoidElement {
                name,
                attr_list,
                position,
            } => {
                let name = self.nested(name, position.end())?;
                let attributes = self.nested(attr_list, position.end())?;
                self.push(AstNode::HtmlVoidElement(HtmlVoidElement {
                    name,
                    attributes,
                    position,
                }));
            }
            ConcreteNode::HtmlSelfClosingElement {
                name,
                attr_list,
                position,
            } => {
                let name = self.nested(name, position.end())?;
                let attributes = self.nested(attr_list, position.end())?;
                self.push(AstNode::HtmlSelfClosingElement(HtmlSelfClosingElement {
                    name,
                    attributes,
                    position,
                }));
            }
            ConcreteNode::HtmlTagOpen {
                name,
                attr_list,
                position,
            } => {
                let element = HtmlElement {
                    name: self.nested(name, position.end())?,
                    attributes: self.nested(attr_list, position.end())?,
                    children: Vec::new(),
                    position,
                    block_start_position: position,
                    block_end_position: Position::UNSET,
                };
                self.open(Open::Element(element))?;
            }
            ConcreteNode::HtmlTagClose { name, position } => {
                let name = self.nested(name, position.end())?;
                self.close_element(name, position)?;
            }
            ConcreteNode::AttrDoubleQuoted(attr) => {
                let attr = self.attribute(attr)?;
                self.push(AstNode::AttrDoubleQuoted(attr));
            }
            ConcreteNode::AttrSingleQuoted(attr) => {
                let attr = self.attribute(attr)?;
                self.push(AstNode::AttrSingleQuoted(attr));
            }
            ConcreteNode::AttrUnquoted(attr) => {
                let attr = self.attribute(attr)?;
                self.push(AstNode::AttrUnquoted(attr));
            }
            ConcreteNode::AttrEmpty { name, position } => {
                let name = self.nested(name, position.end())?;
                self.push(AstNode::AttrEmpty(AttrEmpty { name, position }));
            }
            ConcreteNode::LiquidDrop(drop) => self.push(translate::output(drop)),
            ConcreteNode::LiquidTagOpen(tag) => self.open_tag(tag)?,
            ConcreteNode::LiquidTag(tag) if is_branch_tag(&tag.name) => self.open_branch(tag)?,
            ConcreteNode::LiquidTag(tag) => {
                let tag = self.tag(tag, LiquidTagBody::Leaf)?;
                self.push(AstNode::LiquidTag(tag));
            }
            ConcreteNode::LiquidTagClose(close) => self.close_tag(close)?,
            ConcreteNode::LiquidRawTag(raw) => {
                let node = self.liquid_raw_tag(raw)?;
                self.push(node);
            }
            ConcreteNode::LiquidDocParam(param) => {
                self.push(AstNode::LiquidDocParam(LiquidDocParam {
                    name: param.name,
                    param_type: param.param_type,
                    description: param.description,
                    required: param.required,
                    position: param.position,
                }))
            }
            ConcreteNode::LiquidDocExample { content, position } => {
                self.push(AstNode::LiquidDocExample(LiquidDocBlock { content, position }))
            }
            ConcreteNode::LiquidDocDescription { content, position } => self.push(
                AstNode::LiquidDocDescription(LiquidDocBlock { content, position }),
            ),
        }
        Ok(())
    }

    fn finish(mut self, end: usize) -> BuildResult<Vec<AstNode>> {
        if let Some(frame) = self.innermost() {
            if !self.cx.allow_unclosed_document_node {
                return Err(self.structural(
                    format!("Attempting to end parsing before {} was closed", frame.label()),
                    Position::at(end),
                    Some(frame.unclosed()),
                ));
            }
            debug!(open = self.stack.len(), end, "closing nodes left open");
        }
        while !self.stack.is_empty() {
            self.pop(Ending::Implicit(end));
        }
        Ok(self.roots)
    }

    // ------------------------------------------------------------------------
    // Liquid
    // ------------------------------------------------------------------------

    fn tag(&self, tag: ConcreteTag, body: LiquidTagBody) -> BuildResult<LiquidTag> {
        let statements_end = tag.markup_position.end();
        let markup = translate::markup(tag.markup, |nodes| {
            build_ast(nodes, &self.cx.nested(), statements_end)
        })?;
        Ok(LiquidTag {
            name: tag.name,
            markup,
            body,
            whitespace_start: tag.whitespace_start,
            whitespace_end: tag.whitespace_end,
            delimiter_whitespace_start: false,
            delimiter_whitespace_end: false,
            position: tag.position,
            block_start_position: tag.position,
            block_end_position: None,
        })
    }

    fn open_tag(&mut self, tag: ConcreteTag) -> BuildResult<()> {
        let branching = is_branching_tag(&tag.name);
        let body_start = Position::at(tag.position.end());
        let tag = self.tag(tag, LiquidTagBody::Block(Vec::new()))?;
        self.open(Open::Tag(tag))?;
        if branching {
            self.open(Open::Branch(LiquidBranch {
                name: None,
                markup: TagMarkup::Base(String::new()),
                children: Vec::new(),
                whitespace_start: false,
                whitespace_end: false,
                position: body_start,
                block_start_position: body_start,
                block_end_position: Position::UNSET,
            }))?;
        }
        Ok(())
    }

    /// `elsif`, `else` and `when`: ends the current branch and opens the next.
    fn open_branch(&mut self, tag: ConcreteTag) -> BuildResult<()> {
        let start = tag.position.start();
        loop {
            let Some(frame) = self.stack.last() else {
                return Err(self.structural(
                    format!(
                        "Attempting to open LiquidBranch '{}' outside of a branching tag",
                        tag.name
                    ),
                    tag.position,
                    None,
                ));
            };
            match frame.open {
                Open::Element(_) => {
                    debug!(element = %frame.name(), "implicitly closing element at branch");
                    self.pop(Ending::Implicit(start));
                }
                Open::Branch(_) => {
                    self.pop(Ending::Implicit(start));
                    break;
                }
                Open::Tag(_) => {
                    return Err(self.structural(
                        format!(
                            "Attempting to open LiquidBranch '{}' before {} was closed",
                            tag.name,
                            frame.label()
                        ),
                        tag.position,
                        Some(frame.unclosed()),
                    ));
                }
            }
        }

        let statements_end = tag.markup_position.end();
        let markup = translate::markup(tag.markup, |nodes| {
            build_ast(nodes, &self.cx.nested(), statements_end)
        })?;
        self.open(Open::Branch(LiquidBranch {
            name: Some(tag.name),
            markup,
            children: Vec::new(),
            whitespace_start: tag.whitespace_start,
            whitespace_end: tag.whitespace_end,
            position: tag.position,
            block_start_position: tag.position,
            block_end_position: Position::UNSET,
        }))
    }

    /// `{% endname %}`. Elements left open inside the branches of `if`,
    /// `unless` and `case` close with it; anything else open is an error.
    fn close_tag(&mut self, close: ConcreteTagClose) -> BuildResult<()> {
        let target = format!("LiquidTag '{}'", close.name);
        let Some(index) = self
            .stack
            .iter()
            .rposition(|frame| matches!(frame.open, Open::Tag(_)))
            .filter(|&i| matches!(&self.stack[i].open, Open::Tag(tag) if tag.name == close.name))
        else {
            return Err(self.mismatched_close(&target, close.position));
        };

        let crosses_element = self.stack[index + 1..]
            .iter()
            .any(|frame| matches!(frame.open, Open::Element(_)));
        if crosses_element {
            if !is_conditional_tag(&close.name) {
                return Err(self.mismatched_close(&target, close.position));
            }
            debug!(tag = %close.name, "implicitly closing elements left open in branch");
        }

        while self.stack.len() > index + 1 {
            self.pop(Ending::Implicit(close.position.start()));
        }
        self.pop(Ending::Explicit(CloseParts {
            position: close.position,
            whitespace_start: close.whitespace_start,
            whitespace_end: close.whitespace_end,
        }));
        Ok(())
    }

    fn liquid_raw_tag(&self, raw: ConcreteRawTag) -> BuildResult<AstNode> {
        let kind = translate::raw_tag_kind(&raw.name);
        let body = self.raw_markup(kind, raw.body, raw.body_position, raw.body_nodes)?;
        Ok(AstNode::LiquidRawTag(LiquidRawTag {
            name: raw.name,
            markup: raw.markup,
            body,
            whitespace_start: raw.whitespace_start,
            whitespace_end: raw.whitespace_end,
            delimiter_whitespace_start: raw.delimiter_whitespace_start,
            delimiter_whitespace_end: raw.delimiter_whitespace_end,
            position: raw.position,
            block_start_position: raw.block_start_position,
            block_end_position: raw.block_end_position,
        }))
    }

    fn raw_markup(
        &self,
        kind: RawMarkupKind,
        value: String,
        position: Position,
        nodes: Vec<ConcreteNode>,
    ) -> BuildResult<RawMarkup> {
        Ok(RawMarkup {
            kind,
            value,
            nodes: build_ast(nodes, &self.cx.raw_body(), position.end())?,
            position,
        })
    }

    // ------------------------------------------------------------------------
    // HTML
    // ------------------------------------------------------------------------

    fn nested(&self, nodes: Vec<ConcreteNode>, end: usize) -> BuildResult<Vec<AstNode>> {
        build_ast(nodes, &self.cx.nested(), end)
    }

    fn attribute(&self, attr: ConcreteAttribute) -> BuildResult<Attribute> {
        Ok(Attribute {
            name: self.nested(attr.name, attr.position.end())?,
            value: self.nested(attr.value, attr.value_position.end())?,
            attribute_position: attr.value_position,
            position: attr.position,
        })
    }

    fn html_raw_node(&self, raw: ConcreteHtmlRawTag) -> BuildResult<AstNode> {
        let name = self.nested(raw.name, raw.block_start_position.end())?;
        let attributes = self.nested(raw.attr_list, raw.block_start_position.end())?;
        let script_type = names::attribute_value(&attributes, "type");
        let kind = translate::raw_element_kind(&get_name(&name), script_type.as_deref());
        let body = self.raw_markup(kind, raw.body, raw.body_position, raw.body_nodes)?;
        Ok(AstNode::HtmlRawNode(HtmlRawNode {
            name,
            attributes,
            body,
            position: raw.position,
            block_start_position: raw.block_start_position,
            block_end_position: raw.block_end_position,
        }))
    }

    fn close_element(&mut self, name: Vec<AstNode>, position: Position) -> BuildResult<()> {
        let closing = get_name(&name);
        if let Some(Frame {
            open: Open::Element(element),
            ..
        }) = self.stack.last()
        {
            if get_name(&element.name).eq_ignore_ascii_case(&closing) {
                self.pop(Ending::Explicit(CloseParts {
                    position,
                    whitespace_start: false,
                    whitespace_end: false,
                }));
                return Ok(());
            }
        }

        if self.accepts_dangling_close() {
            debug!(name = %closing, "keeping dangling close tag");
            self.push(AstNode::HtmlDanglingMarkerClose(HtmlDanglingMarkerClose {
                name,
                position,
                block_start_position: position,
            }));
            return Ok(());
        }
        Err(self.mismatched_close(&format!("HtmlElement '{closing}'"), position))
    }

    /// A close tag with no matching element is kept when it leads a branch
    /// of `if`, `unless` or `case` (only other dangling closes before it),
    /// or, while completing, inside any other element.
    fn accepts_dangling_close(&self) -> bool {
        let mut frames = self.stack.iter().rev();
        let Some(top) = frames.next() else {
            return false;
        };
        match &top.open {
            Open::Branch(_) => {
                let leading = top
                    .children
                    .iter()
                    .all(|child| matches!(child, AstNode::HtmlDanglingMarkerClose(_)));
                leading
                    && matches!(
                        frames.next().map(|frame| &frame.open),
                        Some(Open::Tag(tag)) if is_conditional_tag(&tag.name)
                    )
            }
            Open::Element(_) => self.cx.mode == ParseMode::Completion,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{AstNode, LiquidTagBody};
    use crate::position::Position;
    use crate::{parse_liquid_html, ParseOptions};

    #[test]
    fn default_branch_starts_after_the_opening_tag() {
        let source = "{% if a %}A{% else %}B{% endif %}";
        let document = parse_liquid_html(source, &ParseOptions::default()).unwrap();
        let AstNode::LiquidTag(tag) = &document.children[0] else {
            panic!("expected a tag");
        };
        let branches = tag.branches().unwrap();
        assert_eq!(branches.default.position, Position::new(10, 11));
        assert_eq!(branches.default.block_end_position, Position::at(11));
        assert_eq!(branches.alternates[0].position.slice(source), "{% else %}B");
        assert_eq!(tag.block_end_position, Some(Position::new(22, 33)));
    }

    #[test]
    fn block_tags_without_branches_keep_children() {
        let source = "{% capture x %}<b>y</b>{% endcapture %}";
        let document = parse_liquid_html(source, &ParseOptions::default()).unwrap();
        let AstNode::LiquidTag(tag) = &document.children[0] else {
            panic!("expected a tag");
        };
        let LiquidTagBody::Block(children) = &tag.body else {
            panic!("expected a block body");
        };
        assert_eq!(children.len(), 1);
        assert_eq!(tag.position.slice(source), source);
    }

    #[test]
    fn elements_close_implicitly_at_the_next_branch() {
        let source = "{% if a %}<div>{% else %}x{% endif %}";
        let document = parse_liquid_html(source, &ParseOptions::default()).unwrap();
        let AstNode::LiquidTag(tag) = &document.children[0] else {
            panic!("expected a tag");
        };
        let AstNode::HtmlElement(div) = &tag.branches().unwrap().default.children[0] else {
            panic!("expected the div");
        };
        assert_eq!(div.position.slice(source), "<div>");
        assert_eq!(div.block_end_position, Position::at(15));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let source = "<div>".repeat(super::MAX_NESTING_DEPTH + 1);
        let error = parse_liquid_html(&source, &ParseOptions::default().allow_unclosed(true))
            .unwrap_err();
        assert!(error.message().contains("maximum depth"));
    }

    #[test]
    fn unclosed_nodes_end_at_the_region_end() {
        let source = "<p>{% for x in y %}<i>";
        let document =
            parse_liquid_html(source, &ParseOptions::default().allow_unclosed(true)).unwrap();
        let AstNode::HtmlElement(p) = &document.children[0] else {
            panic!("expected the paragraph");
        };
        assert_eq!(p.position.end(), source.len());
        assert_eq!(p.block_end_position, Position::at(source.len()));
    }
}

//! Abstract syntax tree for Liquid + HTML documents.
//!
//! Open/close pairs of the concrete tree are merged into container nodes.
//! Every node carries a [`Position`] whose slice of the source is exactly
//! the node's text.

use serde::Serialize;
use std::sync::Arc;

use crate::position::Position;

pub mod builder;
pub mod names;
pub mod translate;
pub mod visit;

pub use builder::{build_ast, BuildContext, MAX_NESTING_DEPTH};
pub use names::get_name;

// ============================================================================
// DOCUMENT AND NODES
// ============================================================================

/// Root of a parse: the top-level nodes plus the text they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub children: Vec<AstNode>,
    pub source: Arc<str>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AstNode {
    TextNode(TextNode),
    YamlFrontmatter(YamlFrontmatter),
    HtmlDoctype(HtmlDoctype),
    HtmlComment(HtmlComment),
    HtmlElement(HtmlElement),
    HtmlRawNode(HtmlRawNode),
    HtmlVoidElement(HtmlVoidElement),
    HtmlSelfClosingElement(HtmlSelfClosingElement),
    HtmlDanglingMarkerClose(HtmlDanglingMarkerClose),
    AttrDoubleQuoted(Attribute),
    AttrSingleQuoted(Attribute),
    AttrUnquoted(Attribute),
    AttrEmpty(AttrEmpty),
    LiquidVariableOutput(LiquidVariableOutput),
    LiquidTag(LiquidTag),
    LiquidRawTag(LiquidRawTag),
    LiquidDocParam(LiquidDocParam),
    LiquidDocExample(LiquidDocBlock),
    LiquidDocDescription(LiquidDocBlock),
}

impl AstNode {
    pub fn position(&self) -> Position {
        match self {
            AstNode::TextNode(n) => n.position,
            AstNode::YamlFrontmatter(n) => n.position,
            AstNode::HtmlDoctype(n) => n.position,
            AstNode::HtmlComment(n) => n.position,
            AstNode::HtmlElement(n) => n.position,
            AstNode::HtmlRawNode(n) => n.position,
            AstNode::HtmlVoidElement(n) => n.position,
            AstNode::HtmlSelfClosingElement(n) => n.position,
            AstNode::HtmlDanglingMarkerClose(n) => n.position,
            AstNode::AttrDoubleQuoted(n) | AstNode::AttrSingleQuoted(n) | AstNode::AttrUnquoted(n) => {
                n.position
            }
            AstNode::AttrEmpty(n) => n.position,
            AstNode::LiquidVariableOutput(n) => n.position,
            AstNode::LiquidTag(n) => n.position,
            AstNode::LiquidRawTag(n) => n.position,
            AstNode::LiquidDocParam(n) => n.position,
            AstNode::LiquidDocExample(n) | AstNode::LiquidDocDescription(n) => n.position,
        }
    }

    /// Variant name, as used in diagnostics and serialized output.
    pub fn kind(&self) -> &'static str {
        match self {
            AstNode::TextNode(_) => "TextNode",
            AstNode::YamlFrontmatter(_) => "YamlFrontmatter",
            AstNode::HtmlDoctype(_) => "HtmlDoctype",
            AstNode::HtmlComment(_) => "HtmlComment",
            AstNode::HtmlElement(_) => "HtmlElement",
            AstNode::HtmlRawNode(_) => "HtmlRawNode",
            AstNode::HtmlVoidElement(_) => "HtmlVoidElement",
            AstNode::HtmlSelfClosingElement(_) => "HtmlSelfClosingElement",
            AstNode::HtmlDanglingMarkerClose(_) => "HtmlDanglingMarkerClose",
            AstNode::AttrDoubleQuoted(_) => "AttrDoubleQuoted",
            AstNode::AttrSingleQuoted(_) => "AttrSingleQuoted",
            AstNode::AttrUnquoted(_) => "AttrUnquoted",
            AstNode::AttrEmpty(_) => "AttrEmpty",
            AstNode::LiquidVariableOutput(_) => "LiquidVariableOutput",
            AstNode::LiquidTag(_) => "LiquidTag",
            AstNode::LiquidRawTag(_) => "LiquidRawTag",
            AstNode::LiquidDocParam(_) => "LiquidDocParam",
            AstNode::LiquidDocExample(_) => "LiquidDocExample",
            AstNode::LiquidDocDescription(_) => "LiquidDocDescription",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextNode {
    pub value: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlFrontmatter {
    pub body: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlDoctype {
    pub legacy_doctype_string: Option<String>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlComment {
    pub body: String,
    pub position: Position,
}

// ============================================================================
// HTML
// ============================================================================

/// An element with an opening and (possibly implicit) closing tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlElement {
    /// Text and `{{ }}` fragments; see [`get_name`].
    pub name: Vec<AstNode>,
    pub attributes: Vec<AstNode>,
    pub children: Vec<AstNode>,
    pub position: Position,
    pub block_start_position: Position,
    /// The closing tag, or a zero-width position where it was implied.
    pub block_end_position: Position,
}

/// `<script>`, `<style>` and `<svg>`: bodies kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlRawNode {
    /// A single text fragment; raw element names never hold Liquid.
    pub name: Vec<AstNode>,
    pub attributes: Vec<AstNode>,
    pub body: RawMarkup,
    pub position: Position,
    pub block_start_position: Position,
    pub block_end_position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlVoidElement {
    pub name: Vec<AstNode>,
    pub attributes: Vec<AstNode>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlSelfClosingElement {
    pub name: Vec<AstNode>,
    pub attributes: Vec<AstNode>,
    pub position: Position,
}

/// A closing tag tolerated without its opening tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlDanglingMarkerClose {
    pub name: Vec<AstNode>,
    pub position: Position,
    pub block_start_position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: Vec<AstNode>,
    pub value: Vec<AstNode>,
    /// Span of the value, between the quotes when quoted.
    pub attribute_position: Position,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttrEmpty {
    pub name: Vec<AstNode>,
    pub position: Position,
}

/// Verbatim body of a raw element or raw Liquid tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawMarkup {
    pub kind: RawMarkupKind,
    pub value: String,
    /// Liquid found inside the body, or the body as a single text node.
    pub nodes: Vec<AstNode>,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RawMarkupKind {
    Css,
    Javascript,
    Json,
    Text,
}

// ============================================================================
// LIQUID
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidVariableOutput {
    pub markup: OutputMarkup,
    pub whitespace_start: bool,
    pub whitespace_end: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputMarkup {
    Variable(LiquidVariable),
    /// Markup that did not parse, or nothing at all.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidTag {
    pub name: String,
    pub markup: TagMarkup,
    pub body: LiquidTagBody,
    pub whitespace_start: bool,
    pub whitespace_end: bool,
    /// Whitespace control of the closing tag.
    pub delimiter_whitespace_start: bool,
    pub delimiter_whitespace_end: bool,
    pub position: Position,
    pub block_start_position: Position,
    /// `None` for tags without a closing tag.
    pub block_end_position: Option<Position>,
}

impl LiquidTag {
    /// Branches of `if`, `unless`, `case`, `for` and `tablerow`.
    pub fn branches(&self) -> Option<&Branches> {
        match &self.body {
            LiquidTagBody::Branched(branches) => Some(branches),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "children")]
pub enum LiquidTagBody {
    Leaf,
    Block(Vec<AstNode>),
    Branched(Branches),
}

/// At least one branch: the unnamed default branch, then the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branches {
    pub default: LiquidBranch,
    pub alternates: Vec<LiquidBranch>,
}

impl Branches {
    pub fn iter(&self) -> impl Iterator<Item = &LiquidBranch> {
        std::iter::once(&self.default).chain(self.alternates.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.alternates.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// One arm of a branching tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidBranch {
    /// `None` for the implicit default branch, otherwise `elsif`, `else` or `when`.
    pub name: Option<String>,
    pub markup: TagMarkup,
    pub children: Vec<AstNode>,
    pub whitespace_start: bool,
    pub whitespace_end: bool,
    pub position: Position,
    pub block_start_position: Position,
    pub block_end_position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidRawTag {
    pub name: String,
    pub markup: String,
    pub body: RawMarkup,
    pub whitespace_start: bool,
    pub whitespace_end: bool,
    pub delimiter_whitespace_start: bool,
    pub delimiter_whitespace_end: bool,
    pub position: Position,
    pub block_start_position: Position,
    pub block_end_position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidDocParam {
    pub name: String,
    pub param_type: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub position: Position,
}

/// `@example` and `@description` blocks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidDocBlock {
    pub content: String,
    pub position: Position,
}

// ============================================================================
// MARKUP
// ============================================================================

/// Parsed markup of a tag or branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum TagMarkup {
    /// Unregistered tags, and registered tags whose markup did not parse.
    Base(String),
    Assign(AssignMarkup),
    /// `capture`, `increment`, `decrement`.
    VariableName(String),
    Case(LiquidExpression),
    When(Vec<LiquidExpression>),
    Condition(LiquidConditionalExpression),
    For(ForMarkup),
    Cycle(CycleMarkup),
    Render(RenderMarkup),
    Paginate(PaginateMarkup),
    ContentFor(ContentForMarkup),
    Form(Vec<LiquidArgument>),
    Layout(LiquidExpression),
    Section(LiquidExpression),
    Echo(LiquidVariable),
    Liquid(Vec<AstNode>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignMarkup {
    pub name: String,
    pub value: LiquidVariable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForMarkup {
    pub variable_name: String,
    pub collection: LiquidExpression,
    pub reversed: bool,
    pub args: Vec<NamedArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleMarkup {
    pub group: Option<LiquidExpression>,
    pub args: Vec<LiquidExpression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderMarkup {
    pub snippet: LiquidExpression,
    pub variable: Option<RenderVariableExpression>,
    pub alias: Option<RenderAlias>,
    pub args: Vec<NamedArgument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    With,
    For,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderVariableExpression {
    pub kind: RenderKind,
    pub name: LiquidExpression,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderAlias {
    pub name: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginateMarkup {
    pub collection: LiquidExpression,
    pub page_size: LiquidExpression,
    pub args: Vec<NamedArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentForMarkup {
    pub content_type: LiquidExpression,
    pub args: Vec<NamedArgument>,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidVariable {
    pub expression: LiquidExpression,
    pub filters: Vec<LiquidFilter>,
    /// Markup text without surrounding whitespace.
    pub raw_source: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiquidFilter {
    pub name: String,
    pub args: Vec<LiquidArgument>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LiquidArgument {
    Named(NamedArgument),
    Positional(LiquidExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedArgument {
    pub name: String,
    pub value: LiquidExpression,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum LiquidExpression {
    String {
        value: String,
        single_quoted: bool,
        position: Position,
    },
    Number {
        value: String,
        position: Position,
    },
    Literal {
        keyword: String,
        value: LiteralValue,
        position: Position,
    },
    Range {
        start: Box<LiquidExpression>,
        end: Box<LiquidExpression>,
        position: Position,
    },
    VariableLookup {
        /// `None` for lookups that start with a bracket, as in `['key']`.
        name: Option<String>,
        lookups: Vec<LiquidExpression>,
        position: Position,
    },
}

impl LiquidExpression {
    pub fn position(&self) -> Position {
        match self {
            LiquidExpression::String { position, .. }
            | LiquidExpression::Number { position, .. }
            | LiquidExpression::Literal { position, .. }
            | LiquidExpression::Range { position, .. }
            | LiquidExpression::VariableLookup { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralValue {
    True,
    False,
    Nil,
    Empty,
    Blank,
}

/// Conditions of `if`, `unless` and `elsif`, folded right-associatively.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum LiquidConditionalExpression {
    Logical {
        relation: LogicalRelation,
        left: Box<LiquidConditionalExpression>,
        right: Box<LiquidConditionalExpression>,
        position: Position,
    },
    Comparison {
        comparator: Comparator,
        left: LiquidExpression,
        right: LiquidExpression,
        position: Position,
    },
    Expression {
        expression: LiquidExpression,
        position: Position,
    },
}

impl LiquidConditionalExpression {
    pub fn position(&self) -> Position {
        match self {
            LiquidConditionalExpression::Logical { position, .. }
            | LiquidConditionalExpression::Comparison { position, .. }
            | LiquidConditionalExpression::Expression { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalRelation {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparator {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "contains")]
    Contains,
}

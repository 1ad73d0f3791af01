//! Concrete syntax tree.
//!
//! A flat sequence: opening tags, closing tags and their contents are
//! siblings. The only nesting lives in naturally recursive fields such as
//! tag names, attribute values and raw bodies.

use serde::Serialize;

use crate::position::Position;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ConcreteNode {
    TextNode(ConcreteText),
    YamlFrontmatter {
        body: String,
        position: Position,
    },
    HtmlDoctype {
        legacy_doctype_string: Option<String>,
        position: Position,
    },
    HtmlComment {
        body: String,
        position: Position,
    },
    HtmlRawTag(ConcreteHtmlRawTag),
    HtmlVoidElement {
        name: Vec<ConcreteNode>,
        attr_list: Vec<ConcreteNode>,
        position: Position,
    },
    HtmlSelfClosingElement {
        name: Vec<ConcreteNode>,
        attr_list: Vec<ConcreteNode>,
        position: Position,
    },
    HtmlTagOpen {
        name: Vec<ConcreteNode>,
        attr_list: Vec<ConcreteNode>,
        position: Position,
    },
    HtmlTagClose {
        name: Vec<ConcreteNode>,
        position: Position,
    },
    AttrDoubleQuoted(ConcreteAttribute),
    AttrSingleQuoted(ConcreteAttribute),
    AttrUnquoted(ConcreteAttribute),
    AttrEmpty {
        name: Vec<ConcreteNode>,
        position: Position,
    },
    LiquidDrop(ConcreteDrop),
    LiquidTagOpen(ConcreteTag),
    LiquidTag(ConcreteTag),
    LiquidTagClose(ConcreteTagClose),
    LiquidRawTag(ConcreteRawTag),
    LiquidDocParam(ConcreteDocParam),
    LiquidDocExample {
        content: String,
        position: Position,
    },
    LiquidDocDescription {
        content: String,
        position: Position,
    },
}

impl ConcreteNode {
    pub fn position(&self) -> Position {
        match self {
            ConcreteNode::TextNode(text) => text.position,
            ConcreteNode::HtmlRawTag(raw) => raw.position,
            ConcreteNode::AttrDoubleQuoted(attr)
            | ConcreteNode::AttrSingleQuoted(attr)
            | ConcreteNode::AttrUnquoted(attr) => attr.position,
            ConcreteNode::LiquidDrop(drop) => drop.position,
            ConcreteNode::LiquidTagOpen(tag) | ConcreteNode::LiquidTag(tag) => tag.position,
            ConcreteNode::LiquidTagClose(close) => close.position,
            ConcreteNode::LiquidRawTag(raw) => raw.position,
            ConcreteNode::LiquidDocParam(param) => param.position,
            ConcreteNode::YamlFrontmatter { position, .. }
            | ConcreteNode::HtmlDoctype { position, .. }
            | ConcreteNode::HtmlComment { position, .. }
            | ConcreteNode::HtmlVoidElement { position, .. }
            | ConcreteNode::HtmlSelfClosingElement { position, .. }
            | ConcreteNode::HtmlTagOpen { position, .. }
            | ConcreteNode::HtmlTagClose { position, .. }
            | ConcreteNode::AttrEmpty { position, .. }
            | ConcreteNode::LiquidDocExample { position, .. }
            | ConcreteNode::LiquidDocDescription { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteText {
    pub value: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteAttribute {
    pub name: Vec<ConcreteNode>,
    pub value: Vec<ConcreteNode>,
    /// Span between the quotes (or of the whole unquoted value).
    pub value_position: Position,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteHtmlRawTag {
    pub name: Vec<ConcreteNode>,
    pub attr_list: Vec<ConcreteNode>,
    pub body: String,
    pub body_position: Position,
    pub body_nodes: Vec<ConcreteNode>,
    pub block_start_position: Position,
    pub block_end_position: Position,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteDrop {
    pub markup: ConcreteDropMarkup,
    pub whitespace_start: bool,
    pub whitespace_end: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum ConcreteDropMarkup {
    Variable(ConcreteVariable),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteTag {
    pub name: String,
    pub markup: ConcreteMarkup,
    pub markup_position: Position,
    pub whitespace_start: bool,
    pub whitespace_end: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteTagClose {
    pub name: String,
    pub whitespace_start: bool,
    pub whitespace_end: bool,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteRawTag {
    pub name: String,
    pub markup: String,
    pub body: String,
    pub body_position: Position,
    pub body_nodes: Vec<ConcreteNode>,
    pub whitespace_start: bool,
    pub whitespace_end: bool,
    pub delimiter_whitespace_start: bool,
    pub delimiter_whitespace_end: bool,
    pub block_start_position: Position,
    pub block_end_position: Position,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteDocParam {
    pub name: String,
    pub param_type: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub position: Position,
}

// ============================================================================
// EXPRESSIONS AND MARKUP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ConcreteExpression {
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
        position: Position,
    },
    Range {
        start: Box<ConcreteExpression>,
        end: Box<ConcreteExpression>,
        position: Position,
    },
    VariableLookup {
        name: Option<String>,
        lookups: Vec<ConcreteExpression>,
        position: Position,
    },
}

impl ConcreteExpression {
    pub fn position(&self) -> Position {
        match self {
            ConcreteExpression::String { position, .. }
            | ConcreteExpression::Number { position, .. }
            | ConcreteExpression::Literal { position, .. }
            | ConcreteExpression::Range { position, .. }
            | ConcreteExpression::VariableLookup { position, .. } => *position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteVariable {
    pub expression: ConcreteExpression,
    pub filters: Vec<ConcreteFilter>,
    pub raw_source: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteFilter {
    pub name: String,
    pub args: Vec<ConcreteArgument>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum ConcreteArgument {
    Positional(ConcreteExpression),
    Named(ConcreteNamedArgument),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteNamedArgument {
    pub name: String,
    pub value: ConcreteExpression,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    And,
    Or,
}

/// One `(relation, expression)` element of a flat condition list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteCondition {
    pub relation: Option<Relation>,
    pub item: ConcreteConditionItem,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum ConcreteConditionItem {
    Comparison {
        comparator: String,
        left: ConcreteExpression,
        right: ConcreteExpression,
        position: Position,
    },
    Expression(ConcreteExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteForMarkup {
    pub variable_name: String,
    pub collection: ConcreteExpression,
    pub reversed: bool,
    pub args: Vec<ConcreteNamedArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcreteRenderMarkup {
    pub snippet: ConcreteExpression,
    /// `with` or `for`, and the expression after it.
    pub variable: Option<(String, ConcreteExpression, Position)>,
    pub alias: Option<(String, Position)>,
    pub args: Vec<ConcreteNamedArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum ConcreteMarkup {
    /// Unregistered tags, and tolerant fallback for registered ones.
    Base(String),
    Assign {
        name: String,
        value: ConcreteVariable,
    },
    VariableName(String),
    Case(ConcreteExpression),
    When(Vec<ConcreteExpression>),
    Condition(Vec<ConcreteCondition>),
    For(ConcreteForMarkup),
    Cycle {
        group: Option<ConcreteExpression>,
        args: Vec<ConcreteExpression>,
    },
    Render(ConcreteRenderMarkup),
    Paginate {
        collection: ConcreteExpression,
        page_size: ConcreteExpression,
        args: Vec<ConcreteNamedArgument>,
    },
    ContentFor {
        content_type: ConcreteExpression,
        args: Vec<ConcreteNamedArgument>,
    },
    Form(Vec<ConcreteArgument>),
    Layout(ConcreteExpression),
    Section(ConcreteExpression),
    Echo(ConcreteVariable),
    Liquid(Vec<ConcreteNode>),
}

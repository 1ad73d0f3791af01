//! Concrete-to-abstract conversions for leaves, expressions and markup.
//!
//! Nothing here touches the builder's stack. The one recursive case,
//! `{% liquid %}` statements, is handed back to the caller through a closure.

use super::*;
use crate::syntax::cst::{
    ConcreteArgument, ConcreteCondition, ConcreteConditionItem, ConcreteDrop, ConcreteDropMarkup,
    ConcreteExpression, ConcreteFilter, ConcreteMarkup, ConcreteNamedArgument, ConcreteNode,
    ConcreteRenderMarkup, ConcreteText, ConcreteVariable, Relation,
};

// ============================================================================
// LEAVES
// ============================================================================

pub fn text(text: ConcreteText) -> AstNode {
    AstNode::TextNode(TextNode {
        value: text.value,
        position: text.position,
    })
}

pub fn output(drop: ConcreteDrop) -> AstNode {
    let markup = match drop.markup {
        ConcreteDropMarkup::Variable(v) => OutputMarkup::Variable(variable(v)),
        ConcreteDropMarkup::Raw(raw) => OutputMarkup::Raw(raw),
    };
    AstNode::LiquidVariableOutput(LiquidVariableOutput {
        markup,
        whitespace_start: drop.whitespace_start,
        whitespace_end: drop.whitespace_end,
        position: drop.position,
    })
}

pub fn raw_tag_kind(name: &str) -> RawMarkupKind {
    match name {
        "javascript" => RawMarkupKind::Javascript,
        "schema" => RawMarkupKind::Json,
        "style" | "stylesheet" => RawMarkupKind::Css,
        _ => RawMarkupKind::Text,
    }
}

/// Body kind of a raw element, looking at `<script type="...">`.
pub fn raw_element_kind(name: &str, script_type: Option<&str>) -> RawMarkupKind {
    match name.to_ascii_lowercase().as_str() {
        "style" => RawMarkupKind::Css,
        "script" => match script_type.map(str::trim) {
            None | Some("") | Some("module") => RawMarkupKind::Javascript,
            Some(t) if t.contains("json") => RawMarkupKind::Json,
            Some(t) if t.contains("javascript") || t.contains("ecmascript") => {
                RawMarkupKind::Javascript
            }
            Some(_) => RawMarkupKind::Text,
        },
        _ => RawMarkupKind::Text,
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

pub fn expression(expression: ConcreteExpression) -> LiquidExpression {
    match expression {
        ConcreteExpression::String {
            value,
            single_quoted,
            position,
        } => LiquidExpression::String {
            value,
            single_quoted,
            position,
        },
        ConcreteExpression::Number { value, position } => {
            LiquidExpression::Number { value, position }
        }
        ConcreteExpression::Literal { keyword, position } => LiquidExpression::Literal {
            value: literal_value(&keyword),
            keyword,
            position,
        },
        ConcreteExpression::Range {
            start,
            end,
            position,
        } => LiquidExpression::Range {
            start: Box::new(self::expression(*start)),
            end: Box::new(self::expression(*end)),
            position,
        },
        ConcreteExpression::VariableLookup {
            name,
            lookups,
            position,
        } => LiquidExpression::VariableLookup {
            name,
            lookups: lookups.into_iter().map(self::expression).collect(),
            position,
        },
    }
}

fn literal_value(keyword: &str) -> LiteralValue {
    match keyword {
        "true" => LiteralValue::True,
        "false" => LiteralValue::False,
        "empty" => LiteralValue::Empty,
        "blank" => LiteralValue::Blank,
        // nil and null
        _ => LiteralValue::Nil,
    }
}

pub fn variable(variable: ConcreteVariable) -> LiquidVariable {
    LiquidVariable {
        expression: expression(variable.expression),
        filters: variable.filters.into_iter().map(filter).collect(),
        raw_source: variable.raw_source,
        position: variable.position,
    }
}

fn filter(filter: ConcreteFilter) -> LiquidFilter {
    LiquidFilter {
        name: filter.name,
        args: filter.args.into_iter().map(argument).collect(),
        position: filter.position,
    }
}

fn argument(argument: ConcreteArgument) -> LiquidArgument {
    match argument {
        ConcreteArgument::Positional(expr) => LiquidArgument::Positional(expression(expr)),
        ConcreteArgument::Named(named) => LiquidArgument::Named(named_argument(named)),
    }
}

fn named_argument(argument: ConcreteNamedArgument) -> NamedArgument {
    NamedArgument {
        name: argument.name,
        value: expression(argument.value),
        position: argument.position,
    }
}

fn named_arguments(args: Vec<ConcreteNamedArgument>) -> Vec<NamedArgument> {
    args.into_iter().map(named_argument).collect()
}

fn comparator(text: &str) -> Comparator {
    match text {
        "==" => Comparator::Eq,
        "!=" | "<>" => Comparator::Ne,
        ">" => Comparator::Gt,
        ">=" => Comparator::Ge,
        "<" => Comparator::Lt,
        "<=" => Comparator::Le,
        _ => Comparator::Contains,
    }
}

fn condition_item(item: ConcreteConditionItem) -> LiquidConditionalExpression {
    match item {
        ConcreteConditionItem::Comparison {
            comparator: op,
            left,
            right,
            position,
        } => LiquidConditionalExpression::Comparison {
            comparator: comparator(&op),
            left: expression(left),
            right: expression(right),
            position,
        },
        ConcreteConditionItem::Expression(expr) => {
            let expression = expression(expr);
            LiquidConditionalExpression::Expression {
                position: expression.position(),
                expression,
            }
        }
    }
}

/// Folds `a and b or c` into `a and (b or c)`.
///
/// Each element after the first joins the chain with its own relation, and
/// the chain grows to the right. Returns `None` for an empty list.
pub fn conditions(items: Vec<ConcreteCondition>) -> Option<LiquidConditionalExpression> {
    let mut items = items.into_iter().rev();
    let last = items.next()?;
    let mut relation = last.relation;
    let mut result = condition_item(last.item);
    for item in items {
        let left = condition_item(item.item);
        let position = Position::new(left.position().start(), result.position().end());
        result = LiquidConditionalExpression::Logical {
            relation: match relation {
                Some(Relation::Or) => LogicalRelation::Or,
                _ => LogicalRelation::And,
            },
            left: Box::new(left),
            right: Box::new(result),
            position,
        };
        relation = item.relation;
    }
    Some(result)
}

// ============================================================================
// MARKUP
// ============================================================================

fn render(markup: ConcreteRenderMarkup) -> RenderMarkup {
    RenderMarkup {
        snippet: expression(markup.snippet),
        variable: markup
            .variable
            .map(|(kind, name, position)| RenderVariableExpression {
                kind: if kind == "with" {
                    RenderKind::With
                } else {
                    RenderKind::For
                },
                name: expression(name),
                position,
            }),
        alias: markup
            .alias
            .map(|(name, position)| RenderAlias { name, position }),
        args: named_arguments(markup.args),
    }
}

/// Converts tag markup. `statements` builds the body of a `{% liquid %}` tag.
pub fn markup<E>(
    markup: ConcreteMarkup,
    statements: impl FnOnce(Vec<ConcreteNode>) -> Result<Vec<AstNode>, E>,
) -> Result<TagMarkup, E> {
    let markup = match markup {
        ConcreteMarkup::Base(text) => TagMarkup::Base(text),
        ConcreteMarkup::Assign { name, value } => TagMarkup::Assign(AssignMarkup {
            name,
            value: variable(value),
        }),
        ConcreteMarkup::VariableName(name) => TagMarkup::VariableName(name),
        ConcreteMarkup::Case(expr) => TagMarkup::Case(expression(expr)),
        ConcreteMarkup::When(exprs) => {
            TagMarkup::When(exprs.into_iter().map(expression).collect())
        }
        ConcreteMarkup::Condition(items) => match conditions(items) {
            Some(condition) => TagMarkup::Condition(condition),
            None => TagMarkup::Base(String::new()),
        },
        ConcreteMarkup::For(markup) => TagMarkup::For(ForMarkup {
            variable_name: markup.variable_name,
            collection: expression(markup.collection),
            reversed: markup.reversed,
            args: named_arguments(markup.args),
        }),
        ConcreteMarkup::Cycle { group, args } => TagMarkup::Cycle(CycleMarkup {
            group: group.map(expression),
            args: args.into_iter().map(expression).collect(),
        }),
        ConcreteMarkup::Render(markup) => TagMarkup::Render(render(markup)),
        ConcreteMarkup::Paginate {
            collection,
            page_size,
            args,
        } => TagMarkup::Paginate(PaginateMarkup {
            collection: expression(collection),
            page_size: expression(page_size),
            args: named_arguments(args),
        }),
        ConcreteMarkup::ContentFor { content_type, args } => {
            TagMarkup::ContentFor(ContentForMarkup {
                content_type: expression(content_type),
                args: named_arguments(args),
            })
        }
        ConcreteMarkup::Form(args) => TagMarkup::Form(args.into_iter().map(argument).collect()),
        ConcreteMarkup::Layout(expr) => TagMarkup::Layout(expression(expr)),
        ConcreteMarkup::Section(expr) => TagMarkup::Section(expression(expr)),
        ConcreteMarkup::Echo(v) => TagMarkup::Echo(variable(v)),
        ConcreteMarkup::Liquid(nodes) => TagMarkup::Liquid(statements(nodes)?),
    };
    Ok(markup)
}

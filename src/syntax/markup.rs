//! Tag and drop markup.
//!
//! Registered tags re-parse their markup with a dedicated start rule. What
//! happens when that fails depends on the mode: strict reports it, the
//! other modes keep the markup as trimmed text.

use pest::iterators::{Pair, Pairs};
use tracing::trace;

use super::cst::*;
use super::cst_builder::{CstBuilder, CstResult, Entry};
use super::grammar::{match_rule, GrammarError, Rule};
use super::named_tags::{NamedTag, TagKind};
use crate::config::{ParseMode, PLACEHOLDER};
use crate::position::Position;

/// Why a piece of markup did not produce a structured value.
enum MarkupFailure {
    Grammar(Box<GrammarError>),
    /// Completion placeholder outside completion mode.
    Placeholder(Position),
}

/// Children of a markup start rule, minus the trailing `EOI`.
fn children<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| p.as_rule() != Rule::EOI)
}

fn is_name_rule(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::identifier
            | Rule::variable_name
            | Rule::lookup_name
            | Rule::filter_name
            | Rule::argument_name
    )
}

impl CstBuilder<'_> {
    /// Structured markup for tag `name`, or `Base` for unregistered tags.
    pub(super) fn tag_markup(
        &self,
        name: &str,
        text: &str,
        position: Position,
    ) -> CstResult<ConcreteMarkup> {
        let named = match TagKind::classify(name) {
            TagKind::Named(named) => named,
            TagKind::Unregistered => return Ok(ConcreteMarkup::Base(text.to_string())),
        };
        let Some(rule) = named.start_rule() else {
            return self.liquid_statements(text, position);
        };

        let sub = self.at(position.start());
        match sub.parse_markup(rule, text) {
            Ok(mut pairs) => {
                let pair = sub.expect(pairs.next(), "markup", position)?;
                sub.named_markup(named, pair)
            }
            Err(failure) => {
                trace!(tag = name, "markup did not match its grammar");
                self.fall_back(failure, text)
                    .map(|raw| ConcreteMarkup::Base(raw.to_string()))
            }
        }
    }

    /// Markup of a `{{ }}` drop.
    pub(super) fn drop_markup(&self, text: &str, position: Position) -> CstResult<ConcreteDropMarkup> {
        let sub = self.at(position.start());
        match sub.parse_markup(Rule::markup_variable, text) {
            Ok(mut pairs) => {
                let markup = sub.expect(pairs.next(), "markup", position)?;
                let variable = sub.expect(children(markup).next(), "variable", position)?;
                Ok(ConcreteDropMarkup::Variable(sub.variable(variable)?))
            }
            Err(failure) => self
                .fall_back(failure, text)
                .map(|raw| ConcreteDropMarkup::Raw(raw.to_string())),
        }
    }

    fn liquid_statements(&self, text: &str, position: Position) -> CstResult<ConcreteMarkup> {
        match self.at(position.start()).build(text, Entry::LiquidStatements) {
            Ok(nodes) => Ok(ConcreteMarkup::Liquid(nodes)),
            Err(error) if self.mode() == ParseMode::Strict => Err(error),
            Err(_) => Ok(ConcreteMarkup::Base(text.trim().to_string())),
        }
    }

    fn parse_markup<'i>(&self, rule: Rule, text: &'i str) -> Result<Pairs<'i, Rule>, MarkupFailure> {
        let pairs = match_rule(rule, text).map_err(MarkupFailure::Grammar)?;
        if self.mode() != ParseMode::Completion {
            let placeholder = pairs
                .clone()
                .flatten()
                .find(|p| is_name_rule(p.as_rule()) && p.as_str().contains(PLACEHOLDER));
            if let Some(name) = placeholder {
                return Err(MarkupFailure::Placeholder(self.position(&name)));
            }
        }
        Ok(pairs)
    }

    /// Raw text to keep in place of failed markup, or the strict-mode error.
    fn fall_back<'t>(&self, failure: MarkupFailure, text: &'t str) -> CstResult<&'t str> {
        if self.mode() != ParseMode::Strict {
            return Ok(text.trim());
        }
        Err(match failure {
            MarkupFailure::Grammar(error) => self.syntax_error(&error),
            MarkupFailure::Placeholder(position) => self.error_at(
                format!("SyntaxError: unexpected completion placeholder '{PLACEHOLDER}'"),
                position,
            ),
        })
    }

    // ========================================================================
    // NAMED TAGS
    // ========================================================================

    fn named_markup(&self, named: NamedTag, pair: Pair<'_, Rule>) -> CstResult<ConcreteMarkup> {
        let position = self.position(&pair);
        let mut inner = children(pair);
        let markup = match named {
            NamedTag::Assign => {
                let name = self.expect(inner.next(), "variable name", position)?;
                let value = self.expect(inner.next(), "assigned value", position)?;
                ConcreteMarkup::Assign {
                    name: name.as_str().to_string(),
                    value: self.variable(value)?,
                }
            }
            NamedTag::Capture | NamedTag::Decrement | NamedTag::Increment => {
                let name = self.expect(inner.next(), "variable name", position)?;
                let name = match name.as_rule() {
                    Rule::string => name
                        .into_inner()
                        .next()
                        .map(|body| body.as_str().to_string())
                        .unwrap_or_default(),
                    _ => name.as_str().to_string(),
                };
                ConcreteMarkup::VariableName(name)
            }
            NamedTag::Case => {
                ConcreteMarkup::Case(self.expression(self.expect(inner.next(), "expression", position)?)?)
            }
            NamedTag::Layout => {
                ConcreteMarkup::Layout(self.expression(self.expect(inner.next(), "layout", position)?)?)
            }
            NamedTag::Section | NamedTag::Sections => ConcreteMarkup::Section(
                self.expression(self.expect(inner.next(), "section name", position)?)?,
            ),
            NamedTag::Echo => {
                ConcreteMarkup::Echo(self.variable(self.expect(inner.next(), "variable", position)?)?)
            }
            NamedTag::When => ConcreteMarkup::When(
                inner
                    .filter(|p| p.as_rule() != Rule::logical_operator)
                    .map(|p| self.expression(p))
                    .collect::<CstResult<_>>()?,
            ),
            NamedTag::If | NamedTag::Unless | NamedTag::Elsif => {
                ConcreteMarkup::Condition(self.conditions(inner)?)
            }
            NamedTag::For | NamedTag::Tablerow => ConcreteMarkup::For(self.for_markup(inner, position)?),
            NamedTag::Cycle => {
                let mut group = None;
                let mut args = Vec::new();
                for item in inner {
                    match item.as_rule() {
                        Rule::cycle_group => {
                            let expr = self.expect(item.into_inner().next(), "cycle group", position)?;
                            group = Some(self.expression(expr)?);
                        }
                        _ => args.push(self.expression(item)?),
                    }
                }
                ConcreteMarkup::Cycle { group, args }
            }
            NamedTag::Include | NamedTag::Render => {
                ConcreteMarkup::Render(self.render_markup(inner, position)?)
            }
            NamedTag::Paginate => {
                let mut expressions = Vec::new();
                let mut args = Vec::new();
                for item in inner {
                    match item.as_rule() {
                        Rule::kw_by => {}
                        Rule::named_argument => args.push(self.named_argument(item)?),
                        _ => expressions.push(self.expression(item)?),
                    }
                }
                let mut expressions = expressions.into_iter();
                let collection = expressions.next();
                let page_size = expressions.next();
                match (collection, page_size) {
                    (Some(collection), Some(page_size)) => ConcreteMarkup::Paginate {
                        collection,
                        page_size,
                        args,
                    },
                    _ => return Err(self.error_at("Missing paginate operands", position)),
                }
            }
            NamedTag::ContentFor => {
                let content_type =
                    self.expression(self.expect(inner.next(), "content type", position)?)?;
                ConcreteMarkup::ContentFor {
                    content_type,
                    args: inner.map(|p| self.named_argument(p)).collect::<CstResult<_>>()?,
                }
            }
            NamedTag::Form => ConcreteMarkup::Form(
                inner.map(|p| self.argument(p)).collect::<CstResult<_>>()?,
            ),
            NamedTag::Liquid => return Err(self.error_at("Unexpected liquid markup", position)),
        };
        Ok(markup)
    }

    fn conditions<'i>(
        &self,
        items: impl Iterator<Item = Pair<'i, Rule>>,
    ) -> CstResult<Vec<ConcreteCondition>> {
        let mut relation = None;
        let mut conditions = Vec::new();
        for item in items {
            match item.as_rule() {
                Rule::logical_operator => {
                    relation = Some(if item.as_str() == "and" {
                        Relation::And
                    } else {
                        Relation::Or
                    });
                }
                Rule::condition => {
                    let position = self.position(&item);
                    conditions.push(ConcreteCondition {
                        relation: relation.take(),
                        item: self.condition_item(item)?,
                        position,
                    });
                }
                _ => return Err(self.unexpected(&item)),
            }
        }
        Ok(conditions)
    }

    fn condition_item(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteConditionItem> {
        let position = self.position(&pair);
        let inner = self.expect(pair.into_inner().next(), "condition", position)?;
        if inner.as_rule() != Rule::comparison {
            return Ok(ConcreteConditionItem::Expression(self.expression(inner)?));
        }
        let position = self.position(&inner);
        let mut parts = inner.into_inner();
        let left = self.expect(parts.next(), "left operand", position)?;
        let comparator = self.expect(parts.next(), "comparator", position)?;
        let right = self.expect(parts.next(), "right operand", position)?;
        Ok(ConcreteConditionItem::Comparison {
            comparator: comparator.as_str().to_string(),
            left: self.expression(left)?,
            right: self.expression(right)?,
            position,
        })
    }

    fn for_markup<'i>(
        &self,
        items: impl Iterator<Item = Pair<'i, Rule>>,
        position: Position,
    ) -> CstResult<ConcreteForMarkup> {
        let mut variable_name = None;
        let mut collection = None;
        let mut reversed = false;
        let mut args = Vec::new();
        for item in items {
            match item.as_rule() {
                Rule::variable_name => variable_name = Some(item.as_str().to_string()),
                Rule::kw_in => {}
                Rule::reversed => reversed = true,
                Rule::named_argument => args.push(self.named_argument(item)?),
                _ => collection = Some(self.expression(item)?),
            }
        }
        match (variable_name, collection) {
            (Some(variable_name), Some(collection)) => Ok(ConcreteForMarkup {
                variable_name,
                collection,
                reversed,
                args,
            }),
            _ => Err(self.error_at("Missing loop variable or collection", position)),
        }
    }

    fn render_markup<'i>(
        &self,
        items: impl Iterator<Item = Pair<'i, Rule>>,
        position: Position,
    ) -> CstResult<ConcreteRenderMarkup> {
        let mut snippet = None;
        let mut variable = None;
        let mut alias = None;
        let mut args = Vec::new();
        for item in items {
            let item_position = self.position(&item);
            match item.as_rule() {
                Rule::render_snippet => {
                    let expr = self.expect(item.into_inner().next(), "snippet", item_position)?;
                    snippet = Some(self.expression(expr)?);
                }
                Rule::render_variable => {
                    let mut parts = item.into_inner();
                    let kind = self.expect(parts.next(), "with or for", item_position)?;
                    let expr = self.expect(parts.next(), "expression", item_position)?;
                    variable = Some((kind.as_str().to_string(), self.expression(expr)?, item_position));
                }
                Rule::render_alias => {
                    let name = item
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::variable_name);
                    let name = self.expect(name, "alias", item_position)?;
                    alias = Some((name.as_str().to_string(), self.position(&name)));
                }
                Rule::named_argument => args.push(self.named_argument(item)?),
                _ => return Err(self.unexpected(&item)),
            }
        }
        let snippet = snippet.ok_or_else(|| self.error_at("Missing snippet", position))?;
        Ok(ConcreteRenderMarkup {
            snippet,
            variable,
            alias,
            args,
        })
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    pub(super) fn variable(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteVariable> {
        let position = self.position(&pair);
        let raw_source = pair.as_str().to_string();
        let mut inner = pair.into_inner();
        let expression = self.expression(self.expect(inner.next(), "expression", position)?)?;
        let filters = inner.map(|f| self.filter(f)).collect::<CstResult<_>>()?;
        Ok(ConcreteVariable {
            expression,
            filters,
            raw_source,
            position,
        })
    }

    fn filter(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteFilter> {
        let position = self.position(&pair);
        let mut inner = pair.into_inner();
        let name = self.expect(inner.next(), "filter name", position)?;
        Ok(ConcreteFilter {
            name: name.as_str().to_string(),
            args: inner.map(|a| self.argument(a)).collect::<CstResult<_>>()?,
            position,
        })
    }

    fn argument(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteArgument> {
        match pair.as_rule() {
            Rule::named_argument => Ok(ConcreteArgument::Named(self.named_argument(pair)?)),
            _ => Ok(ConcreteArgument::Positional(self.expression(pair)?)),
        }
    }

    fn named_argument(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteNamedArgument> {
        let position = self.position(&pair);
        if pair.as_rule() != Rule::named_argument {
            return Err(self.unexpected(&pair));
        }
        let mut inner = pair.into_inner();
        let name = self.expect(inner.next(), "argument name", position)?;
        let value = self.expect(inner.next(), "argument value", position)?;
        Ok(ConcreteNamedArgument {
            name: name.as_str().to_string(),
            value: self.expression(value)?,
            position,
        })
    }

    fn expression(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteExpression> {
        let position = self.position(&pair);
        match pair.as_rule() {
            Rule::string => {
                let (value, single_quoted) = match pair.into_inner().next() {
                    Some(body) => (body.as_str().to_string(), body.as_rule() == Rule::single_quoted),
                    None => (String::new(), false),
                };
                Ok(ConcreteExpression::String {
                    value,
                    single_quoted,
                    position,
                })
            }
            Rule::number => Ok(ConcreteExpression::Number {
                value: pair.as_str().to_string(),
                position,
            }),
            Rule::literal => Ok(ConcreteExpression::Literal {
                keyword: pair.as_str().to_string(),
                position,
            }),
            Rule::range => {
                let mut bounds = pair.into_inner();
                let start = self.expect(bounds.next(), "range start", position)?;
                let end = self.expect(bounds.next(), "range end", position)?;
                Ok(ConcreteExpression::Range {
                    start: Box::new(self.expression(start)?),
                    end: Box::new(self.expression(end)?),
                    position,
                })
            }
            Rule::variable_lookup => self.variable_lookup(pair),
            _ => Err(self.unexpected(&pair)),
        }
    }

    fn variable_lookup(&self, pair: Pair<'_, Rule>) -> CstResult<ConcreteExpression> {
        let position = self.position(&pair);
        let mut name = None;
        let mut lookups = Vec::new();
        for (index, inner) in pair.into_inner().enumerate() {
            let inner_position = self.position(&inner);
            match inner.as_rule() {
                Rule::identifier if index == 0 => name = Some(inner.as_str().to_string()),
                Rule::lookup_name => lookups.push(ConcreteExpression::String {
                    value: inner.as_str().to_string(),
                    single_quoted: false,
                    position: inner_position,
                }),
                Rule::bracket_lookup => {
                    let expr = self.expect(inner.into_inner().next(), "lookup", inner_position)?;
                    lookups.push(self.expression(expr)?);
                }
                _ => return Err(self.unexpected(&inner)),
            }
        }
        Ok(ConcreteExpression::VariableLookup {
            name,
            lookups,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceContext;

    fn markup(name: &str, text: &str, mode: ParseMode) -> CstResult<ConcreteMarkup> {
        let ctx = SourceContext::anonymous(text);
        CstBuilder::new(&ctx, 0, mode).tag_markup(name, text, Position::new(0, text.len()))
    }

    #[test]
    fn unregistered_tags_keep_text() {
        let result = markup("schema_thing", "a b c", ParseMode::Strict).unwrap();
        assert_eq!(result, ConcreteMarkup::Base("a b c".into()));
    }

    #[test]
    fn strict_rejects_bad_markup() {
        let error = markup("if", "a ==", ParseMode::Strict).unwrap_err();
        assert!(error.message().starts_with("SyntaxError"));
        let result = markup("if", "a ==", ParseMode::Tolerant).unwrap();
        assert_eq!(result, ConcreteMarkup::Base("a ==".into()));
    }

    #[test]
    fn placeholder_only_in_completion_mode() {
        let text = "prod\u{2588}";
        assert!(matches!(
            markup("echo", text, ParseMode::Completion).unwrap(),
            ConcreteMarkup::Echo(_)
        ));
        assert_eq!(
            markup("echo", text, ParseMode::Tolerant).unwrap(),
            ConcreteMarkup::Base(text.into())
        );
        assert!(markup("echo", text, ParseMode::Strict).is_err());
    }

    #[test]
    fn conditions_stay_flat() {
        let ConcreteMarkup::Condition(conditions) =
            markup("if", "a and b or c == 1", ParseMode::Strict).unwrap()
        else {
            panic!("expected conditions");
        };
        let relations: Vec<_> = conditions.iter().map(|c| c.relation).collect();
        assert_eq!(relations, [None, Some(Relation::And), Some(Relation::Or)]);
        assert!(matches!(
            conditions[2].item,
            ConcreteConditionItem::Comparison { .. }
        ));
    }

    #[test]
    fn for_markup_reads_modifiers() {
        let ConcreteMarkup::For(markup) =
            markup("for", "item in (1..5) reversed limit: 2", ParseMode::Strict).unwrap()
        else {
            panic!("expected for markup");
        };
        assert_eq!(markup.variable_name, "item");
        assert!(markup.reversed);
        assert_eq!(markup.args[0].name, "limit");
        assert!(matches!(markup.collection, ConcreteExpression::Range { .. }));
    }

    #[test]
    fn markup_positions_are_absolute() {
        let source = "{% echo product.title %}";
        let ctx = SourceContext::anonymous(source);
        let ConcreteMarkup::Echo(variable) = CstBuilder::new(&ctx, 0, ParseMode::Strict)
            .tag_markup("echo", "product.title", Position::new(8, 21))
            .unwrap()
        else {
            panic!("expected echo");
        };
        assert_eq!(variable.position.slice(source), "product.title");
    }
}

//! The grammar oracle.
//!
//! Matches text against a start rule and hands back either the parse tree
//! or pest's failure. Everything mode-specific happens in the CST builder.

use pest::iterators::Pairs;
use pest::Parser;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
pub struct LiquidHtmlGrammar;

pub type GrammarError = pest::error::Error<Rule>;

/// Runs `rule` over the whole of `input`.
pub fn match_rule(rule: Rule, input: &str) -> Result<Pairs<'_, Rule>, Box<GrammarError>> {
    LiquidHtmlGrammar::parse(rule, input).map_err(Box::new)
}

/// Byte range pest reported for a failure, relative to the matched input.
pub fn failure_range(error: &GrammarError) -> (usize, usize) {
    match error.location {
        pest::error::InputLocation::Pos(pos) => (pos, pos),
        pest::error::InputLocation::Span((start, end)) => (start, end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(rule: Rule, input: &str) -> bool {
        match_rule(rule, input).is_ok()
    }

    #[test]
    fn document_rules_accept_mixed_markup() {
        assert!(matches(
            Rule::liquid_html_document,
            "<div class=\"a {{ b }}\">{% if x %}hi{% endif %}</div>"
        ));
        assert!(matches(Rule::liquid_document, "var a = {{ x | json }};"));
        assert!(!matches(Rule::liquid_html_document, "{{ unterminated"));
    }

    #[test]
    fn markup_rules_allow_inner_whitespace() {
        assert!(matches(Rule::markup_for, "item in (1..5) reversed limit: 2"));
        assert!(matches(Rule::markup_condition, "a == 1 and b contains 'x' or c"));
        assert!(matches(Rule::markup_render, "'card', product: p"));
        assert!(!matches(Rule::markup_for, "item of items"));
    }

    fn first_span(rule: Rule, input: &str) -> &str {
        let mut pairs = match_rule(rule, input).unwrap();
        pairs.next().unwrap().as_str()
    }

    #[test]
    fn text_runs_stop_before_trailing_blanks() {
        assert_eq!(first_span(Rule::text_node, "a  b \n<p>"), "a  b");
        assert_eq!(first_span(Rule::text_node, "1 < 2  {{ x }}"), "1 < 2");
        assert_eq!(first_span(Rule::liquid_text_node, "var x  {%"), "var x");
        assert_eq!(first_span(Rule::drop_markup, "a | b  -}}"), "a | b");
        assert_eq!(first_span(Rule::drop_markup, "a - }}"), "a -");
        assert_eq!(first_span(Rule::tag_markup, "x  y\t%}"), "x  y");
        assert_eq!(first_span(Rule::statement_markup, "x  y \nz"), "x  y");
        assert_eq!(first_span(Rule::doc_block_content, "\n  code\n  more\n@param"), "\n  code\n  more");
        assert_eq!(first_span(Rule::doctype_value, "html  >"), "html");
    }

    #[test]
    fn long_blank_runs_match_in_linear_time() {
        let blanks = " ".repeat(100_000);
        let started = std::time::Instant::now();
        let text = format!("a{blanks}b{blanks}");
        assert_eq!(first_span(Rule::text_node, &text).len(), 100_002);
        let drop = format!("a{blanks}| upcase{blanks}}}}}");
        assert_eq!(first_span(Rule::drop_markup, &drop), format!("a{blanks}| upcase"));
        let markup = format!("a{blanks}b{blanks}%}}");
        assert_eq!(first_span(Rule::tag_markup, &markup).len(), 100_002);
        assert!(started.elapsed().as_secs() < 5);
    }

    #[test]
    fn raw_tag_needs_matching_end_name() {
        assert!(matches(Rule::liquid_raw_tag, "{% raw %}{{ x }}{% endraw %}"));
        assert!(!matches(Rule::liquid_raw_tag, "{% raw %}{{ x }}{% endcomment %}"));
    }

    #[test]
    fn failure_location_is_reported() {
        let error = match_rule(Rule::markup_string, "'open").err().unwrap();
        let (start, end) = failure_range(&error);
        assert!(start <= end && end <= "'open".len());
    }
}

//! Unclosed and mismatched nodes: what is recovered and what is reported.

use liquid_html_parser::ast::{AstNode, Document, LiquidTag};
use liquid_html_parser::errors::ErrorType;
use liquid_html_parser::position::Position;
use liquid_html_parser::{parse_liquid_html, LiquidHtmlError, ParseOptions};

fn parse(source: &str) -> Document {
    parse_liquid_html(source, &ParseOptions::default())
        .unwrap_or_else(|e| panic!("failed to parse {source:?}: {e}"))
}

fn fail(source: &str) -> LiquidHtmlError {
    match parse_liquid_html(source, &ParseOptions::default()) {
        Ok(document) => panic!("expected {source:?} to fail, got {document:?}"),
        Err(error) => error,
    }
}

fn tag(node: &AstNode) -> &LiquidTag {
    match node {
        AstNode::LiquidTag(tag) => tag,
        other => panic!("expected a LiquidTag, got {}", other.kind()),
    }
}

#[test]
fn conditional_tags_close_elements_left_open() {
    let source = "{% if cond %}<div>{% endif %}";
    let document = parse(source);
    let if_tag = tag(&document.children[0]);
    assert_eq!(if_tag.position.slice(source), source);

    let AstNode::HtmlElement(div) = &if_tag.branches().unwrap().default.children[0] else {
        panic!("expected the div");
    };
    assert_eq!(div.position.slice(source), "<div>");
    assert_eq!(div.block_end_position, Position::at(18));
    assert!(div.children.is_empty());
}

#[test]
fn unless_and_case_recover_like_if() {
    parse("{% unless a %}<p><b>{% endunless %}");
    parse("{% case x %}{% when 1 %}<li>{% else %}<li>{% endcase %}");
}

#[test]
fn loops_do_not_close_elements_left_open() {
    let error = fail("{% for x in y %}<div>{% endfor %}");
    assert_eq!(error.error_type(), ErrorType::Structural);
    assert_eq!(
        error.message(),
        "Attempting to close LiquidTag 'for' before HtmlElement 'div' was closed"
    );
    let unclosed = error.unclosed().expect("the div is reported");
    assert_eq!(unclosed.kind, "HtmlElement");
    assert_eq!(unclosed.name, "div");
    assert_eq!(unclosed.block_start_position, Position::new(16, 21));
}

#[test]
fn dangling_close_inside_a_conditional_branch() {
    let source = "<section>{% if a %}</section><section>{% endif %}</section>";
    let document = parse(source);
    let AstNode::HtmlElement(outer) = &document.children[0] else {
        panic!("expected the outer section");
    };
    let if_tag = tag(&outer.children[0]);
    let branch = &if_tag.branches().unwrap().default;
    let AstNode::HtmlDanglingMarkerClose(close) = &branch.children[0] else {
        panic!("expected a dangling close, got {}", branch.children[0].kind());
    };
    assert_eq!(close.position.slice(source), "</section>");
    let AstNode::HtmlElement(inner) = &branch.children[1] else {
        panic!("expected the second section");
    };
    assert_eq!(inner.block_end_position, Position::at(38));
    assert_eq!(outer.block_end_position.slice(source), "</section>");
}

#[test]
fn dangling_close_in_when_branch() {
    let source = "<p>{% case x %}{% when 1 %}</p>{% endcase %}";
    let document = parse_liquid_html(source, &ParseOptions::default().allow_unclosed(true)).unwrap();
    let AstNode::HtmlElement(p) = &document.children[0] else {
        panic!("expected the paragraph");
    };
    let case = tag(&p.children[0]);
    let when = &case.branches().unwrap().alternates[0];
    assert_eq!(when.name.as_deref(), Some("when"));
    assert!(matches!(
        when.children[0],
        AstNode::HtmlDanglingMarkerClose(_)
    ));
}

#[test]
fn dangling_close_must_lead_its_branch() {
    let error = fail("<section>{% if a %}<p></p></section>{% endif %}</section>");
    assert_eq!(
        error.message(),
        "Attempting to close HtmlElement 'section' before LiquidTag 'if' was closed"
    );

    let document = parse("<div><p>{% if a %}</p></div><div><p>{% endif %}</p></div>");
    let AstNode::HtmlElement(div) = &document.children[0] else {
        panic!("expected the div");
    };
    let AstNode::HtmlElement(p) = &div.children[0] else {
        panic!("expected the paragraph");
    };
    let branch = &tag(&p.children[0]).branches().unwrap().default;
    let kinds: Vec<_> = branch.children.iter().map(AstNode::kind).collect();
    assert_eq!(kinds, ["HtmlDanglingMarkerClose", "HtmlDanglingMarkerClose", "HtmlElement"]);
}

#[test]
fn html_closes_do_not_skip_open_elements() {
    let error = fail("<a><div></a>");
    assert_eq!(
        error.message(),
        "Attempting to close HtmlElement 'a' before HtmlElement 'div' was closed"
    );
    assert_eq!(error.position(), Position::new(8, 12));
}

#[test]
fn html_names_compare_without_case() {
    let document = parse("<DIV>x</div>");
    assert!(matches!(document.children[0], AstNode::HtmlElement(_)));
}

#[test]
fn stray_closing_tags() {
    assert_eq!(
        fail("a{% endif %}").message(),
        "Attempting to close LiquidTag 'if' before it was opened"
    );
    assert_eq!(
        fail("</div>").message(),
        "Attempting to close HtmlElement 'div' before it was opened"
    );
    assert_eq!(
        fail("{% if a %}{% endunless %}").message(),
        "Attempting to close LiquidTag 'unless' before LiquidTag 'if' was closed"
    );
}

#[test]
fn branches_need_a_branching_parent() {
    assert_eq!(
        fail("{% else %}").message(),
        "Attempting to open LiquidBranch 'else' outside of a branching tag"
    );
    let error = fail("{% if a %}{% form 'x' %}{% else %}{% endform %}{% endif %}");
    assert_eq!(
        error.message(),
        "Attempting to open LiquidBranch 'else' before LiquidTag 'form' was closed"
    );
    assert_eq!(error.unclosed().map(|u| u.name.as_str()), Some("form"));
}

#[test]
fn stray_branches_fail_even_when_unclosed_nodes_are_allowed() {
    let options = ParseOptions::default().allow_unclosed(true);
    let error = parse_liquid_html("<p>{% else %}", &options).unwrap_err();
    assert_eq!(error.error_type(), ErrorType::Structural);
    assert_eq!(
        error.message(),
        "Attempting to open LiquidBranch 'else' outside of a branching tag"
    );
}

#[test]
fn unclosed_element_at_end_of_input() {
    let source = "<div>hello";
    let error = fail(source);
    assert_eq!(
        error.message(),
        "Attempting to end parsing before HtmlElement 'div' was closed"
    );
    assert_eq!(error.position(), Position::at(source.len()));
    let unclosed = error.unclosed().unwrap();
    assert_eq!(unclosed.kind, "HtmlElement");
    assert_eq!(unclosed.block_start_position, Position::new(0, 5));
}

#[test]
fn unclosed_branching_tag_names_the_tag() {
    let error = fail("{% if a %}x");
    assert_eq!(
        error.message(),
        "Attempting to end parsing before LiquidTag 'if' was closed"
    );
    assert_eq!(error.unclosed().unwrap().name, "if");
}

#[test]
fn unclosed_nodes_allowed_when_requested() {
    let source = "<div>{% if a %}<span>x";
    let options = ParseOptions::default().allow_unclosed(true);
    let document = parse_liquid_html(source, &options).unwrap();
    let AstNode::HtmlElement(div) = &document.children[0] else {
        panic!("expected the div");
    };
    assert_eq!(div.position.slice(source), source);
    let if_tag = tag(&div.children[0]);
    assert_eq!(if_tag.block_end_position, Some(Position::at(source.len())));
}

#[test]
fn nested_regions_never_allow_unclosed_nodes() {
    let options = ParseOptions::default().allow_unclosed(true);
    let error = parse_liquid_html(r#"<div {% if a %}class="x">"#, &options).unwrap_err();
    assert_eq!(
        error.message(),
        "Attempting to end parsing before LiquidTag 'if' was closed"
    );
}

#[test]
fn completion_mode_keeps_dangling_closes_in_elements() {
    let source = "<div><span></div>";
    assert!(parse_liquid_html(source, &ParseOptions::tolerant().allow_unclosed(true)).is_err());

    let document =
        parse_liquid_html(source, &ParseOptions::completion().allow_unclosed(true)).unwrap();
    let AstNode::HtmlElement(div) = &document.children[0] else {
        panic!("expected the div");
    };
    let AstNode::HtmlElement(span) = &div.children[0] else {
        panic!("expected the span");
    };
    assert!(matches!(
        span.children[0],
        AstNode::HtmlDanglingMarkerClose(_)
    ));
}

//! Canonical strings for compound names.

use super::{AstNode, OutputMarkup};

/// Renders a tag or attribute name for comparison and diagnostics.
///
/// Text fragments contribute their value; `{{ }}` fragments render as
/// `{{raw_expression}}`.
///
/// # Examples
///
/// ```rust
/// use liquid_html_parser::{parse_liquid_html, ParseOptions};
/// use liquid_html_parser::ast::{get_name, AstNode};
///
/// let document = parse_liquid_html("<h{{ level }}>x</h{{ level }}>", &ParseOptions::default()).unwrap();
/// let AstNode::HtmlElement(element) = &document.children[0] else { unreachable!() };
/// assert_eq!(get_name(&element.name), "h{{level}}");
/// ```
pub fn get_name(fragments: &[AstNode]) -> String {
    fragments.iter().map(fragment_name).collect()
}

fn fragment_name(fragment: &AstNode) -> String {
    match fragment {
        AstNode::TextNode(text) => text.value.clone(),
        AstNode::LiquidVariableOutput(output) => match &output.markup {
            OutputMarkup::Variable(variable) => format!("{{{{{}}}}}", variable.raw_source),
            OutputMarkup::Raw(raw) => format!("{{{{{raw}}}}}"),
        },
        _ => String::new(),
    }
}

/// Plain-text value of attribute `name`, if present and free of Liquid.
pub fn attribute_value(attributes: &[AstNode], name: &str) -> Option<String> {
    attributes.iter().find_map(|attribute| match attribute {
        AstNode::AttrDoubleQuoted(attr) | AstNode::AttrSingleQuoted(attr) | AstNode::AttrUnquoted(attr)
            if get_name(&attr.name).eq_ignore_ascii_case(name) =>
        {
            attr.value
                .iter()
                .all(|v| matches!(v, AstNode::TextNode(_)))
                .then(|| get_name(&attr.value))
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{LiquidVariableOutput, TextNode};
    use crate::position::Position;

    fn text(value: &str) -> AstNode {
        AstNode::TextNode(TextNode {
            value: value.into(),
            position: Position::UNSET,
        })
    }

    #[test]
    fn text_fragments_concatenate() {
        assert_eq!(get_name(&[text("my-"), text("el")]), "my-el");
    }

    #[test]
    fn unparsed_outputs_keep_their_text() {
        let output = AstNode::LiquidVariableOutput(LiquidVariableOutput {
            markup: OutputMarkup::Raw("x |".into()),
            whitespace_start: false,
            whitespace_end: false,
            position: Position::UNSET,
        });
        assert_eq!(get_name(&[text("a-"), output]), "a-{{x |}}");
    }
}

//! Depth-first traversal.
//!
//! Reaches every node of a document, including names, attributes, branch
//! contents, `{% liquid %}` statements and Liquid found in raw bodies.

use super::{AstNode, Document, LiquidBranch, LiquidTagBody, TagMarkup};

/// Callbacks for [`walk`]. Both default to doing nothing.
pub trait Visitor {
    fn visit_node(&mut self, _node: &AstNode) {}

    fn visit_branch(&mut self, _branch: &LiquidBranch) {}
}

pub fn walk(document: &Document, visitor: &mut impl Visitor) {
    walk_nodes(&document.children, visitor);
}

pub fn walk_nodes(nodes: &[AstNode], visitor: &mut impl Visitor) {
    for node in nodes {
        walk_node(node, visitor);
    }
}

/// Visits `node`, then everything below it in source order.
pub fn walk_node(node: &AstNode, visitor: &mut impl Visitor) {
    visitor.visit_node(node);
    match node {
        AstNode::HtmlElement(element) => {
            walk_nodes(&element.name, visitor);
            walk_nodes(&element.attributes, visitor);
            walk_nodes(&element.children, visitor);
        }
        AstNode::HtmlRawNode(raw) => {
            walk_nodes(&raw.name, visitor);
            walk_nodes(&raw.attributes, visitor);
            walk_nodes(&raw.body.nodes, visitor);
        }
        AstNode::HtmlVoidElement(void) => {
            walk_nodes(&void.name, visitor);
            walk_nodes(&void.attributes, visitor);
        }
        AstNode::HtmlSelfClosingElement(element) => {
            walk_nodes(&element.name, visitor);
            walk_nodes(&element.attributes, visitor);
        }
        AstNode::HtmlDanglingMarkerClose(close) => walk_nodes(&close.name, visitor),
        AstNode::AttrDoubleQuoted(attr)
        | AstNode::AttrSingleQuoted(attr)
        | AstNode::AttrUnquoted(attr) => {
            walk_nodes(&attr.name, visitor);
            walk_nodes(&attr.value, visitor);
        }
        AstNode::AttrEmpty(attr) => walk_nodes(&attr.name, visitor),
        AstNode::LiquidTag(tag) => {
            if let TagMarkup::Liquid(statements) = &tag.markup {
                walk_nodes(statements, visitor);
            }
            match &tag.body {
                LiquidTagBody::Leaf => {}
                LiquidTagBody::Block(children) => walk_nodes(children, visitor),
                LiquidTagBody::Branched(branches) => {
                    for branch in branches.iter() {
                        visitor.visit_branch(branch);
                        walk_nodes(&branch.children, visitor);
                    }
                }
            }
        }
        AstNode::LiquidRawTag(raw) => walk_nodes(&raw.body.nodes, visitor),
        AstNode::TextNode(_)
        | AstNode::YamlFrontmatter(_)
        | AstNode::HtmlDoctype(_)
        | AstNode::HtmlComment(_)
        | AstNode::LiquidVariableOutput(_)
        | AstNode::LiquidDocParam(_)
        | AstNode::LiquidDocExample(_)
        | AstNode::LiquidDocDescription(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_liquid_html, ParseOptions};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Census {
        kinds: BTreeMap<&'static str, usize>,
        branches: Vec<Option<String>>,
    }

    impl Visitor for Census {
        fn visit_node(&mut self, node: &AstNode) {
            *self.kinds.entry(node.kind()).or_default() += 1;
        }

        fn visit_branch(&mut self, branch: &LiquidBranch) {
            self.branches.push(branch.name.clone());
        }
    }

    #[test]
    fn reaches_nested_constructs() {
        let source = r#"<a href="{{ url }}">{% if x %}<b>1</b>{% else %}{% liquid
  echo y
%}{% endif %}</a><script>var z = {{ z }};</script>"#;
        let document = parse_liquid_html(source, &ParseOptions::default()).unwrap();
        let mut census = Census::default();
        walk(&document, &mut census);

        assert_eq!(census.branches, [None, Some("else".to_string())]);
        assert_eq!(census.kinds["HtmlElement"], 2);
        assert_eq!(census.kinds["AttrDoubleQuoted"], 1);
        // url, z
        assert_eq!(census.kinds["LiquidVariableOutput"], 2);
        // if, liquid, echo
        assert_eq!(census.kinds["LiquidTag"], 3);
    }
}

//! Registry of tags whose markup gets its own grammar.

use serde::Serialize;

use super::grammar::Rule;

/// Tags with structured markup. Anything else keeps its markup as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedTag {
    Assign,
    Capture,
    Case,
    ContentFor,
    Cycle,
    Decrement,
    Echo,
    Elsif,
    For,
    Form,
    If,
    Include,
    Increment,
    Layout,
    Liquid,
    Paginate,
    Render,
    Section,
    Sections,
    Tablerow,
    Unless,
    When,
}

/// Classification of a tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Named(NamedTag),
    Unregistered,
}

impl TagKind {
    pub fn classify(name: &str) -> Self {
        NamedTag::from_name(name).map_or(TagKind::Unregistered, TagKind::Named)
    }
}

impl NamedTag {
    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name {
            "assign" => NamedTag::Assign,
            "capture" => NamedTag::Capture,
            "case" => NamedTag::Case,
            "content_for" => NamedTag::ContentFor,
            "cycle" => NamedTag::Cycle,
            "decrement" => NamedTag::Decrement,
            "echo" => NamedTag::Echo,
            "elsif" => NamedTag::Elsif,
            "for" => NamedTag::For,
            "form" => NamedTag::Form,
            "if" => NamedTag::If,
            "include" => NamedTag::Include,
            "increment" => NamedTag::Increment,
            "layout" => NamedTag::Layout,
            "liquid" => NamedTag::Liquid,
            "paginate" => NamedTag::Paginate,
            "render" => NamedTag::Render,
            "section" => NamedTag::Section,
            "sections" => NamedTag::Sections,
            "tablerow" => NamedTag::Tablerow,
            "unless" => NamedTag::Unless,
            "when" => NamedTag::When,
            _ => return None,
        };
        Some(tag)
    }

    /// Start rule the markup is matched against. `liquid` is handled as a
    /// statement list instead and has none.
    pub fn start_rule(self) -> Option<Rule> {
        let rule = match self {
            NamedTag::Assign => Rule::markup_assign,
            NamedTag::Capture | NamedTag::Decrement | NamedTag::Increment => {
                Rule::markup_variable_name
            }
            NamedTag::Case => Rule::markup_case,
            NamedTag::ContentFor => Rule::markup_content_for,
            NamedTag::Cycle => Rule::markup_cycle,
            NamedTag::Echo => Rule::markup_variable,
            NamedTag::Elsif | NamedTag::If | NamedTag::Unless => Rule::markup_condition,
            NamedTag::For | NamedTag::Tablerow => Rule::markup_for,
            NamedTag::Form => Rule::markup_form,
            NamedTag::Include | NamedTag::Render => Rule::markup_render,
            NamedTag::Layout => Rule::markup_layout,
            NamedTag::Paginate => Rule::markup_paginate,
            NamedTag::Section | NamedTag::Sections => Rule::markup_string,
            NamedTag::When => Rule::markup_when,
            NamedTag::Liquid => return None,
        };
        Some(rule)
    }
}

/// Tags whose body is a sequence of branches.
pub fn is_branching_tag(name: &str) -> bool {
    matches!(name, "if" | "unless" | "case" | "for" | "tablerow")
}

/// Tags that introduce a sibling branch inside a branching tag.
pub fn is_branch_tag(name: &str) -> bool {
    matches!(name, "elsif" | "else" | "when")
}

/// Branching tags that may absorb HTML left open inside their branches.
pub fn is_conditional_tag(name: &str) -> bool {
    matches!(name, "if" | "unless" | "case")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back() {
        assert_eq!(TagKind::classify("schema_block"), TagKind::Unregistered);
        assert_eq!(TagKind::classify("for"), TagKind::Named(NamedTag::For));
    }

    #[test]
    fn shared_grammars() {
        assert_eq!(NamedTag::Include.start_rule(), NamedTag::Render.start_rule());
        assert_eq!(NamedTag::Liquid.start_rule(), None);
    }

    #[test]
    fn only_conditionals_recover_html() {
        assert!(is_branching_tag("for"));
        assert!(!is_conditional_tag("for"));
        assert!(is_conditional_tag("unless"));
    }
}

//! Source positions shared by the CST and the AST.

use serde::{Deserialize, Serialize};

/// A half-open `[start, end)` byte range into the original source.
///
/// Every node of both trees carries one, and slicing the source with it
/// reproduces the node's text exactly.
///
/// # Examples
///
/// ```rust
/// use liquid_html_parser::position::Position;
/// let position = Position::new(2, 5);
/// assert_eq!(position.slice("a <b> c"), "<b>");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub start: isize,
    pub end: isize,
}

impl Position {
    /// Marker for a branch end that has not been reached yet.
    pub const UNSET: Position = Position { start: -1, end: -1 };

    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start as isize,
            end: end as isize,
        }
    }

    /// A zero-width position at `offset`.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }

    pub fn start(&self) -> usize {
        self.start.max(0) as usize
    }

    pub fn end(&self) -> usize {
        self.end.max(0) as usize
    }

    pub fn len(&self) -> usize {
        self.end().saturating_sub(self.start())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shifts a position produced by a sub-parse back into full-source terms.
    pub fn offset_by(self, offset: usize) -> Self {
        if self.is_unset() {
            return self;
        }
        Self::new(self.start() + offset, self.end() + offset)
    }

    /// Returns the text this position covers, or `""` when it falls outside `source`.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start()..self.end()).unwrap_or("")
    }

    pub fn to_source_span(self) -> miette::SourceSpan {
        miette::SourceSpan::from(self.start()..self.end())
    }
}

impl From<pest::Span<'_>> for Position {
    fn from(span: pest::Span<'_>) -> Self {
        Self::new(span.start(), span.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_sentinel_is_negative() {
        assert!(Position::UNSET.is_unset());
        assert!(!Position::at(0).is_unset());
        assert_eq!(Position::UNSET.offset_by(10), Position::UNSET);
    }

    #[test]
    fn offset_shifts_both_ends() {
        assert_eq!(Position::new(1, 4).offset_by(10), Position::new(11, 14));
    }

    #[test]
    fn slice_out_of_range_is_empty() {
        assert_eq!(Position::new(3, 40).slice("abc"), "");
    }
}

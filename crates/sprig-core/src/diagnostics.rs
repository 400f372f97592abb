//! Diagnostics from static analysis.
//!
//! A [`Diagnostic`] is a non-fatal, location-tagged finding. There is no
//! severity axis: every finding must be fixed, and an empty diagnostics
//! list is the sole success signal.

use std::fmt;

use crate::Span;

/// A single finding from static analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Line where the finding is anchored (1-based).
    pub line: u32,
    /// Column where the finding is anchored (1-based).
    pub col: u32,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic anchored at a span.
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            line: span.line,
            col: span.col,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

/// An ordered collection of diagnostics.
///
/// Findings are kept in the order they were reported, which for the
/// resolver is deterministic traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a new, empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether the collection holds no findings (the success signal).
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of findings.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Iterate over the findings in report order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

impl From<Vec<Diagnostic>> for Diagnostics {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_collection_is_empty() {
        let diags = Diagnostics::new();
        assert!(diags.is_empty());
        assert_eq!(diags.len(), 0);
    }

    #[test]
    fn display_format() {
        let d = Diagnostic::new(Span::new(4, 9, 1), "Undefined identifier: 'x'");
        assert_eq!(d.to_string(), "4:9: Undefined identifier: 'x'");
    }

    #[test]
    fn push_keeps_order() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(Span::point(1, 1), "first"));
        diags.push(Diagnostic::new(Span::point(2, 1), "second"));

        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}

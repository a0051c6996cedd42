//! Source code location tracking
//!
//! Every token and AST node remembers the byte range it came from and the
//! line it started on. Diagnostics only ever report the line.

use std::fmt;

/// A byte range in the source plus the (1-indexed) line it starts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    /// Start position (byte offset)
    pub start: usize,
    /// End position (byte offset, exclusive)
    pub end: usize,
    /// Line of `start`
    pub line: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32) -> Self {
        Self { start, end, line }
    }

    /// Zero-width span at `pos`
    pub fn point(pos: usize, line: u32) -> Self {
        Self { start: pos, end: pos, line }
    }

    /// Get the source text for this span
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} ({}..{})", self.line, self.start, self.end)
    }
}

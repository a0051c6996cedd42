//! Diagnostics
//!
//! Every recoverable problem (lexical, syntactic, semantic, runtime) is
//! reported through a [`DiagnosticSink`]. Severity is informational only.

use std::fmt;
use tracing::{error, info, warn};

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Which stage of the pipeline produced the diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Lexical,
    Syntax,
    Semantic,
    Runtime,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lexical => write!(f, "Lexical"),
            Phase::Syntax => write!(f, "Syntax"),
            Phase::Semantic => write!(f, "Semantic"),
            Phase::Runtime => write!(f, "Runtime"),
        }
    }
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub phase: Phase,
    pub message: String,
    pub line: Option<u32>,
}

impl Diagnostic {
    pub fn new(severity: Severity, phase: Phase, message: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            severity,
            phase,
            message: message.into(),
            line,
        }
    }

    pub fn lexical(message: impl Into<String>, line: u32) -> Self {
        Self::new(Severity::Error, Phase::Lexical, message, Some(line))
    }

    pub fn syntax(message: impl Into<String>, line: u32) -> Self {
        Self::new(Severity::Error, Phase::Syntax, message, Some(line))
    }

    pub fn semantic(message: impl Into<String>, line: u32) -> Self {
        Self::new(Severity::Error, Phase::Semantic, message, Some(line))
    }

    /// Runtime problems are recovered and reported as warnings
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, Phase::Runtime, message, None)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.phase, self.severity, self.message)?;
        if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }
        Ok(())
    }
}

/// An abstract reporting channel
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Collects diagnostics and mirrors each one as a `tracing` event
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.severity == Severity::Error)
    }

    /// Diagnostics from one phase only
    pub fn in_phase(&self, phase: Phase) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.phase == phase)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => error!(phase = %diagnostic.phase, line = ?diagnostic.line, "{}", diagnostic.message),
            Severity::Warning => warn!(phase = %diagnostic.phase, line = ?diagnostic.line, "{}", diagnostic.message),
            Severity::Info => info!(phase = %diagnostic.phase, line = ?diagnostic.line, "{}", diagnostic.message),
        }
        self.items.push(diagnostic);
    }
}

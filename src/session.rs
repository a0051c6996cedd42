//! Compilation session
//!
//! A [`Session`] owns everything that is scoped to one translation unit: the
//! symbol table, the temporary and label counters, and the diagnostics. Two
//! sessions never share state, so units can be compiled repeatedly (a REPL)
//! or side by side.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use crate::ast::{Program, Type};
use crate::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics};
use crate::ir::{IrProgram, Lowerer};
use crate::parser::{self, ParseError};

/// Variable name -> declared type
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, Type>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `name`. Returns the previous type, if any.
    pub fn declare(&mut self, name: impl Into<String>, ty: Type) -> Option<Type> {
        self.symbols.insert(name.into(), ty)
    }

    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.symbols.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Type)> {
        self.symbols.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    pub fn clear(&mut self) {
        self.symbols.clear();
    }
}

/// Compilation failure. Only a syntax error aborts a unit.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error("{error}")]
    Syntax {
        error: ParseError,
        /// Statements that were complete before the error
        partial: Program,
    },
}

/// Output of a successful compilation
#[derive(Debug, Clone)]
pub struct Compilation {
    pub ast: Program,
    pub ir: IrProgram,
}

/// State for one translation unit
#[derive(Debug, Default)]
pub struct Session {
    pub symbols: SymbolTable,
    next_temp: u32,
    next_label: u32,
    diagnostics: Diagnostics,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh temporary name: t1, t2, ...
    pub fn fresh_temp(&mut self) -> String {
        self.next_temp += 1;
        format!("t{}", self.next_temp)
    }

    /// Fresh label name: L1, L2, ...
    pub fn fresh_label(&mut self) -> String {
        self.next_label += 1;
        format!("L{}", self.next_label)
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Hand the diagnostics to the caller, leaving the session's list empty
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Forget everything from a previous unit
    pub fn reset(&mut self) {
        self.symbols.clear();
        self.next_temp = 0;
        self.next_label = 0;
        self.diagnostics.clear();
    }

    /// Run tokenize -> parse -> lower for one unit.
    ///
    /// Lexical and semantic problems end up in [`Session::diagnostics`]; a
    /// syntax error stops the unit and is returned together with the
    /// statements parsed before it.
    pub fn compile(&mut self, source: &str) -> Result<Compilation, CompileError> {
        self.reset();
        info!(bytes = source.len(), "compiling translation unit");

        let (ast, syntax_error) = parser::parse(source, self);
        if let Some(error) = syntax_error {
            return Err(CompileError::Syntax { error, partial: ast });
        }

        let ir = Lowerer::new(self).lower_program(&ast);
        debug!(
            instructions = ir.len(),
            symbols = self.symbols.len(),
            diagnostics = self.diagnostics.len(),
            "translation unit lowered"
        );
        Ok(Compilation { ast, ir })
    }
}

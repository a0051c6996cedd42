//! AST to IR Lowering
//!
//! A single top-down walk over the finished AST. Because the whole tree is
//! available, every jump target is allocated before the code that jumps to
//! it is emitted, and control flow comes out in the order
//!
//! ```text
//! if (C) B            [C] ifFalse C goto Lend [B] Lend:
//! if (C) B1 else B2   [C] ifFalse C goto Lelse [B1] goto Lend Lelse: [B2] Lend:
//! while (C) B         Lstart: [C] ifFalse C goto Lend [B] goto Lstart Lend:
//! ```

use tracing::debug;

use crate::ast::{BinaryOp, Block, Expr, ExprKind, Ident, Literal, Program, Stmt, StmtKind, Type, UnaryOp};
use crate::diagnostics::Diagnostic;
use crate::parser::unescape;
use crate::session::Session;

use super::builder::IrBuilder;
use super::types::{IoKind, IrProgram, Operand, Value};

/// A `printf`/`scanf` format string split around its single conversion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatSpec {
    pub prefix: String,
    pub conversion: Option<IoKind>,
    pub suffix: String,
}

/// Why a format string was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// `%f`, `%x`, a dangling `%`, ...
    Unsupported(String),
    /// More than one conversion
    TooManyConversions,
}

/// Split an already unescaped format string. `%%` is a literal percent sign.
pub fn parse_format(format: &str) -> Result<FormatSpec, FormatError> {
    let mut spec = FormatSpec::default();
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            if spec.conversion.is_some() {
                spec.suffix.push(c);
            } else {
                spec.prefix.push(c);
            }
            continue;
        }

        match chars.next() {
            Some('%') if spec.conversion.is_some() => spec.suffix.push('%'),
            Some('%') => spec.prefix.push('%'),
            Some(s) => match IoKind::from_specifier(s) {
                Some(_) if spec.conversion.is_some() => return Err(FormatError::TooManyConversions),
                Some(kind) => spec.conversion = Some(kind),
                None => return Err(FormatError::Unsupported(format!("%{}", s))),
            },
            None => return Err(FormatError::Unsupported("%".to_string())),
        }
    }

    Ok(spec)
}

/// Lowers AST to IR
pub struct Lowerer<'s> {
    builder: IrBuilder,
    session: &'s mut Session,
    /// Target of `return`, created on first use and placed after everything else
    exit_label: Option<String>,
}

impl<'s> Lowerer<'s> {
    pub fn new(session: &'s mut Session) -> Self {
        Self {
            builder: IrBuilder::new(),
            session,
            exit_label: None,
        }
    }

    pub fn lower_program(mut self, program: &Program) -> IrProgram {
        for stmt in &program.stmts {
            self.lower_stmt(stmt);
        }
        if let Some(exit) = self.exit_label.take() {
            self.builder.label(&exit);
        }
        self.builder.finish()
    }

    fn semantic_error(&mut self, message: String, line: u32) {
        self.session.report(Diagnostic::semantic(message, line));
    }

    fn lower_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::FunctionDef(def) => {
                debug!(name = %def.name.name, at = self.builder.position(), "inlining function body");
                self.lower_block(&def.body);
            }
            StmtKind::Block(block) => self.lower_block(block),
            // Declarations only touch the symbol table, which the parser already did
            StmtKind::Declaration { .. } => {}
            StmtKind::DeclarationAssign { name, value, .. } => {
                let src = self.lower_expr(value);
                self.builder.assign(&name.name, src);
            }
            StmtKind::Assignment { target, value } => {
                let src = self.lower_expr(value);
                self.builder.assign(&target.name, src);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch: None,
            } => {
                let cond = self.lower_expr(condition);
                let end = self.session.fresh_label();
                self.builder.if_false_goto(cond, &end);
                self.lower_block(then_branch);
                self.builder.label(&end);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch: Some(else_branch),
            } => {
                let cond = self.lower_expr(condition);
                let else_label = self.session.fresh_label();
                let end = self.session.fresh_label();
                self.builder.if_false_goto(cond, &else_label);
                self.lower_block(then_branch);
                self.builder.goto(&end);
                self.builder.label(&else_label);
                self.lower_block(else_branch);
                self.builder.label(&end);
            }
            StmtKind::While { condition, body } => {
                let start = self.session.fresh_label();
                let end = self.session.fresh_label();
                self.builder.label(&start);
                let cond = self.lower_expr(condition);
                self.builder.if_false_goto(cond, &end);
                self.lower_block(body);
                self.builder.goto(&start);
                self.builder.label(&end);
            }
            StmtKind::Print { format, arg } => self.lower_print(format, arg.as_ref(), stmt.span.line),
            StmtKind::Scan { format, target } => self.lower_scan(format, target),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.lower_expr(value);
                }
                let exit = match &self.exit_label {
                    Some(label) => label.clone(),
                    None => {
                        let label = self.session.fresh_label();
                        self.exit_label = Some(label.clone());
                        label
                    }
                };
                self.builder.goto(&exit);
            }
        }
    }

    fn lower_print(&mut self, format: &str, arg: Option<&Ident>, line: u32) {
        let spec = match parse_format(&unescape(format)) {
            Ok(spec) => spec,
            Err(err) => {
                self.report_format_error(err, line);
                return;
            }
        };

        match (spec.conversion, arg) {
            (None, None) => {
                if !spec.prefix.is_empty() {
                    self.builder.print_literal(spec.prefix);
                }
            }
            (Some(kind), Some(var)) => {
                if kind == IoKind::Str {
                    if let Some(ty) = self.session.symbols.lookup(&var.name) {
                        debug!(var = %var.name, %ty, "printing a non-string variable with %s");
                    }
                }
                if !spec.prefix.is_empty() {
                    self.builder.print_literal(spec.prefix);
                }
                self.builder.print_var(kind, &var.name);
                if !spec.suffix.is_empty() {
                    self.builder.print_literal(spec.suffix);
                }
            }
            (Some(kind), None) => {
                self.semantic_error(format!("Format specifier '{}' has no matching argument", kind), line);
            }
            (None, Some(var)) => {
                self.semantic_error(
                    format!("Argument '{}' has no format specifier", var.name),
                    var.span.line,
                );
            }
        }
    }

    fn lower_scan(&mut self, format: &str, target: &Ident) {
        let line = target.span.line;
        match parse_format(&unescape(format)) {
            Ok(FormatSpec {
                conversion: Some(kind),
                ..
            }) => {
                if let Some(Type::Char) = self.session.symbols.lookup(&target.name) {
                    if kind == IoKind::Int {
                        debug!(var = %target.name, "reading %d into a char variable");
                    }
                }
                self.builder.scan_var(kind, &target.name);
            }
            Ok(_) => self.semantic_error("scanf format has no format specifier".to_string(), line),
            Err(err) => self.report_format_error(err, line),
        }
    }

    fn report_format_error(&mut self, err: FormatError, line: u32) {
        let message = match err {
            FormatError::Unsupported(spec) => format!("Unsupported format specifier '{}'", spec),
            FormatError::TooManyConversions => "Only one format specifier is supported".to_string(),
        };
        self.semantic_error(message, line);
    }

    /// Flatten an expression, left operand first, returning where its value lives
    fn lower_expr(&mut self, expr: &Expr) -> Operand {
        match &expr.kind {
            ExprKind::Literal(Literal::Int(n)) => Operand::Literal(Value::Int(*n)),
            ExprKind::Literal(Literal::Char(c)) => Operand::Literal(Value::Char(*c)),
            ExprKind::Var(name) => Operand::Name(name.clone()),
            ExprKind::Binary { op, left, right } => {
                let lhs = self.lower_expr(left);
                let rhs = self.lower_expr(right);
                let dst = self.session.fresh_temp();
                self.builder.binop(dst, *op, lhs, rhs)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.lower_expr(operand);
                let dst = self.session.fresh_temp();
                match op {
                    UnaryOp::Neg => self.builder.binop(dst, BinaryOp::Sub, Operand::int(0), value),
                    UnaryOp::Not => self.builder.binop(dst, BinaryOp::Eq, value, Operand::int(0)),
                }
            }
        }
    }
}

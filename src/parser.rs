//! Parser / syntax analyzer
//!
//! This is a recursive descent parser that pulls tokens lazily from the
//! lexer and builds an AST. Operator precedence follows C:
//! `||` < `&&` < equality < relational < additive < multiplicative < unary.
//!
//! While building the tree it also performs the only semantic check the
//! language has: every variable must be declared before it is used. A
//! violation is reported to the session but never stops the parse.

use crate::ast::*;
use crate::diagnostics::Diagnostic;
use crate::lexer::Lexer;
use crate::session::Session;
use crate::span::Span;
use crate::token::{Token, TokenKind};
use thiserror::Error;
use tracing::{debug, trace};

/// Parser errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token '{found}' at line {line}: expected {expected}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        line: u32,
    },

    #[error("unexpected end of input at line {line}: expected {expected}")]
    UnexpectedEof { expected: String, line: u32 },

    #[error("nesting deeper than {limit} levels at line {line}")]
    NestingTooDeep { limit: u32, line: u32 },
}

impl ParseError {
    pub fn line(&self) -> u32 {
        match self {
            ParseError::UnexpectedToken { line, .. } => *line,
            ParseError::UnexpectedEof { line, .. } => *line,
            ParseError::NestingTooDeep { line, .. } => *line,
        }
    }
}

/// Parse result
pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest combined nesting of blocks, parentheses and unary operators
pub const MAX_NESTING: u32 = 128;

/// The parser
pub struct Parser<'src, 'sess> {
    lexer: Lexer<'src>,
    current: Token,
    previous: Token,
    session: &'sess mut Session,
    depth: u32,
}

impl<'src, 'sess> Parser<'src, 'sess> {
    /// Create a new parser reporting into `session`
    pub fn new(source: &'src str, session: &'sess mut Session) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let previous = current.clone();

        let mut parser = Self {
            lexer,
            current,
            previous,
            session,
            depth: 0,
        };
        parser.flush_lexer_errors();
        parser
    }

    /// Advance to next token
    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        self.previous = std::mem::replace(&mut self.current, next);
        self.flush_lexer_errors();
        self.previous.clone()
    }

    fn flush_lexer_errors(&mut self) {
        for err in self.lexer.take_errors() {
            let line = err.line();
            self.session.report(Diagnostic::lexical(err.to_string(), line));
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.current.kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.check(&TokenKind::Eof)
    }

    fn error(&self, expected: impl Into<String>) -> ParseError {
        let expected = expected.into();
        if self.is_at_end() {
            ParseError::UnexpectedEof {
                expected,
                line: self.current.line(),
            }
        } else {
            ParseError::UnexpectedToken {
                expected,
                found: self.current.kind.clone(),
                line: self.current.line(),
            }
        }
    }

    /// Consume token if it matches, otherwise error
    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(kind.describe()))
        }
    }

    /// Consume token if it matches
    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`]
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING,
                line: self.current.line(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Span from `start` up to the end of the last consumed token
    fn span_from(&self, start: Span) -> Span {
        Span::new(start.start, self.previous.span.end, start.line)
    }

    /// Report an undeclared use. Parsing carries on regardless.
    fn check_declared(&mut self, ident: &Ident) {
        if !self.session.symbols.contains(&ident.name) {
            self.session.report(Diagnostic::semantic(
                format!("Undeclared variable '{}'", ident.name),
                ident.span.line,
            ));
        }
    }

    // ============ Top-level parsing ============

    /// Parse statements until end of input.
    ///
    /// Stops at the first syntax error; the statements completed before it
    /// are returned alongside the error.
    pub fn parse_program(&mut self) -> (Program, Option<ParseError>) {
        let start = self.current.span;
        let mut stmts = Vec::new();
        let mut failure = None;

        while !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    debug!(error = %e, "parse aborted");
                    self.session.report(Diagnostic::syntax(e.to_string(), e.line()));
                    failure = Some(e);
                    break;
                }
            }
        }

        let program = Program {
            stmts,
            span: Span::new(start.start, self.previous.span.end, start.line),
        };
        (program, failure)
    }

    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        trace!(token = ?self.current.kind, line = self.current.line(), "statement");
        match self.current.kind {
            TokenKind::Int | TokenKind::Char => self.parse_declaration_or_fn(),
            TokenKind::Ident(_) => self.parse_assignment(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Printf => self.parse_printf(),
            TokenKind::Scanf => self.parse_scanf(),
            TokenKind::Return => self.parse_return(),
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                Ok(Stmt {
                    span: block.span,
                    kind: StmtKind::Block(block),
                })
            }
            _ => Err(self.error("statement")),
        }
    }

    fn parse_type(&mut self) -> ParseResult<Type> {
        if self.consume(TokenKind::Int) {
            Ok(Type::Int)
        } else if self.consume(TokenKind::Char) {
            Ok(Type::Char)
        } else {
            Err(self.error("type"))
        }
    }

    fn parse_ident(&mut self) -> ParseResult<Ident> {
        match &self.current.kind {
            TokenKind::Ident(name) => {
                let ident = Ident {
                    name: name.clone(),
                    span: self.current.span,
                };
                self.advance();
                Ok(ident)
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn parse_string(&mut self) -> ParseResult<String> {
        match &self.current.kind {
            TokenKind::StringLiteral(s) => {
                let s = s.clone();
                self.advance();
                Ok(s)
            }
            _ => Err(self.error("string literal")),
        }
    }

    /// `type ID ';'`, `type ID '=' expr ';'` or `type ID '(' ')' block`
    fn parse_declaration_or_fn(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;

        if self.consume(TokenKind::LParen) {
            self.expect(TokenKind::RParen)?;
            let body = self.parse_block()?;
            let span = self.span_from(start);
            return Ok(Stmt {
                kind: StmtKind::FunctionDef(FnDef {
                    return_type: ty,
                    name,
                    body,
                    span,
                }),
                span,
            });
        }

        let kind = if self.consume(TokenKind::Eq) {
            let value = self.parse_expr()?;
            self.expect(TokenKind::Semicolon)?;
            StmtKind::DeclarationAssign {
                ty,
                name: name.clone(),
                value,
            }
        } else {
            self.expect(TokenKind::Semicolon)?;
            StmtKind::Declaration {
                ty,
                name: name.clone(),
            }
        };

        if let Some(previous) = self.session.symbols.declare(name.name.clone(), ty) {
            if previous != ty {
                debug!(name = %name.name, %previous, new = %ty, "variable redeclared with a different type");
            }
        }

        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    /// `ID '=' expr ';'`
    fn parse_assignment(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        let target = self.parse_ident()?;
        self.check_declared(&target);
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt {
            kind: StmtKind::Assignment { target, value },
            span: self.span_from(start),
        })
    }

    fn parse_condition(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        self.expect(TokenKind::If)?;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_block()?;

        let else_branch = if self.consume(TokenKind::Else) {
            if self.check(&TokenKind::If) {
                // `else if` is sugar for `else { if ... }`
                let nested = self.parse_if()?;
                Some(Block {
                    span: nested.span,
                    stmts: vec![nested],
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span: self.span_from(start),
        })
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        self.expect(TokenKind::While)?;
        let condition = self.parse_condition()?;
        let body = self.parse_block()?;

        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            span: self.span_from(start),
        })
    }

    /// `printf '(' STRING (',' ID)? ')' ';'`
    fn parse_printf(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        self.expect(TokenKind::Printf)?;
        self.expect(TokenKind::LParen)?;
        let format = self.parse_string()?;
        let arg = if self.consume(TokenKind::Comma) {
            let ident = self.parse_ident()?;
            self.check_declared(&ident);
            Some(ident)
        } else {
            None
        };
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt {
            kind: StmtKind::Print { format, arg },
            span: self.span_from(start),
        })
    }

    /// `scanf '(' STRING ',' '&' ID ')' ';'`
    fn parse_scanf(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        self.expect(TokenKind::Scanf)?;
        self.expect(TokenKind::LParen)?;
        let format = self.parse_string()?;
        self.expect(TokenKind::Comma)?;
        self.expect(TokenKind::Ampersand)?;
        let target = self.parse_ident()?;
        self.check_declared(&target);
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt {
            kind: StmtKind::Scan { format, target },
            span: self.span_from(start),
        })
    }

    fn parse_return(&mut self) -> ParseResult<Stmt> {
        let start = self.current.span;
        self.expect(TokenKind::Return)?;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(Stmt {
            kind: StmtKind::Return(value),
            span: self.span_from(start),
        })
    }

    // ============ Block parsing ============

    fn parse_block(&mut self) -> ParseResult<Block> {
        let start = self.current.span;
        self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.nested(Self::parse_stmt)?);
        }

        self.expect(TokenKind::RBrace)?;

        Ok(Block {
            stmts,
            span: self.span_from(start),
        })
    }

    // ============ Expression parsing ============

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn binary(&self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let start = left.span;
        Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span: self.span_from(start),
        }
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_and()?;

        while self.consume(TokenKind::OrOr) {
            let right = self.parse_and()?;
            expr = self.binary(BinaryOp::Or, expr, right);
        }

        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_equality()?;

        while self.consume(TokenKind::AndAnd) {
            let right = self.parse_equality()?;
            expr = self.binary(BinaryOp::And, expr, right);
        }

        Ok(expr)
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_comparison()?;

        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            expr = self.binary(op, expr, right);
        }

        Ok(expr)
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_term()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            expr = self.binary(op, expr, right);
        }

        Ok(expr)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_factor()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            expr = self.binary(op, expr, right);
        }

        Ok(expr)
    }

    fn parse_factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_unary()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = self.binary(op, expr, right);
        }

        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current.span;

        let op = if self.consume(TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.consume(TokenKind::Not) {
            UnaryOp::Not
        } else {
            return self.parse_primary();
        };

        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span: self.span_from(start),
        })
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current.span;

        let kind = match &self.current.kind {
            TokenKind::IntLiteral(n) => ExprKind::Literal(Literal::Int(*n)),
            TokenKind::CharLiteral(raw) => ExprKind::Literal(Literal::Char(parse_char(raw))),
            TokenKind::Ident(_) => {
                let ident = self.parse_ident()?;
                self.check_declared(&ident);
                return Ok(Expr {
                    kind: ExprKind::Var(ident.name),
                    span: ident.span,
                });
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.nested(Self::parse_expr)?;
                self.expect(TokenKind::RParen)?;
                return Ok(Expr {
                    kind: inner.kind,
                    span: self.span_from(start),
                });
            }
            _ => return Err(self.error("expression")),
        };

        self.advance();
        Ok(Expr { kind, span: start })
    }
}

// ============ Helper functions ============

/// Decode the body of a character literal (quotes already stripped)
pub fn parse_char(raw: &str) -> char {
    let mut chars = raw.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('\'') => '\'',
            Some('"') => '"',
            Some(c) => c,
            None => '\\',
        },
        Some(c) => c,
        None => '\0',
    }
}

/// Decode escape sequences in the body of a string literal
pub fn unescape(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('0') => result.push('\0'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(c) => result.push(c),
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Parse one translation unit, reporting into `session`
pub fn parse(source: &str, session: &mut Session) -> (Program, Option<ParseError>) {
    Parser::new(source, session).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Phase;

    fn parse_ok(source: &str) -> (Program, Session) {
        let mut session = Session::new();
        let (program, error) = parse(source, &mut session);
        assert!(error.is_none(), "Parse error: {:?}", error);
        (program, session)
    }

    fn semantic_messages(session: &Session) -> Vec<String> {
        session
            .diagnostics()
            .in_phase(Phase::Semantic)
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn test_empty_program() {
        let (program, _) = parse_ok("");
        assert!(program.stmts.is_empty());
    }

    #[test]
    fn test_declarations() {
        let (program, session) = parse_ok("int x; char c = 'a';");
        assert_eq!(program.stmts.len(), 2);
        assert!(matches!(
            &program.stmts[0].kind,
            StmtKind::Declaration { ty: Type::Int, name } if name.name == "x"
        ));
        assert!(matches!(
            &program.stmts[1].kind,
            StmtKind::DeclarationAssign {
                ty: Type::Char,
                value: Expr { kind: ExprKind::Literal(Literal::Char('a')), .. },
                ..
            }
        ));
        assert_eq!(session.symbols.lookup("c"), Some(Type::Char));
        assert!(session.diagnostics().is_empty());
    }

    #[test]
    fn test_precedence() {
        let (program, _) = parse_ok("int a; int b; int c; a = a + b * c || b;");
        let StmtKind::Assignment { value, .. } = &program.stmts[3].kind else {
            panic!("expected assignment");
        };
        let ExprKind::Binary { op: BinaryOp::Or, left, .. } = &value.kind else {
            panic!("expected || at the root");
        };
        let ExprKind::Binary { op: BinaryOp::Add, right, .. } = &left.kind else {
            panic!("expected + under ||");
        };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn test_left_associative_subtraction() {
        let (program, _) = parse_ok("int r = 10 - 4 - 3;");
        let StmtKind::DeclarationAssign { value, .. } = &program.stmts[0].kind else {
            panic!("expected declaration");
        };
        let ExprKind::Binary { op: BinaryOp::Sub, left, right } = &value.kind else {
            panic!("expected subtraction");
        };
        assert!(matches!(left.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
        assert_eq!(right.kind, ExprKind::Literal(Literal::Int(3)));
    }

    #[test]
    fn test_grouping_and_unary() {
        let (program, _) = parse_ok("int r = -(1 + 2) * !0;");
        let StmtKind::DeclarationAssign { value, .. } = &program.stmts[0].kind else {
            panic!("expected declaration");
        };
        let ExprKind::Binary { op: BinaryOp::Mul, left, right } = &value.kind else {
            panic!("expected multiplication");
        };
        assert!(matches!(left.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
        assert!(matches!(right.kind, ExprKind::Unary { op: UnaryOp::Not, .. }));
    }

    #[test]
    fn test_if_else_and_while() {
        let (program, _) = parse_ok(
            "int a = 3; if (a > 1) { a = 1; } else { a = 2; } while (a) { a = a - 1; }",
        );
        assert!(matches!(
            &program.stmts[1].kind,
            StmtKind::If { else_branch: Some(_), .. }
        ));
        assert!(matches!(&program.stmts[2].kind, StmtKind::While { .. }));
    }

    #[test]
    fn test_else_if_chain() {
        let (program, _) = parse_ok("int a; if (a) { } else if (a == 2) { } else { }");
        let StmtKind::If { else_branch: Some(block), .. } = &program.stmts[1].kind else {
            panic!("expected if/else");
        };
        assert!(matches!(block.stmts[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn test_function_definition_keeps_body() {
        let (program, _) = parse_ok("int main() { int x = 1; printf(\"%d\", x); return 0; }");
        let StmtKind::FunctionDef(def) = &program.stmts[0].kind else {
            panic!("expected function definition");
        };
        assert_eq!(def.name.name, "main");
        assert_eq!(def.return_type, Type::Int);
        assert_eq!(def.body.stmts.len(), 3);
    }

    #[test]
    fn test_io_statements() {
        let (program, session) = parse_ok(r#"int n; scanf("%d", &n); printf("n=%d\n", n); printf("bye");"#);
        assert!(matches!(&program.stmts[1].kind, StmtKind::Scan { target, .. } if target.name == "n"));
        assert!(matches!(
            &program.stmts[2].kind,
            StmtKind::Print { format, arg: Some(_) } if format == "n=%d\\n"
        ));
        assert!(matches!(&program.stmts[3].kind, StmtKind::Print { arg: None, .. }));
        assert!(session.diagnostics().is_empty());
    }

    #[test]
    fn test_undeclared_use_reports_once_per_use() {
        let (_, session) = parse_ok("int a = b + 1;\nc = a;");
        assert_eq!(
            semantic_messages(&session),
            vec!["Undeclared variable 'b'".to_string(), "Undeclared variable 'c'".to_string()]
        );
        let lines: Vec<_> = session.diagnostics().iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_self_reference_in_initializer_is_undeclared() {
        let (_, session) = parse_ok("int x = x;");
        assert_eq!(semantic_messages(&session), vec!["Undeclared variable 'x'".to_string()]);
    }

    #[test]
    fn test_undeclared_scanf_target_is_not_fatal() {
        let (program, session) = parse_ok(r#"scanf("%d", &n);"#);
        assert_eq!(program.stmts.len(), 1);
        assert_eq!(semantic_messages(&session), vec!["Undeclared variable 'n'".to_string()]);
    }

    #[test]
    fn test_syntax_error_stops_parse() {
        let mut session = Session::new();
        let (program, error) = parse("int a = 1;\nint b = 2\nint c = 3;", &mut session);
        assert_eq!(program.stmts.len(), 1);
        let error = error.expect("missing semicolon is a syntax error");
        assert_eq!(
            error,
            ParseError::UnexpectedToken {
                expected: "';'".to_string(),
                found: TokenKind::Int,
                line: 3,
            }
        );
        assert_eq!(session.diagnostics().in_phase(Phase::Syntax).count(), 1);
    }

    #[test]
    fn test_unexpected_eof() {
        let mut session = Session::new();
        let (_, error) = parse("while (1) {", &mut session);
        assert!(matches!(error, Some(ParseError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_lexical_errors_are_forwarded() {
        let (_, session) = parse_ok("int a = 1; @");
        let lexical: Vec<_> = session.diagnostics().in_phase(Phase::Lexical).collect();
        assert_eq!(lexical.len(), 1);
        assert_eq!(lexical[0].message, "illegal character '@'");
        assert_eq!(lexical[0].to_string(), "Lexical error: illegal character '@' (line 1)");
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let depth = 1000;
        let source = format!("int x = {}1{};", "(".repeat(depth), ")".repeat(depth));
        let mut session = Session::new();
        let (_, error) = parse(&source, &mut session);
        assert_eq!(
            error,
            Some(ParseError::NestingTooDeep {
                limit: MAX_NESTING,
                line: 1,
            })
        );
    }

    #[test]
    fn test_deep_unary_and_blocks_are_rejected() {
        let mut session = Session::new();
        let (_, error) = parse(&format!("int x = {}1;", "-".repeat(1000)), &mut session);
        assert!(matches!(error, Some(ParseError::NestingTooDeep { .. })));

        let blocks = format!("{}{}", "{".repeat(1000), "}".repeat(1000));
        let (_, error) = parse(&blocks, &mut session);
        assert!(matches!(error, Some(ParseError::NestingTooDeep { .. })));
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        let source = format!("int x = {}1{};", "(".repeat(100), ")".repeat(100));
        let (program, _) = parse_ok(&source);
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn test_escape_helpers() {
        assert_eq!(parse_char("\\n"), '\n');
        assert_eq!(parse_char("q"), 'q');
        assert_eq!(unescape("a\\tb\\n\\\"c\\\""), "a\tb\n\"c\"");
    }
}

//! Token definitions for the C subset
//!
//! This module defines all the tokens that the lexer can produce.

use crate::span::Span;
use logos::{FilterResult, Logos, Skip};
use std::fmt;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Line the token starts on (1-indexed)
    pub fn line(&self) -> u32 {
        self.span.line
    }

    /// Get the text of this token from source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// Why logos could not produce a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanFailure {
    /// No rule matches the input
    #[default]
    Illegal,
    /// `/*` with no closing `*/`; the rest of the input was consumed
    UnterminatedComment,
    /// A digit run that does not fit in an `i64`
    IntegerOutOfRange,
}

/// All possible token types.
///
/// The lexer's extras hold the current line number.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(extras = u32)]
#[logos(error = ScanFailure)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    // ============ Literals ============

    /// Decimal integer literal: 42
    #[regex(r"[0-9]+", int_literal)]
    IntLiteral(i64),

    /// Character literal with the quotes stripped: 'a', '\n'
    #[regex(r"'([^'\\\n]|\\.)'", strip_quotes)]
    CharLiteral(String),

    /// String literal with the quotes stripped, escapes left as written
    #[regex(r#""([^"\\\n]|\\.)*""#, strip_quotes)]
    StringLiteral(String),

    // ============ Keywords ============

    #[token("int")]
    Int,
    #[token("char")]
    Char,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("return")]
    Return,
    #[token("printf")]
    Printf,
    #[token("scanf")]
    Scanf,

    // ============ Operators ============

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,

    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Not,

    #[token("&")]
    Ampersand,
    #[token("=")]
    Eq,

    // ============ Delimiters ============

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,

    // ============ Identifiers ============

    /// Identifier: foo, _bar
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // ============ Special ============

    /// Line-carrying trivia (newlines, block comments). The callbacks bump
    /// the line counter and skip, so this kind is never produced.
    #[regex(r"\n", newline)]
    #[token("/*", block_comment)]
    Trivia,

    /// End of input
    Eof,
}

fn int_literal(lex: &mut logos::Lexer<TokenKind>) -> Result<i64, ScanFailure> {
    lex.slice().parse().map_err(|_| ScanFailure::IntegerOutOfRange)
}

fn strip_quotes(lex: &mut logos::Lexer<TokenKind>) -> String {
    let s = lex.slice();
    s[1..s.len() - 1].to_string()
}

fn newline(lex: &mut logos::Lexer<TokenKind>) -> Skip {
    lex.extras += 1;
    Skip
}

/// Skip to the closing `*/`. Without one, the rest of the input is eaten.
fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> FilterResult<(), ScanFailure> {
    let rest = lex.remainder();
    let (body, consumed, closed) = match rest.find("*/") {
        Some(end) => (&rest[..end], end + 2, true),
        None => (rest, rest.len(), false),
    };
    lex.extras += body.matches('\n').count() as u32;
    lex.bump(consumed);

    if closed {
        FilterResult::Skip
    } else {
        FilterResult::Error(ScanFailure::UnterminatedComment)
    }
}

impl TokenKind {
    /// Short description used in "expected ..." messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::IntLiteral(_) => "integer".to_string(),
            TokenKind::CharLiteral(_) => "character literal".to_string(),
            TokenKind::StringLiteral(_) => "string literal".to_string(),
            TokenKind::Ident(_) => "identifier".to_string(),
            other => format!("'{}'", other),
        }
    }
}

/// Prints the token the way it is written in source, so that re-lexing the
/// output yields the same kinds and values.
impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::IntLiteral(n) => return write!(f, "{}", n),
            TokenKind::CharLiteral(c) => return write!(f, "'{}'", c),
            TokenKind::StringLiteral(s) => return write!(f, "\"{}\"", s),
            TokenKind::Ident(name) => return write!(f, "{}", name),
            TokenKind::Int => "int",
            TokenKind::Char => "char",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Return => "return",
            TokenKind::Printf => "printf",
            TokenKind::Scanf => "scanf",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Not => "!",
            TokenKind::Ampersand => "&",
            TokenKind::Eq => "=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Trivia => "",
            TokenKind::Eof => "end of input",
        };
        write!(f, "{}", s)
    }
}

/// Render a token sequence back to source text, one space between tokens.
/// The end marker is dropped.
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .map(|t| t.kind.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

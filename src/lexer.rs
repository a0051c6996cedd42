//! Lexer for the C subset
//!
//! The lexer converts source code into a lazy stream of tokens.
//! It uses the `logos` crate for the scanning itself and adds line tracking
//! plus one-character error recovery on top.

use crate::span::Span;
use crate::token::{ScanFailure, Token, TokenKind};
use logos::Logos;
use thiserror::Error;
use tracing::{debug, trace};

/// Lexer errors. None of them stop tokenization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("illegal character '{ch}'")]
    UnexpectedChar { ch: char, line: u32 },

    #[error("unterminated block comment")]
    UnterminatedComment { line: u32 },

    #[error("integer literal {literal} does not fit in 64 bits, using {}", i64::MAX)]
    IntegerOutOfRange { literal: String, line: u32 },
}

impl LexerError {
    pub fn line(&self) -> u32 {
        match self {
            LexerError::UnexpectedChar { line, .. }
            | LexerError::UnterminatedComment { line }
            | LexerError::IntegerOutOfRange { line, .. } => *line,
        }
    }
}

/// The lexer
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    /// Byte offset of `inner`'s input within `source`
    base: usize,
    errors: Vec<LexerError>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer_with_extras(source, 1),
            base: 0,
            errors: Vec::new(),
        }
    }

    /// Drain the errors recorded so far
    pub fn take_errors(&mut self) -> Vec<LexerError> {
        std::mem::take(&mut self.errors)
    }

    /// Get the next token. Keeps returning `Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            match self.inner.next() {
                Some(Ok(kind)) => {
                    let span = self.inner.span();
                    let token = Token::new(
                        kind,
                        Span::new(self.base + span.start, self.base + span.end, self.inner.extras),
                    );
                    trace!(kind = ?token.kind, line = token.line(), "token");
                    return token;
                }
                Some(Err(ScanFailure::Illegal)) => self.recover(),
                Some(Err(ScanFailure::UnterminatedComment)) => {
                    let span = self.inner.span();
                    let body = &self.source[self.base + span.start..self.base + span.end];
                    let line = self.inner.extras - body.matches('\n').count() as u32;
                    debug!(line, "unterminated block comment");
                    self.errors.push(LexerError::UnterminatedComment { line });
                }
                Some(Err(ScanFailure::IntegerOutOfRange)) => {
                    let span = self.inner.span();
                    let line = self.inner.extras;
                    let literal = self.inner.slice().to_string();
                    debug!(%literal, line, "integer literal out of range");
                    self.errors.push(LexerError::IntegerOutOfRange { literal, line });
                    return Token::new(
                        TokenKind::IntLiteral(i64::MAX),
                        Span::new(self.base + span.start, self.base + span.end, line),
                    );
                }
                None => {
                    let pos = self.source.len();
                    return Token::new(TokenKind::Eof, Span::point(pos, self.inner.extras));
                }
            }
        }
    }

    /// Record the offending character and resume exactly one character later.
    fn recover(&mut self) {
        let span = self.inner.span();
        let start = self.base + span.start;
        let line = self.inner.extras;
        let Some(ch) = self.source[start..].chars().next() else {
            return;
        };
        debug!(%ch, line, "illegal character");
        self.errors.push(LexerError::UnexpectedChar { ch, line });

        // logos may have consumed a longer failed prefix (e.g. an unterminated
        // literal); rewind so only the first character is dropped.
        if span.len() != ch.len_utf8() {
            self.base = start + ch.len_utf8();
            self.inner = TokenKind::lexer_with_extras(&self.source[self.base..], line);
        }
    }

    /// Collect all tokens, including the trailing `Eof`
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<LexerError>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        (tokens, self.errors)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Helper function to lex source code
pub fn lex(source: &str) -> (Vec<Token>, Vec<LexerError>) {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::render;

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = lex(source);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(token_kinds(""), vec![TokenKind::Eof]);
        assert_eq!(token_kinds("  \t\n\n "), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_keywords_are_retagged() {
        let kinds = token_kinds("int char if else while return printf scanf integer");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Char,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::Printf,
                TokenKind::Scanf,
                TokenKind::Ident("integer".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_multi_char_operators_win() {
        let kinds = token_kinds("== = != ! <= < >= > && & || ");
        assert_eq!(
            kinds,
            vec![
                TokenKind::EqEq,
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::Not,
                TokenKind::LtEq,
                TokenKind::Lt,
                TokenKind::GtEq,
                TokenKind::Gt,
                TokenKind::AndAnd,
                TokenKind::Ampersand,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_literals() {
        let kinds = token_kinds(r#"42 'a' '\n' "hi %d\n""#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral(42),
                TokenKind::CharLiteral("a".to_string()),
                TokenKind::CharLiteral("\\n".to_string()),
                TokenKind::StringLiteral("hi %d\\n".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_tracking() {
        let (tokens, _) = lex("int x;\n\nx = 1;\n/* a\nb */ y");
        let lines: Vec<u32> = tokens.iter().map(|t| t.line()).collect();
        assert_eq!(lines, vec![1, 1, 1, 3, 3, 3, 3, 5, 5]);
    }

    #[test]
    fn test_comments_and_preprocessor_skipped() {
        let kinds = token_kinds("#include <stdio.h>\n// note\nint x; /* gone */");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Ident("x".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let (tokens, errors) = lex("a /* one * two\n ** three\n*/ b / c");
        assert!(errors.is_empty());
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Ident("b".to_string()),
                TokenKind::Slash,
                TokenKind::Ident("c".to_string()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[1].line(), 3);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (tokens, errors) = lex("int x;\n/* never\nclosed int y;");
        assert_eq!(errors, vec![LexerError::UnterminatedComment { line: 2 }]);
        assert_eq!(errors[0].to_string(), "unterminated block comment");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
        assert_eq!(tokens[3].line(), 3);
    }

    #[test]
    fn test_oversized_integer_saturates() {
        let (tokens, errors) = lex("99999999999999999999 7");
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral(i64::MAX));
        assert_eq!(tokens[0].span.end, 20);
        assert_eq!(tokens[1].kind, TokenKind::IntLiteral(7));
        assert_eq!(
            errors,
            vec![LexerError::IntegerOutOfRange {
                literal: "99999999999999999999".to_string(),
                line: 1,
            }]
        );
        assert_eq!(lex("9223372036854775807").0[0].kind, TokenKind::IntLiteral(i64::MAX));
    }

    #[test]
    fn test_illegal_character_skips_one() {
        let (tokens, errors) = lex("int @x;\n$");
        let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Ident("x".to_string()),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            errors,
            vec![
                LexerError::UnexpectedChar { ch: '@', line: 1 },
                LexerError::UnexpectedChar { ch: '$', line: 2 },
            ]
        );
    }

    #[test]
    fn test_unterminated_string_drops_only_the_quote() {
        let (tokens, errors) = lex("\"abc");
        assert_eq!(errors, vec![LexerError::UnexpectedChar { ch: '"', line: 1 }]);
        assert_eq!(errors[0].to_string(), "illegal character '\"'");
        assert_eq!(tokens[0].kind, TokenKind::Ident("abc".to_string()));
        assert_eq!(tokens[0].span.start, 1);
    }

    #[test]
    fn test_lazy_iterator_stops_before_eof() {
        let count = Lexer::new("a b c").count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_render_round_trip() {
        let source = r#"int main() { char c = 'x'; if (a >= 10 && !b) { printf("%d\n", a); } }"#;
        let (tokens, errors) = lex(source);
        assert!(errors.is_empty());
        let (again, _) = lex(&render(&tokens));
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        let kinds_again: Vec<_> = again.into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds, kinds_again);
    }
}

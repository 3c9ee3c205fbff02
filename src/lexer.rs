//! Lexer for the mini-C front end
//!
//! The lexer converts source code into a stream of tokens.
//! It uses the `logos` crate for efficient lexing.
//!
//! Lexical errors are report-and-continue: the offending input is skipped,
//! the error recorded, and scanning resumes, so a single bad character does
//! not hide errors later in the file. The token stream always ends with an
//! explicit `Eof` token.

use crate::span::Span;
use crate::token::{Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// Lexer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("unexpected character `{ch}` on line {line}")]
    UnexpectedChar { ch: char, line: usize },

    #[error("unterminated string literal on line {line}")]
    UnterminatedString { line: usize },
}

/// The mini-C lexer
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    peeked: Option<Token>,
    errors: Vec<LexerError>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            peeked: None,
            errors: Vec::new(),
        }
    }

    /// Get the source code
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Get any errors that occurred during lexing
    pub fn errors(&self) -> &[LexerError] {
        &self.errors
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> Option<&Token> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_token());
        }
        self.peeked.as_ref()
    }

    /// Get the next token; at end of input this keeps returning `Eof`
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.peeked.take() {
            return token;
        }

        loop {
            match self.inner.next() {
                Some(Ok(TokenKind::UnterminatedString)) => {
                    let span = self.inner.span();
                    let line = Span::new(span.start, span.end).line(self.source);
                    self.errors.push(LexerError::UnterminatedString { line });
                    continue;
                }
                Some(Ok(kind)) => {
                    let span = self.inner.span();
                    return Token::new(kind, Span::new(span.start, span.end));
                }
                Some(Err(())) => {
                    // Skip the invalid character and record the error
                    let span = self.inner.span();
                    let ch = self.source[span.start..].chars().next().unwrap_or('\0');
                    let line = Span::new(span.start, span.end).line(self.source);
                    self.errors.push(LexerError::UnexpectedChar { ch, line });
                    continue;
                }
                None => {
                    let pos = self.source.len();
                    return Token::new(TokenKind::Eof, Span::new(pos, pos));
                }
            }
        }
    }

    /// Collect all tokens into a vector, `Eof`-terminated
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

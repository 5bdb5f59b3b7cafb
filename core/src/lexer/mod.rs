//! Source text to tokens.
//!
//! The scanner itself is generated by `logos`; this module wraps it to attach
//! line/column positions, append the single `EndOfInput` token, and stop at
//! the first unrecognized character.

mod token;


pub use token::{LineTracker, Token, TokenKind};

use logos::Logos;
use thiserror::Error;
use tracing::debug;

use crate::api::{Diagnostic, ErrorKind};
use crate::syntax::Span;

/// An unrecognized character. Lexing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized character '{character}' at {span}")]
pub struct LexError {
    pub character: char,
    pub span: Span,
}

/// Lazy token stream over a source string.
///
/// Yields tokens in source order, then exactly one `EndOfInput` token, then
/// `None`. After an error it yields nothing more. A new `Lexer` over the same
/// source starts again from the beginning.
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            finished: false,
        }
    }

    fn span_at(&self, start: usize, end: usize) -> Span {
        let LineTracker { line, line_start } = self.inner.extras;
        let column = self.source[line_start..start].chars().count() + 1;
        Span::new(start, end, line + 1, column)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let range = self.inner.span();
                Some(Ok(Token {
                    kind,
                    text: self.inner.slice().to_string(),
                    span: self.span_at(range.start, range.end),
                }))
            }
            Some(Err(())) => {
                self.finished = true;
                let start = self.inner.span().start;
                let character = self.source[start..].chars().next().unwrap_or('\0');
                Some(Err(LexError {
                    character,
                    span: self.span_at(start, start + character.len_utf8()),
                }))
            }
            None => {
                self.finished = true;
                let end = self.source.len();
                Some(Ok(Token {
                    kind: TokenKind::EndOfInput,
                    text: String::new(),
                    span: self.span_at(end, end),
                }))
            }
        }
    }
}

/// Lex a whole program. The result always ends with `EndOfInput`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(source).collect::<Result<Vec<_>, _>>()?;
    debug!(tokens = tokens.len(), "lexed source");
    Ok(tokens)
}

impl LexError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            ErrorKind::LexError,
            format!("Unrecognized character '{}'", self.character),
            Some(self.span),
        )
        .with_code("L001")
    }
}

impl From<LexError> for Diagnostic {
    fn from(err: LexError) -> Self {
        err.to_diagnostic()
    }
}

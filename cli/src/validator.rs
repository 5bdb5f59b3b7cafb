use quill_core::lexer::{Lexer, TokenKind};
use reedline::{ValidationResult, Validator};

/// How many blocks and parentheses are still open at the end of `buffer`.
///
/// Returns `None` when the buffer does not lex; the input is then complete
/// as far as the editor is concerned and the error gets reported on submit.
pub fn calculate_depth(buffer: &str) -> Option<usize> {
    let mut depth: isize = 0;
    let mut previous = None;

    for token in Lexer::new(buffer) {
        let kind = token.ok()?.kind;
        match kind {
            // `else if` continues the outer `if` and shares its `end`.
            TokenKind::If if previous == Some(TokenKind::Else) => {}
            TokenKind::If | TokenKind::While | TokenKind::For | TokenKind::Define => depth += 1,
            TokenKind::LeftParen => depth += 1,
            TokenKind::End | TokenKind::RightParen => depth -= 1,
            _ => {}
        }
        previous = Some(kind);
    }

    Some(depth.max(0) as usize)
}

/// Keeps the REPL reading lines until every opened block is closed.
pub struct BlockValidator;

impl Validator for BlockValidator {
    fn validate(&self, line: &str) -> ValidationResult {
        match calculate_depth(line) {
            Some(depth) if depth > 0 => ValidationResult::Incomplete,
            _ => ValidationResult::Complete,
        }
    }
}

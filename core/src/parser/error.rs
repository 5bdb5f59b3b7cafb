use thiserror::Error;

use crate::api::{Diagnostic, ErrorKind};
use crate::diagnostics::context::Context;
use crate::syntax::Span;

/// Parser error with context
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub context: Vec<Context>,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// A block reached end of input before its `end`.
    #[error("expected 'end' to close {opener}, found end of input")]
    UnclosedBlock { opener: String },

    /// Integer literal that does not fit in 64 bits.
    #[error("invalid number literal '{text}'")]
    InvalidNumber { text: String },

    #[error("duplicate parameter '{name}' in function '{function}'")]
    DuplicateParameter { name: String, function: String },

    #[error("nesting depth exceeds maximum of {max_depth} levels")]
    MaxDepthExceeded { max_depth: usize },
}

impl ParseError {
    /// Create a new ParseError with no context
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context.push(context);
        self
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { .. } => ("P001", None),
            ParseErrorKind::UnclosedBlock { .. } => {
                ("P002", Some("Add the missing 'end'".to_string()))
            }
            ParseErrorKind::InvalidNumber { .. } => (
                "P003",
                Some(format!(
                    "Integer literals must be between 0 and {}",
                    i64::MAX
                )),
            ),
            ParseErrorKind::DuplicateParameter { .. } => {
                ("P004", Some("Rename one of the parameters".to_string()))
            }
            ParseErrorKind::MaxDepthExceeded { .. } => (
                "P005",
                Some("Reduce nesting or simplify the expression".to_string()),
            ),
        };

        let message = capitalize(&self.kind.to_string());
        let mut diagnostic = Diagnostic::new(ErrorKind::ParseError, message, Some(self.span))
            .with_code(code)
            .with_related(self.context.iter().map(|ctx| ctx.to_related_info()));
        if let Some(help) = help {
            diagnostic = diagnostic.with_help(help);
        }
        diagnostic
    }
}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        err.to_diagnostic()
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

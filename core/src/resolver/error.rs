use thiserror::Error;

use crate::api::{Diagnostic, ErrorKind};
use crate::diagnostics::context::Context;
use crate::syntax::Span;

/// Resolution error with context
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}")]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub span: Span,
    pub context: Vec<Context>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveErrorKind {
    #[error("Undefined variable '{name}'")]
    UndefinedName { name: String },

    /// A top-level call reaches a function that reads a global not yet
    /// declared at the call site.
    #[error("Function '{function}' uses global '{name}', which is not declared before this call")]
    GlobalNotYetDeclared { name: String, function: String },

    #[error("Undefined function '{name}'")]
    UndefinedFunction { name: String },

    #[error("Function '{function}' expects {}, found {}", arguments(*.expected), arguments(*.found))]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("'return' outside of a function body")]
    ReturnOutsideFunction,

    #[error("Function '{name}' is already defined")]
    DuplicateFunction { name: String },

    /// A function kept from an earlier run no longer resolves against the
    /// current definitions. Reported where it is called.
    #[error("Function '{function}' from an earlier input is no longer valid: {reason}")]
    Stale {
        function: String,
        reason: Box<ResolveErrorKind>,
    },
}

impl ResolveErrorKind {
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            ResolveErrorKind::UndefinedName { .. }
            | ResolveErrorKind::GlobalNotYetDeclared { .. } => ErrorKind::UndefinedNameError,
            ResolveErrorKind::UndefinedFunction { .. } => ErrorKind::UndefinedFunctionError,
            ResolveErrorKind::ArityMismatch { .. } => ErrorKind::ArityMismatchError,
            ResolveErrorKind::ReturnOutsideFunction => ErrorKind::ReturnOutsideFunctionError,
            ResolveErrorKind::DuplicateFunction { .. } => ErrorKind::DuplicateFunctionError,
            ResolveErrorKind::Stale { reason, .. } => reason.error_kind(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ResolveErrorKind::UndefinedName { .. } => "R001",
            ResolveErrorKind::GlobalNotYetDeclared { .. } => "R002",
            ResolveErrorKind::UndefinedFunction { .. } => "R003",
            ResolveErrorKind::ArityMismatch { .. } => "R004",
            ResolveErrorKind::ReturnOutsideFunction => "R005",
            ResolveErrorKind::DuplicateFunction { .. } => "R006",
            ResolveErrorKind::Stale { .. } => "R007",
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            ResolveErrorKind::UndefinedName { .. } => {
                Some("Declare the variable with 'let' before using it")
            }
            ResolveErrorKind::GlobalNotYetDeclared { .. } => {
                Some("Move the call after the global's 'let' declaration")
            }
            ResolveErrorKind::UndefinedFunction { .. } => Some("Define it with 'define function'"),
            ResolveErrorKind::ArityMismatch { .. } => None,
            ResolveErrorKind::ReturnOutsideFunction => {
                Some("'return' can only be used inside 'define function ... end'")
            }
            ResolveErrorKind::DuplicateFunction { .. } => Some("Rename one of the functions"),
            ResolveErrorKind::Stale { .. } => Some("Redefine the function"),
        }
    }
}

fn arguments(count: usize) -> String {
    if count == 1 {
        "1 argument".to_string()
    } else {
        format!("{} arguments", count)
    }
}

impl ResolveError {
    pub fn new(kind: ResolveErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Option<Context>) -> Self {
        self.context.extend(context);
        self
    }

    pub fn error_kind(&self) -> ErrorKind {
        self.kind.error_kind()
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diagnostic =
            Diagnostic::new(self.error_kind(), self.kind.to_string(), Some(self.span))
                .with_code(self.kind.code())
                .with_related(self.context.iter().map(|ctx| ctx.to_related_info()));
        if let Some(help) = self.kind.help() {
            diagnostic = diagnostic.with_help(help);
        }
        diagnostic
    }
}

impl From<ResolveError> for Diagnostic {
    fn from(err: ResolveError) -> Self {
        err.to_diagnostic()
    }
}

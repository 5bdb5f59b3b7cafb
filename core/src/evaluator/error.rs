//! Runtime evaluation errors.
//!
//! # Error Categories
//!
//! - **Runtime errors**: operations applied to values they do not support,
//!   such as division by zero or negating a Boolean.
//!
//! - **Resource exceeded errors**: a limit configured in `ExecutionOptions`
//!   was hit.
//!
//! The undefined-name, arity and `return` variants of [`RuntimeError`] are
//! unreachable for a program that passed resolution; they only guard
//! programs executed without it.

use thiserror::Error;

use crate::api::{Diagnostic, ErrorKind, Phase};
use crate::diagnostics::context::Context;
use crate::syntax::Span;

/// Calls recorded on an error while it unwinds; deeper frames are dropped.
const MAX_CALL_CONTEXT: usize = 8;

/// Runtime evaluation error, with the calls it unwound through.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub context: Vec<Context>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionErrorKind {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    ResourceExceeded(#[from] ResourceExceededError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Division by zero")]
    DivisionByZero { span: Span },

    #[error("Cannot apply '{op}' to {operand}")]
    InvalidOperand {
        op: String,
        operand: &'static str,
        span: Span,
    },

    #[error("Cannot apply '{op}' to {left} and {right}")]
    InvalidOperands {
        op: String,
        left: &'static str,
        right: &'static str,
        span: Span,
    },

    #[error("Loop {bound} must be a number, found {found}")]
    InvalidLoopBound {
        bound: &'static str,
        found: &'static str,
        span: Span,
    },

    #[error("Undefined variable '{name}'")]
    UndefinedName { name: String, span: Span },

    #[error("Undefined function '{name}'")]
    UndefinedFunction { name: String, span: Span },

    #[error("Function '{function}' expects {expected} arguments, found {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    #[error("'return' outside of a function body")]
    ReturnOutsideFunction { span: Span },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceExceededError {
    #[error("Call depth {depth} exceeds maximum of {max_depth}")]
    StackOverflow {
        depth: usize,
        max_depth: usize,
        span: Span,
    },

    #[error("Loop iterations exceed maximum of {max_iterations}")]
    IterationLimit { max_iterations: usize, span: Span },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::DivisionByZero { span }
            | RuntimeError::InvalidOperand { span, .. }
            | RuntimeError::InvalidOperands { span, .. }
            | RuntimeError::InvalidLoopBound { span, .. }
            | RuntimeError::UndefinedName { span, .. }
            | RuntimeError::UndefinedFunction { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::ReturnOutsideFunction { span } => *span,
        }
    }

    fn error_kind(&self) -> ErrorKind {
        match self {
            RuntimeError::DivisionByZero { .. } => ErrorKind::DivisionByZeroError,
            RuntimeError::InvalidOperand { .. }
            | RuntimeError::InvalidOperands { .. }
            | RuntimeError::InvalidLoopBound { .. } => ErrorKind::TypeError,
            RuntimeError::UndefinedName { .. } => ErrorKind::UndefinedNameError,
            RuntimeError::UndefinedFunction { .. } => ErrorKind::UndefinedFunctionError,
            RuntimeError::ArityMismatch { .. } => ErrorKind::ArityMismatchError,
            RuntimeError::ReturnOutsideFunction { .. } => ErrorKind::ReturnOutsideFunctionError,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            RuntimeError::DivisionByZero { .. } => "E001",
            RuntimeError::InvalidOperand { .. } | RuntimeError::InvalidOperands { .. } => "E002",
            RuntimeError::InvalidLoopBound { .. } => "E003",
            RuntimeError::UndefinedName { .. }
            | RuntimeError::UndefinedFunction { .. }
            | RuntimeError::ArityMismatch { .. }
            | RuntimeError::ReturnOutsideFunction { .. } => "E004",
        }
    }
}

impl ResourceExceededError {
    pub fn span(&self) -> Span {
        match self {
            ResourceExceededError::StackOverflow { span, .. }
            | ResourceExceededError::IterationLimit { span, .. } => *span,
        }
    }
}

impl ExecutionError {
    pub fn span(&self) -> Span {
        match &self.kind {
            ExecutionErrorKind::Runtime(err) => err.span(),
            ExecutionErrorKind::ResourceExceeded(err) => err.span(),
        }
    }

    /// Record that the error unwound out of a call to `name` made at `span`.
    pub fn in_call(mut self, name: &str, span: Span) -> Self {
        if self.context.len() < MAX_CALL_CONTEXT {
            self.context.push(Context::InFunctionCall {
                name: name.to_string(),
                span,
            });
        }
        self
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (kind, code, help) = match &self.kind {
            ExecutionErrorKind::Runtime(err) => {
                let help = match err {
                    RuntimeError::DivisionByZero { .. } => {
                        Some("Check the divisor before dividing")
                    }
                    RuntimeError::UndefinedName { .. }
                    | RuntimeError::UndefinedFunction { .. }
                    | RuntimeError::ArityMismatch { .. }
                    | RuntimeError::ReturnOutsideFunction { .. } => {
                        Some("Resolve the program before executing it")
                    }
                    _ => None,
                };
                (err.error_kind(), err.code(), help)
            }
            ExecutionErrorKind::ResourceExceeded(err) => {
                let help = match err {
                    ResourceExceededError::StackOverflow { .. } => {
                        "Check the recursion's base case or raise the depth limit"
                    }
                    ResourceExceededError::IterationLimit { .. } => {
                        "Check the loop's exit condition or raise the iteration limit"
                    }
                };
                (ErrorKind::ResourceExceeded, "E005", Some(help))
            }
        };

        let mut diagnostic = Diagnostic::new(kind, self.kind.to_string(), Some(self.span()))
            .with_code(code)
            .with_related(self.context.iter().map(|ctx| ctx.to_related_info()));
        diagnostic.phase = Phase::Execute;
        if let Some(help) = help {
            diagnostic = diagnostic.with_help(help);
        }
        diagnostic
    }
}

impl From<RuntimeError> for ExecutionError {
    fn from(err: RuntimeError) -> Self {
        Self {
            kind: ExecutionErrorKind::Runtime(err),
            context: Vec::new(),
        }
    }
}

impl From<ResourceExceededError> for ExecutionError {
    fn from(err: ResourceExceededError) -> Self {
        Self {
            kind: ExecutionErrorKind::ResourceExceeded(err),
            context: Vec::new(),
        }
    }
}

impl From<ExecutionError> for Diagnostic {
    fn from(err: ExecutionError) -> Self {
        err.to_diagnostic()
    }
}

//! The diagnostic shape every phase reports through.
//!
//! Each phase keeps its own error type; at the API boundary they are all
//! converted into a [`Diagnostic`] so a host can report any failure the same
//! way regardless of where it came from.

use core::fmt;

use crate::syntax::Span;

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Lex,
    Parse,
    Resolve,
    Execute,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lex => write!(f, "lex"),
            Phase::Parse => write!(f, "parse"),
            Phase::Resolve => write!(f, "resolve"),
            Phase::Execute => write!(f, "execute"),
        }
    }
}

/// Error taxonomy shared by all phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    LexError,
    ParseError,
    UndefinedNameError,
    UndefinedFunctionError,
    ArityMismatchError,
    ReturnOutsideFunctionError,
    DuplicateFunctionError,
    DivisionByZeroError,
    TypeError,
    /// A configured execution limit was hit (see `ExecutionOptions`).
    ResourceExceeded,
}

impl ErrorKind {
    pub fn phase(self) -> Phase {
        use ErrorKind::*;
        match self {
            LexError => Phase::Lex,
            ParseError => Phase::Parse,
            UndefinedNameError
            | UndefinedFunctionError
            | ArityMismatchError
            | ReturnOutsideFunctionError
            | DuplicateFunctionError => Phase::Resolve,
            DivisionByZeroError | TypeError | ResourceExceeded => Phase::Execute,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A located failure from any phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub kind: ErrorKind,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue, when there is one.
    pub span: Option<Span>,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,

    /// Stable error code (e.g. "P001") for documentation lookup.
    pub code: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            phase: kind.phase(),
            kind,
            message: message.into(),
            span,
            related: Vec::new(),
            help: None,
            code: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_related(mut self, related: impl IntoIterator<Item = RelatedInfo>) -> Self {
        self.related.extend(related);
        self
    }

    /// 1-based `(line, column)` of the primary span.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.span.map(|span| (span.line, span.column))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error", self.phase)?;
        if let Some(code) = &self.code {
            write!(f, "[{}]", code)?;
        }
        if let Some(span) = &self.span {
            write!(f, " at {}", span)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(help) = &self.help {
            write!(f, "\nhelp: {}", help)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Related information for a diagnostic (e.g. "defined here", "in call to").
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    pub span: Span,
    pub message: String,
}

use crate::api::RelatedInfo;
use crate::syntax::Span;

/// Context information for error messages.
///
/// Each entry becomes a secondary label on the rendered diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// Evaluation was inside a call to this function.
    InFunctionCall { name: String, span: Span },
    /// Where something was defined.
    DefinedHere { what: String, span: Span },
    /// Where a name was declared.
    DeclaredHere { name: String, span: Span },
    /// Where an unterminated block started.
    OpenedHere { what: String, span: Span },
    /// Where a name is used.
    UsedHere { name: String, span: Span },
}

impl Context {
    /// Convert to a RelatedInfo for diagnostic display
    pub fn to_related_info(&self) -> RelatedInfo {
        match self {
            Context::InFunctionCall { name, span } => RelatedInfo {
                span: *span,
                message: format!("in call to function '{}'", name),
            },
            Context::DefinedHere { what, span } => RelatedInfo {
                span: *span,
                message: format!("{} defined here", what),
            },
            Context::DeclaredHere { name, span } => RelatedInfo {
                span: *span,
                message: format!("'{}' declared here", name),
            },
            Context::OpenedHere { what, span } => RelatedInfo {
                span: *span,
                message: format!("{} opened here", what),
            },
            Context::UsedHere { name, span } => RelatedInfo {
                span: *span,
                message: format!("'{}' used here", name),
            },
        }
    }
}

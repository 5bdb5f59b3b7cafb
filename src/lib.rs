//! Quill - a small imperative scripting language
//!
//! # Overview
//!
//! Quill programs are sequences of English-like statements:
//!
//! ```text
//! define function factorial with n as
//!     if n <= 1 then
//!         return 1
//!     end
//!     return n * factorial(n - 1)
//! end
//! factorial(5)
//! ```
//!
//! Source text goes through four phases: lexing, parsing, name resolution and
//! tree-walking execution. Any phase can fail with a [`Diagnostic`] that
//! carries the phase, a kind, a message and the source position.
//!
//! # Quick Start
//!
//! ```
//! use quill::{Engine, EngineOptions, Value};
//!
//! let engine = Engine::new(EngineOptions::default());
//! let outcome = engine.run("let a be 1 + 2 * 3\na").unwrap();
//! assert_eq!(outcome.value, Value::Int(7));
//! ```
//!
//! # Rendering errors
//!
//! ```
//! use quill::{Engine, render_error_to_string_no_color};
//!
//! let source = "let x be 1 / 0";
//! let err = Engine::default().run(source).unwrap_err();
//! let report = render_error_to_string_no_color(source, &err);
//! assert!(report.contains("Division by zero"));
//! ```

// Re-export public API from quill_core
pub use quill_core::api::{
    CompilationOptions, Diagnostic, Engine, EngineOptions, ErrorKind, ExecutionOptions, Outcome,
    Phase, RelatedInfo,
};

pub use quill_core::ast::{self, Program};
pub use quill_core::evaluator::{self, Environment};
pub use quill_core::values::{self, Value};
pub use quill_core::{lexer, parser, resolver};

pub mod error_renderer;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};

//! Public API for the Quill language.
//!
//! The [`Engine`] runs the whole pipeline (lex, parse, resolve, execute) and
//! reports any failure as a [`Diagnostic`]. Each stage is also available on
//! its own from its module.
//!
//! # Example
//!
//! ```
//! use quill_core::api::{Engine, EngineOptions};
//! use quill_core::evaluator::Environment;
//! use quill_core::values::Value;
//!
//! let engine = Engine::new(EngineOptions::default());
//!
//! let outcome = engine.run("let a be 1 + 2 * 3\na").unwrap();
//! assert_eq!(outcome.value, Value::Int(7));
//!
//! // Keep definitions alive across runs.
//! let mut env = Environment::new();
//! engine.run_in("let x be 20", &mut env).unwrap();
//! assert_eq!(engine.run_in("x + 1", &mut env).unwrap().value, Value::Int(21));
//! ```

pub mod engine;
pub mod error;
pub mod options;

pub use engine::{Engine, Outcome};
pub use error::{Diagnostic, ErrorKind, Phase, RelatedInfo};
pub use options::{CompilationOptions, EngineOptions, ExecutionOptions};

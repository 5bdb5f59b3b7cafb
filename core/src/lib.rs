//! Core of the Quill scripting language: lexer, parser, resolver and a
//! tree-walking evaluator, plus the diagnostics they report.

pub mod api;
pub mod ast;
pub mod diagnostics;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod scope_stack;
pub mod syntax;
pub mod values;

pub use api::{Diagnostic, Engine, EngineOptions, ErrorKind, ExecutionOptions, Outcome, Phase};
pub use ast::Program;
pub use evaluator::{Environment, execute, execute_in};
pub use lexer::tokenize;
pub use parser::{parse, parse_program};
pub use resolver::{Resolver, resolve};
pub use values::Value;

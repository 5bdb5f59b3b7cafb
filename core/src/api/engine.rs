//! The Quill pipeline engine.

use tracing::debug;

use super::{Diagnostic, EngineOptions};
use crate::ast::Program;
use crate::evaluator::{self, Environment};
use crate::lexer::tokenize;
use crate::parser::parse_with_max_depth;
use crate::resolver::Resolver;
use crate::values::Value;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Value of the last top-level expression statement, or `Unit`.
    pub value: Value,
}

/// The Quill compilation and execution engine.
///
/// The engine only holds configuration; all program state lives in the
/// [`Environment`] a run executes against.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Lex, parse and resolve `source` against an empty global scope.
    pub fn compile(&self, source: &str) -> Result<Program, Diagnostic> {
        self.compile_with(source, Resolver::new())
    }

    /// Lex, parse and resolve `source` against the globals and functions
    /// already defined in `env`.
    pub fn compile_in(&self, source: &str, env: &Environment) -> Result<Program, Diagnostic> {
        self.compile_with(source, Resolver::with_environment(env))
    }

    fn compile_with(&self, source: &str, resolver: Resolver) -> Result<Program, Diagnostic> {
        let tokens = tokenize(source)?;
        let max_depth = self.options.default_compilation_options.max_nesting_depth;
        let program = parse_with_max_depth(&tokens, max_depth)?;
        resolver.resolve(&program)?;
        debug!(statements = program.statements.len(), "compiled program");
        Ok(program)
    }

    /// Compile and execute `source` in a fresh environment.
    pub fn run(&self, source: &str) -> Result<Outcome, Diagnostic> {
        self.run_in(source, &mut Environment::new())
    }

    /// Compile and execute `source` in `env`.
    ///
    /// When execution fails, `env` keeps whatever the program defined before
    /// the failure.
    pub fn run_in(&self, source: &str, env: &mut Environment) -> Result<Outcome, Diagnostic> {
        let program = self.compile_in(source, env)?;
        let value =
            evaluator::execute_in(&program, env, &self.options.default_execution_options)?;
        Ok(Outcome { value })
    }
}

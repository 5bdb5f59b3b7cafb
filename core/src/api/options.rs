//! Configuration options for the Quill engine.

use crate::parser::DEFAULT_MAX_DEPTH;

/// Configuration options for compilation (lexing, parsing and resolution).
///
/// # Example
///
/// ```
/// use quill_core::api::CompilationOptions;
///
/// let options = CompilationOptions { max_nesting_depth: 64 };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptions {
    /// Maximum nesting of blocks and sub-expressions the parser accepts.
    ///
    /// Default: 100
    pub max_nesting_depth: usize,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration options for program execution.
///
/// Both limits are off by default: deep recursion then exhausts the native
/// stack and a loop whose condition never fails never ends. Setting them turns
/// either case into a `ResourceExceeded` diagnostic.
///
/// # Example
///
/// ```
/// use quill_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     max_depth: Some(500),
///     max_iterations: Some(10_000),
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Maximum number of nested function calls.
    ///
    /// Default: None
    pub max_depth: Option<usize>,

    /// Maximum number of `while`/`for` iterations in one run, counted across
    /// all loops.
    ///
    /// Default: None
    pub max_iterations: Option<usize>,
}

/// Configuration options for the Quill engine.
///
/// # Example
///
/// ```
/// use quill_core::api::{EngineOptions, CompilationOptions, ExecutionOptions};
///
/// let options = EngineOptions {
///     default_compilation_options: CompilationOptions::default(),
///     default_execution_options: ExecutionOptions {
///         max_depth: Some(500),
///         max_iterations: Some(10_000),
///     },
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub default_compilation_options: CompilationOptions,
    pub default_execution_options: ExecutionOptions,
}

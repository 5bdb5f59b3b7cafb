//! Tree-walking evaluator for resolved programs.
//!
//! Statements run against a global [`Environment`] plus a stack of block
//! scopes. Each function call gets a fresh frame linked only to the globals:
//! functions are not closures and never see their caller's locals.
//!
//! ## Example
//!
//! ```
//! use quill_core::{evaluator, parser, values::Value};
//!
//! let program = parser::parse_program("let a be 1 + 2 * 3\na").unwrap();
//! assert_eq!(evaluator::execute(&program).unwrap(), Value::Int(7));
//! ```

mod environment;
mod error;
mod eval;
mod operators;

#[cfg(test)]
mod eval_test;

pub use environment::Environment;
pub use error::{ExecutionError, ExecutionErrorKind, ResourceExceededError, RuntimeError};

use tracing::debug;

use crate::api::ExecutionOptions;
use crate::ast::Program;
use crate::values::Value;

/// Execute a program against a fresh global environment with no limits.
pub fn execute(program: &Program) -> Result<Value, ExecutionError> {
    execute_in(program, &mut Environment::new(), &ExecutionOptions::default())
}

/// Execute a program against `env`, which keeps every global and function the
/// program defines, even when execution fails part way.
pub fn execute_in(
    program: &Program,
    env: &mut Environment,
    options: &ExecutionOptions,
) -> Result<Value, ExecutionError> {
    let result = eval::Evaluator::new(env, options.clone()).run(program);
    match &result {
        Ok(value) => debug!(%value, "execution finished"),
        Err(err) => debug!(error = %err, "execution failed"),
    }
    result
}

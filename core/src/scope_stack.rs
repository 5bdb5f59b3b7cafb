//! Generic scope stack for block-structured bindings.
//!
//! Used by both the resolver (binds declaration sites) and the evaluator
//! (binds values). Each `if`/`else`/`while` body, `for` loop and function call
//! pushes a scope; lookups search from the innermost scope outwards.
//!
//! Global bindings are not kept here: both users consult their global table
//! once the stack has been searched.

use core::fmt;

use hashbrown::HashMap;
use thiserror::Error;

/// One level of bindings.
pub type Scope<T> = HashMap<String, T>;

/// A stack of scopes for variable lookup.
pub struct ScopeStack<T> {
    scopes: Vec<Scope<T>>,
}

impl<T> ScopeStack<T> {
    /// Create a new empty scope stack.
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Create a stack holding one pre-populated scope (e.g. call parameters).
    pub fn with_scope(scope: Scope<T>) -> Self {
        Self {
            scopes: vec![scope],
        }
    }

    /// Push an empty scope onto the stack.
    pub fn push(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Pop the topmost scope from the stack.
    pub fn pop(&mut self) -> Option<Scope<T>> {
        self.scopes.pop()
    }

    /// Look up a name, searching scopes from innermost to outermost.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Bind a value in the topmost scope, replacing any earlier binding of
    /// the same name in that scope.
    pub fn declare(&mut self, name: &str, value: T) -> Result<(), BindError> {
        self.scopes
            .last_mut()
            .ok_or(BindError::NoScope)?
            .insert(name.to_string(), value);
        Ok(())
    }

    /// Rebind the innermost existing binding of `name`. Never creates one.
    pub fn assign(&mut self, name: &str, value: T) -> Result<(), BindError> {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
        {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(BindError::NameNotDeclared(name.to_string())),
        }
    }
}

impl<T> Default for ScopeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ScopeStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.scopes.iter()).finish()
    }
}

/// Error when trying to bind a value in a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// No scope exists to bind in.
    #[error("No scope to bind in")]
    NoScope,
    /// No scope on the stack binds the name.
    #[error("Name '{0}' not declared in any scope")]
    NameNotDeclared(String),
}

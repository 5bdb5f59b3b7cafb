use std::rc::Rc;

use hashbrown::HashMap;

use crate::ast::FunctionDef;
use crate::values::Value;

/// The global environment: top-level variables and every registered
/// function.
///
/// A fresh one is created for each run unless the host supplies its own; the
/// REPL keeps one alive across inputs so later lines see earlier definitions.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    globals: HashMap<String, Value>,
    functions: HashMap<String, Rc<FunctionDef>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a global variable.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    pub fn function(&self, name: &str) -> Option<&Rc<FunctionDef>> {
        self.functions.get(name)
    }

    pub fn globals(&self) -> &HashMap<String, Value> {
        &self.globals
    }

    pub fn functions(&self) -> &HashMap<String, Rc<FunctionDef>> {
        &self.functions
    }

    /// Bind a global, replacing any previous binding of the same name.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Rebind an existing global. Returns false when there is none.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.globals.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Register (or replace) a function under its own name.
    pub fn register_function(&mut self, def: Rc<FunctionDef>) {
        self.functions.insert(def.name.name.clone(), def);
    }
}

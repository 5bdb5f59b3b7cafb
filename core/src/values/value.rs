use core::fmt;

use crate::ast::Literal;

/// Runtime value. Values are immutable; assignment rebinds names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Result of a bare `return`, of falling off the end of a function, and
    /// of a program whose last statement is not an expression.
    Unit,
}

impl Value {
    /// Truthiness: `0`, `0.0` and `false` are falsy, everything else
    /// (including `Unit`) is truthy.
    pub fn is_truthy(&self) -> bool {
        match *self {
            Value::Int(n) => n != 0,
            Value::Float(x) => x != 0.0,
            Value::Bool(b) => b,
            Value::Unit => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Bool(_) => "Boolean",
            Value::Unit => "Unit",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(n) => Some(n as f64),
            Value::Float(x) => Some(x),
            Value::Bool(_) | Value::Unit => None,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Self {
        match *literal {
            Literal::Int(n) => Value::Int(n),
            Literal::Float(x) => Value::Float(x),
            Literal::Bool(b) => Value::Bool(b),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Value::Int(n) => write!(f, "{}", n),
            // Whole floats keep a fractional digit so they never read as integers.
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Unit => write!(f, "()"),
        }
    }
}

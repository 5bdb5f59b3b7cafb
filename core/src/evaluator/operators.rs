//! Binary and unary operator implementations.
//!
//! `and`/`or` short-circuit and are handled by the evaluator before it gets
//! here; every other operator sees both operands already evaluated.

use core::cmp::Ordering;

use crate::evaluator::RuntimeError;
use crate::syntax::{BinaryOp, Span, UnaryOp};
use crate::values::Value;

pub(super) fn eval_unary(op: UnaryOp, operand: Value, span: Span) -> Result<Value, RuntimeError> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, other) => Err(RuntimeError::InvalidOperand {
            op: op.to_string(),
            operand: other.type_name(),
            span,
        }),
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
    }
}

/// Evaluate a non-short-circuiting binary operator.
pub(super) fn eval_binary(
    op: BinaryOp,
    left: Value,
    right: Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    let invalid = || RuntimeError::InvalidOperands {
        op: op.to_string(),
        left: left.type_name(),
        right: right.type_name(),
        span,
    };

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            match (left, right) {
                (Value::Int(a), Value::Int(b)) => eval_binary_int(op, a, b, span),
                _ => match (left.as_f64(), right.as_f64()) {
                    (Some(a), Some(b)) => eval_binary_float(op, a, b, span).map(Value::Float),
                    _ => Err(invalid()),
                },
            }
        }
        BinaryOp::Eq => values_equal(left, right).map(Value::Bool).ok_or_else(invalid),
        BinaryOp::Neq => values_equal(left, right)
            .map(|equal| Value::Bool(!equal))
            .ok_or_else(invalid),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            let ordering = compare_numbers(left, right).ok_or_else(invalid)?;
            let result = match op {
                BinaryOp::Lt => ordering == Some(Ordering::Less),
                BinaryOp::Gt => ordering == Some(Ordering::Greater),
                BinaryOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Value::Bool(result))
        }
        // `and`/`or` short-circuit in `Evaluator::eval` and never get here.
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operator {}", op),
    }
}

/// Integer arithmetic. `+ - *` wrap on overflow; `/` is true division and
/// yields a Float.
fn eval_binary_int(op: BinaryOp, left: i64, right: i64, span: Span) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => Ok(Value::Int(left.wrapping_add(right))),
        BinaryOp::Sub => Ok(Value::Int(left.wrapping_sub(right))),
        BinaryOp::Mul => Ok(Value::Int(left.wrapping_mul(right))),
        _ => eval_binary_float(op, left as f64, right as f64, span).map(Value::Float),
    }
}

/// Float arithmetic. Division by exactly zero is an error rather than
/// producing inf/NaN.
fn eval_binary_float(op: BinaryOp, left: f64, right: f64, span: Span) -> Result<f64, RuntimeError> {
    match op {
        BinaryOp::Add => Ok(left + right),
        BinaryOp::Sub => Ok(left - right),
        BinaryOp::Mul => Ok(left * right),
        _ if right == 0.0 => Err(RuntimeError::DivisionByZero { span }),
        _ => Ok(left / right),
    }
}

/// `None` when the pair cannot be compared for equality.
fn values_equal(left: Value, right: Value) -> Option<bool> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a == b),
        (Value::Bool(a), Value::Bool(b)) => Some(a == b),
        (Value::Unit, Value::Unit) => Some(true),
        _ => Some(left.as_f64()? == right.as_f64()?),
    }
}

/// Outer `None`: not two numbers. Inner `None`: unordered (NaN).
fn compare_numbers(left: Value, right: Value) -> Option<Option<Ordering>> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(Some(a.cmp(&b))),
        _ => Some(left.as_f64()?.partial_cmp(&right.as_f64()?)),
    }
}

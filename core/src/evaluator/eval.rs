use std::rc::Rc;

use tracing::trace;

use crate::api::ExecutionOptions;
use crate::ast::{Expr, ExprKind, ForStmt, Ident, IfStmt, Program, Stmt};
use crate::evaluator::operators::{eval_binary, eval_unary};
use crate::evaluator::{Environment, ExecutionError, ResourceExceededError, RuntimeError};
use crate::scope_stack::{Scope, ScopeStack};
use crate::syntax::{BinaryOp, Span};
use crate::values::Value;

/// How a statement finished.
///
/// `return` is not an error: it travels up through statement execution as an
/// ordinary value until the enclosing call consumes it.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Normal,
    Return { value: Value, span: Span },
}

pub(super) struct Evaluator<'env> {
    env: &'env mut Environment,
    /// Block scopes of the running function, or of the top level. Empty at
    /// the top level outside any block, where declarations become globals.
    scopes: ScopeStack<Value>,
    depth: usize,
    iterations: usize,
    options: ExecutionOptions,
}

impl<'env> Evaluator<'env> {
    pub(super) fn new(env: &'env mut Environment, options: ExecutionOptions) -> Self {
        Self {
            env,
            scopes: ScopeStack::new(),
            depth: 0,
            iterations: 0,
            options,
        }
    }

    /// Run a whole program. Its value is that of the last top-level statement
    /// when that is an expression statement, `Unit` otherwise.
    pub(super) fn run(&mut self, program: &Program) -> Result<Value, ExecutionError> {
        for def in program.function_defs() {
            self.env.register_function(Rc::clone(def));
        }

        let mut value = Value::Unit;
        for stmt in &program.statements {
            value = match stmt {
                Stmt::Expr(expr) => self.eval(expr)?,
                _ => match self.exec(stmt)? {
                    Flow::Normal => Value::Unit,
                    Flow::Return { span, .. } => {
                        return Err(RuntimeError::ReturnOutsideFunction { span }.into());
                    }
                },
            };
        }
        Ok(value)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, ExecutionError> {
        match stmt {
            Stmt::VarDecl { name, init } => {
                let value = self.eval(init)?;
                self.declare(&name.name, value);
                Ok(Flow::Normal)
            }
            Stmt::Assign { name, value } => {
                let value = self.eval(value)?;
                self.assign(name, value)?;
                Ok(Flow::Normal)
            }
            Stmt::If(if_stmt) => self.exec_if(if_stmt),
            Stmt::While { condition, body } => {
                while self.eval(condition)?.is_truthy() {
                    self.tick(condition.span)?;
                    if let flow @ Flow::Return { .. } = self.exec_block(body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::For(for_stmt) => self.exec_for(for_stmt),
            Stmt::FuncDef(def) => {
                self.env.register_function(Rc::clone(def));
                Ok(Flow::Normal)
            }
            Stmt::Return { span, value } => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Unit,
                };
                Ok(Flow::Return { value, span: *span })
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
        }
    }

    fn exec_statements(&mut self, statements: &[Stmt]) -> Result<Flow, ExecutionError> {
        for stmt in statements {
            if let flow @ Flow::Return { .. } = self.exec(stmt)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_block(&mut self, statements: &[Stmt]) -> Result<Flow, ExecutionError> {
        self.scopes.push();
        let result = self.exec_statements(statements);
        self.scopes.pop();
        result
    }

    fn exec_if(&mut self, if_stmt: &IfStmt) -> Result<Flow, ExecutionError> {
        for (condition, body) in if_stmt.arms() {
            if self.eval(condition)?.is_truthy() {
                return self.exec_block(body);
            }
        }
        match if_stmt.else_block() {
            Some(body) => self.exec_block(body),
            None => Ok(Flow::Normal),
        }
    }

    fn exec_for(&mut self, for_stmt: &ForStmt) -> Result<Flow, ExecutionError> {
        let start = self.eval(&for_stmt.start)?;
        let end = self.eval(&for_stmt.end)?;
        let step = match &for_stmt.step {
            Some(step) => (self.eval(step)?, step.span),
            None => (Value::Int(1), for_stmt.variable.span),
        };
        let mut counter = Counter::new(
            (start, for_stmt.start.span),
            (end, for_stmt.end.span),
            step,
        )?;
        trace!(variable = %for_stmt.variable.name, %start, %end, step = %step.0, "for loop");

        self.scopes.push();
        let result = self.run_for(&mut counter, for_stmt);
        self.scopes.pop();
        result
    }

    fn run_for(&mut self, counter: &mut Counter, for_stmt: &ForStmt) -> Result<Flow, ExecutionError> {
        while let Some(value) = counter.next() {
            self.tick(for_stmt.variable.span)?;
            self.declare(&for_stmt.variable.name, value);
            if let flow @ Flow::Return { .. } = self.exec_block(&for_stmt.body)? {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Count one loop iteration against `max_iterations`.
    fn tick(&mut self, span: Span) -> Result<(), ExecutionError> {
        self.iterations += 1;
        match self.options.max_iterations {
            Some(max_iterations) if self.iterations > max_iterations => {
                Err(ResourceExceededError::IterationLimit {
                    max_iterations,
                    span,
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    fn declare(&mut self, name: &str, value: Value) {
        if self.scopes.declare(name, value).is_err() {
            // No open scope: this is a top-level declaration.
            self.env.define(name, value);
        }
    }

    fn assign(&mut self, name: &Ident, value: Value) -> Result<(), ExecutionError> {
        if self.scopes.assign(&name.name, value).is_ok() || self.env.assign(&name.name, value) {
            return Ok(());
        }
        Err(RuntimeError::UndefinedName {
            name: name.name.clone(),
            span: name.span,
        }
        .into())
    }

    fn lookup(&self, name: &str, span: Span) -> Result<Value, ExecutionError> {
        match self.scopes.lookup(name).copied().or_else(|| self.env.get(name)) {
            Some(value) => Ok(value),
            None => Err(RuntimeError::UndefinedName {
                name: name.to_string(),
                span,
            }
            .into()),
        }
    }

    pub(super) fn eval(&mut self, expr: &Expr) -> Result<Value, ExecutionError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(Value::from(literal)),
            ExprKind::Identifier(name) => self.lookup(name, expr.span),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                Ok(eval_unary(*op, value, expr.span)?)
            }
            ExprKind::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    self.eval(right)
                } else {
                    Ok(left)
                }
            }
            ExprKind::Binary {
                op: BinaryOp::Or,
                left,
                right,
            } => {
                let left = self.eval(left)?;
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(eval_binary(*op, left, right, expr.span)?)
            }
            ExprKind::Grouping(inner) => self.eval(inner),
            ExprKind::Call { callee, args } => self.call(callee, args, expr.span),
        }
    }

    /// Call a user function. The callee runs in a fresh frame that sees only
    /// its parameters, its own locals and the globals.
    fn call(&mut self, callee: &Ident, args: &[Expr], span: Span) -> Result<Value, ExecutionError> {
        let Some(def) = self.env.function(&callee.name).cloned() else {
            return Err(RuntimeError::UndefinedFunction {
                name: callee.name.clone(),
                span: callee.span,
            }
            .into());
        };
        if def.arity() != args.len() {
            return Err(RuntimeError::ArityMismatch {
                function: callee.name.clone(),
                expected: def.arity(),
                found: args.len(),
                span,
            }
            .into());
        }

        let mut frame = Scope::new();
        for (param, arg) in def.params.iter().zip(args) {
            let value = self.eval(arg)?;
            frame.insert(param.name.clone(), value);
        }

        if let Some(max_depth) = self.options.max_depth {
            if self.depth >= max_depth {
                return Err(ResourceExceededError::StackOverflow {
                    depth: self.depth + 1,
                    max_depth,
                    span,
                }
                .into());
            }
        }

        trace!(function = %callee.name, depth = self.depth + 1, "call");
        let caller_scopes = std::mem::replace(&mut self.scopes, ScopeStack::with_scope(frame));
        self.depth += 1;
        let result = self.exec_statements(&def.body);
        self.depth -= 1;
        self.scopes = caller_scopes;

        match result {
            Ok(Flow::Return { value, .. }) => {
                trace!(function = %callee.name, %value, "return");
                Ok(value)
            }
            Ok(Flow::Normal) => Ok(Value::Unit),
            Err(err) => Err(err.in_call(&callee.name, span)),
        }
    }
}

/// Iteration state of a `for` loop, fixed when the loop starts.
enum Counter {
    Int {
        current: i64,
        end: i64,
        step: i64,
        exhausted: bool,
    },
    Float {
        current: f64,
        end: f64,
        step: f64,
    },
}

impl Counter {
    fn new(
        (start, start_span): (Value, Span),
        (end, end_span): (Value, Span),
        (step, step_span): (Value, Span),
    ) -> Result<Self, RuntimeError> {
        let number = |value: Value, bound: &'static str, span: Span| {
            value.as_f64().ok_or(RuntimeError::InvalidLoopBound {
                bound,
                found: value.type_name(),
                span,
            })
        };

        if let (Value::Int(current), Value::Int(end), Value::Int(step)) = (start, end, step) {
            return Ok(Counter::Int {
                current,
                end,
                step,
                exhausted: false,
            });
        }
        Ok(Counter::Float {
            current: number(start, "start", start_span)?,
            end: number(end, "end", end_span)?,
            step: number(step, "step", step_span)?,
        })
    }

    /// Value for the next pass, or `None` once `current` has moved past `end`
    /// in the direction of `step`.
    fn next(&mut self) -> Option<Value> {
        match self {
            Counter::Int {
                current,
                end,
                step,
                exhausted,
            } => {
                let in_range = if *step > 0 {
                    *current <= *end
                } else {
                    *current >= *end
                };
                if *exhausted || !in_range {
                    return None;
                }
                let value = *current;
                match current.checked_add(*step) {
                    Some(next) => *current = next,
                    None => *exhausted = true,
                }
                Some(Value::Int(value))
            }
            Counter::Float { current, end, step } => {
                let in_range = if *step > 0.0 {
                    *current <= *end
                } else {
                    *current >= *end
                };
                if !in_range {
                    return None;
                }
                let value = *current;
                *current += *step;
                Some(Value::Float(value))
            }
        }
    }
}

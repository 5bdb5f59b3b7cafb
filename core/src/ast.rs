//! Syntax tree produced by the parser and consumed by the resolver and the
//! evaluator.
//!
//! Every node owns its children. The parser only builds well-formed nodes, so
//! later stages never re-check structure.

use core::fmt;
use std::rc::Rc;

pub use crate::syntax::{BinaryOp, Span, UnaryOp};

/// A whole program: statements in execution order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// Every function definition in the program, at any nesting depth, in
    /// source order.
    pub fn function_defs(&self) -> Vec<&Rc<FunctionDef>> {
        let mut defs = Vec::new();
        collect_function_defs(&self.statements, &mut defs);
        defs
    }
}

fn collect_function_defs<'a>(statements: &'a [Stmt], out: &mut Vec<&'a Rc<FunctionDef>>) {
    for stmt in statements {
        match stmt {
            Stmt::FuncDef(def) => {
                out.push(def);
                collect_function_defs(&def.body, out);
            }
            Stmt::If(if_stmt) => collect_if(if_stmt, out),
            Stmt::While { body, .. } | Stmt::For(ForStmt { body, .. }) => {
                collect_function_defs(body, out)
            }
            Stmt::VarDecl { .. } | Stmt::Assign { .. } | Stmt::Return { .. } | Stmt::Expr(_) => {}
        }
    }
}

fn collect_if<'a>(if_stmt: &'a IfStmt, out: &mut Vec<&'a Rc<FunctionDef>>) {
    for (_, body) in if_stmt.arms() {
        collect_function_defs(body, out);
    }
    if let Some(body) = if_stmt.else_block() {
        collect_function_defs(body, out);
    }
}

/// A name as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name be init`
    VarDecl { name: Ident, init: Expr },
    /// `set name to value`
    Assign { name: Ident, value: Expr },
    If(IfStmt),
    /// `while condition ... end`
    While { condition: Expr, body: Vec<Stmt> },
    For(ForStmt),
    FuncDef(Rc<FunctionDef>),
    /// `return` or `return expr`; `span` covers the keyword.
    Return { span: Span, value: Option<Expr> },
    Expr(Expr),
}

/// `if condition then ... [else ...] end`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Vec<Stmt>,
    pub else_branch: Option<ElseBranch>,
}

impl IfStmt {
    /// `(condition, body)` of this `if` and of every `else if` chained to
    /// it, in source order.
    pub fn arms(&self) -> impl Iterator<Item = (&Expr, &[Stmt])> {
        let mut next = Some(self);
        core::iter::from_fn(move || {
            let current = next?;
            next = match &current.else_branch {
                Some(ElseBranch::If(nested)) => Some(nested.as_ref()),
                _ => None,
            };
            Some((&current.condition, current.then_branch.as_slice()))
        })
    }

    /// The trailing `else` block of the chain, if any.
    pub fn else_block(&self) -> Option<&[Stmt]> {
        let mut current = self;
        loop {
            match &current.else_branch {
                Some(ElseBranch::If(nested)) => current = nested.as_ref(),
                Some(ElseBranch::Block(body)) => return Some(body.as_slice()),
                None => return None,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElseBranch {
    Block(Vec<Stmt>),
    /// `else if ...`: the nested `if` shares the outer `end`.
    If(Box<IfStmt>),
}

/// `for variable from start to end [step step] ... end`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub variable: Ident,
    pub start: Expr,
    pub end: Expr,
    pub step: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// `define function name [with p1, p2, ...] as ... end`
///
/// Parameter names are unique within `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
}

impl FunctionDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Grouping(Box<Expr>),
    Call {
        callee: Ident,
        args: Vec<Expr>,
    },
}

/// Fully parenthesized prefix form, e.g. `(+ 1 (* 2 3))`. Groupings print as
/// their inner expression since the nesting is already explicit.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(Literal::Int(value)) => write!(f, "{}", value),
            ExprKind::Literal(Literal::Float(value)) => write!(f, "{:?}", value),
            ExprKind::Literal(Literal::Bool(value)) => write!(f, "{}", value),
            ExprKind::Identifier(name) => f.write_str(name),
            ExprKind::Unary { op, operand } => write!(f, "({} {})", op, operand),
            ExprKind::Binary { op, left, right } => write!(f, "({} {} {})", op, left, right),
            ExprKind::Grouping(inner) => write!(f, "{}", inner),
            ExprKind::Call { callee, args } => {
                write!(f, "(call {}", callee.name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

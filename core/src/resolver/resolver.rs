//! Static name, arity and `return` placement checks.
//!
//! Resolution runs in three steps over one program:
//!
//! 1. Every `define function` in the program, at any depth, is registered in
//!    a single global function table (duplicates are rejected).
//! 2. Each function body is checked on its own, seeing only its parameters,
//!    its locals and global variables. The globals a function reads, directly
//!    or through the functions it calls, become that function's
//!    requirements.
//! 3. The top level is walked in order. A top-level call is accepted only if
//!    every requirement of the callee has been declared by that point.
//!
//! A program that resolves can therefore never reach an undefined name, an
//! undefined function, an arity mismatch or a stray `return` at run time.

use std::rc::Rc;

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use super::error::{ResolveError, ResolveErrorKind};
use crate::ast::{Expr, ExprKind, FunctionDef, Ident, IfStmt, Program, Stmt};
use crate::diagnostics::context::Context;
use crate::evaluator::Environment;
use crate::scope_stack::ScopeStack;
use crate::syntax::Span;

/// Resolve `program` against an empty global scope.
pub fn resolve(program: Program) -> Result<Program, ResolveError> {
    Resolver::new().resolve(&program)?;
    Ok(program)
}

/// Reusable resolver. Resolution never changes the resolver, so resolving the
/// same program twice gives the same answer.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    globals: HashSet<String>,
    functions: Vec<Rc<FunctionDef>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that treats everything already defined in `env` as
    /// declared before the program starts.
    pub fn with_environment(env: &Environment) -> Self {
        let mut functions: Vec<_> = env.functions().values().cloned().collect();
        functions.sort_by(|a, b| a.name.name.cmp(&b.name.name));
        Self {
            globals: env.globals().keys().cloned().collect(),
            functions,
        }
    }

    pub fn resolve(&self, program: &Program) -> Result<(), ResolveError> {
        let result = Pass::new(self, program).and_then(|mut pass| {
            pass.resolve_functions()?;
            pass.resolve_top_level(&program.statements)?;
            Ok(pass.functions.len())
        });
        match result {
            Ok(functions) => {
                debug!(functions, "resolved program");
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "resolution failed");
                Err(err)
            }
        }
    }
}

struct FunctionInfo {
    def: Rc<FunctionDef>,
    /// Registered by an earlier run; its spans point into other source text.
    inherited: bool,
}

/// Globals a function may read at run time and where each is first read.
type Requirements = Vec<(String, Option<Span>)>;

#[derive(Default)]
struct Uses {
    globals: Requirements,
    callees: Vec<String>,
}

struct Pass {
    functions: HashMap<String, FunctionInfo>,
    /// Globals declared so far by the top-level walk.
    declared: HashSet<String>,
    /// Every name a function body may read as a global.
    visible_globals: HashSet<String>,
    requirements: HashMap<String, Requirements>,
    /// Inherited functions that no longer resolve, and everything calling them.
    broken: HashMap<String, ResolveErrorKind>,
    scopes: ScopeStack<Span>,
    in_function: bool,
    /// Whether reads of unknown globals are errors (false only while
    /// re-checking inherited functions).
    strict: bool,
    uses: Uses,
}

impl Pass {
    fn new(seed: &Resolver, program: &Program) -> Result<Self, ResolveError> {
        let mut functions = HashMap::new();
        for def in &seed.functions {
            functions.insert(
                def.name.name.clone(),
                FunctionInfo {
                    def: Rc::clone(def),
                    inherited: true,
                },
            );
        }

        let mut defined_at: HashMap<&str, Span> = HashMap::new();
        for def in program.function_defs() {
            let name = &def.name.name;
            if let Some(first) = defined_at.get(name.as_str()) {
                return Err(ResolveError::new(
                    ResolveErrorKind::DuplicateFunction { name: name.clone() },
                    def.name.span,
                )
                .with_context(Some(Context::DefinedHere {
                    what: format!("function '{}'", name),
                    span: *first,
                })));
            }
            defined_at.insert(name, def.name.span);
            functions.insert(
                name.clone(),
                FunctionInfo {
                    def: Rc::clone(def),
                    inherited: false,
                },
            );
        }

        let mut visible_globals = seed.globals.clone();
        for stmt in &program.statements {
            if let Stmt::VarDecl { name, .. } = stmt {
                visible_globals.insert(name.name.clone());
            }
        }

        Ok(Self {
            functions,
            declared: seed.globals.clone(),
            visible_globals,
            requirements: HashMap::new(),
            broken: HashMap::new(),
            scopes: ScopeStack::new(),
            in_function: false,
            strict: true,
            uses: Uses::default(),
        })
    }

    fn resolve_functions(&mut self) -> Result<(), ResolveError> {
        // Inherited functions first, then the program's own in source order.
        let mut order: Vec<(Rc<FunctionDef>, bool)> = self
            .functions
            .values()
            .map(|info| (Rc::clone(&info.def), info.inherited))
            .collect();
        order.sort_by(|(a, a_inherited), (b, b_inherited)| {
            b_inherited
                .cmp(a_inherited)
                .then(a.name.span.start.cmp(&b.name.span.start))
                .then(a.name.name.cmp(&b.name.name))
        });

        let mut direct = Vec::with_capacity(order.len());
        for (def, inherited) in order {
            let name = def.name.name.clone();
            match self.resolve_function(&def, inherited) {
                Ok(uses) => direct.push((name, uses)),
                Err(err) if inherited => {
                    debug!(function = %name, error = %err, "inherited function no longer resolves");
                    self.broken.insert(
                        name.clone(),
                        ResolveErrorKind::Stale {
                            function: name,
                            reason: Box::new(err.kind),
                        },
                    );
                }
                Err(err) => return Err(err),
            }
        }

        self.close_requirements(&direct);
        Ok(())
    }

    fn resolve_function(&mut self, def: &FunctionDef, inherited: bool) -> Result<Uses, ResolveError> {
        let params = def
            .params
            .iter()
            .map(|param| (param.name.clone(), param.span))
            .collect();
        self.scopes = ScopeStack::with_scope(params);
        self.in_function = true;
        self.strict = !inherited;
        self.uses = Uses::default();

        let result = self.resolve_statements(&def.body);

        self.in_function = false;
        self.strict = true;
        self.scopes = ScopeStack::new();
        result.map(|()| std::mem::take(&mut self.uses))
    }

    /// Propagate requirements and brokenness along call edges until nothing
    /// changes.
    fn close_requirements(&mut self, direct: &[(String, Uses)]) {
        for (name, uses) in direct {
            self.requirements.insert(name.clone(), uses.globals.clone());
        }

        loop {
            let mut changed = false;
            for (name, uses) in direct {
                for callee in uses.callees.iter().filter(|callee| *callee != name) {
                    if !self.broken.contains_key(name) {
                        if let Some(reason) = self.broken.get(callee).cloned() {
                            self.broken.insert(name.clone(), reason);
                            changed = true;
                        }
                    }

                    let inherited = self.requirements.get(callee).cloned().unwrap_or_default();
                    let entry = self.requirements.entry(name.clone()).or_default();
                    for (global, used_at) in inherited {
                        if !entry.iter().any(|(existing, _)| *existing == global) {
                            entry.push((global, used_at));
                            changed = true;
                        }
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn resolve_top_level(&mut self, statements: &[Stmt]) -> Result<(), ResolveError> {
        self.scopes = ScopeStack::new();
        self.in_function = false;
        self.resolve_statements(statements)
    }

    fn resolve_statements(&mut self, statements: &[Stmt]) -> Result<(), ResolveError> {
        statements
            .iter()
            .try_for_each(|stmt| self.resolve_statement(stmt))
    }

    fn resolve_block(&mut self, statements: &[Stmt]) -> Result<(), ResolveError> {
        self.scopes.push();
        let result = self.resolve_statements(statements);
        self.scopes.pop();
        result
    }

    fn resolve_statement(&mut self, stmt: &Stmt) -> Result<(), ResolveError> {
        match stmt {
            Stmt::VarDecl { name, init } => {
                self.resolve_expr(init)?;
                self.declare(name);
                Ok(())
            }
            Stmt::Assign { name, value } => {
                self.lookup_variable(&name.name, name.span)?;
                self.resolve_expr(value)
            }
            Stmt::If(if_stmt) => self.resolve_if(if_stmt),
            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_block(body)
            }
            Stmt::For(for_stmt) => {
                self.resolve_expr(&for_stmt.start)?;
                self.resolve_expr(&for_stmt.end)?;
                if let Some(step) = &for_stmt.step {
                    self.resolve_expr(step)?;
                }
                self.scopes.push();
                self.declare(&for_stmt.variable);
                let result = self.resolve_block(&for_stmt.body);
                self.scopes.pop();
                result
            }
            // Bodies were checked up front.
            Stmt::FuncDef(_) => Ok(()),
            Stmt::Return { span, value } => {
                if !self.in_function {
                    return Err(ResolveError::new(
                        ResolveErrorKind::ReturnOutsideFunction,
                        *span,
                    ));
                }
                match value {
                    Some(value) => self.resolve_expr(value),
                    None => Ok(()),
                }
            }
            Stmt::Expr(expr) => self.resolve_expr(expr),
        }
    }

    fn resolve_if(&mut self, if_stmt: &IfStmt) -> Result<(), ResolveError> {
        for (condition, body) in if_stmt.arms() {
            self.resolve_expr(condition)?;
            self.resolve_block(body)?;
        }
        match if_stmt.else_block() {
            Some(body) => self.resolve_block(body),
            None => Ok(()),
        }
    }

    fn declare(&mut self, name: &Ident) {
        if self.scopes.declare(&name.name, name.span).is_err() {
            // Only the top level runs without an open scope.
            self.declared.insert(name.name.clone());
        }
    }

    fn lookup_variable(&mut self, name: &str, span: Span) -> Result<(), ResolveError> {
        if self.scopes.lookup(name).is_some() {
            return Ok(());
        }

        if self.in_function {
            if self.visible_globals.contains(name) || !self.strict {
                if !self.uses.globals.iter().any(|(global, _)| global == name) {
                    let used_at = self.strict.then_some(span);
                    self.uses.globals.push((name.to_string(), used_at));
                }
                return Ok(());
            }
        } else if self.declared.contains(name) {
            return Ok(());
        }

        Err(ResolveError::new(
            ResolveErrorKind::UndefinedName {
                name: name.to_string(),
            },
            span,
        ))
    }

    fn resolve_expr(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        match &expr.kind {
            ExprKind::Literal(_) => Ok(()),
            ExprKind::Identifier(name) => self.lookup_variable(name, expr.span),
            ExprKind::Unary { operand, .. } => self.resolve_expr(operand),
            ExprKind::Binary { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }
            ExprKind::Grouping(inner) => self.resolve_expr(inner),
            ExprKind::Call { callee, args } => self.resolve_call(callee, args, expr.span),
        }
    }

    fn resolve_call(&mut self, callee: &Ident, args: &[Expr], span: Span) -> Result<(), ResolveError> {
        let (arity, defined_at) = match self.functions.get(&callee.name) {
            Some(info) => (
                info.def.arity(),
                (!info.inherited).then_some(info.def.name.span),
            ),
            None => {
                return Err(ResolveError::new(
                    ResolveErrorKind::UndefinedFunction {
                        name: callee.name.clone(),
                    },
                    callee.span,
                ));
            }
        };

        if arity != args.len() {
            return Err(ResolveError::new(
                ResolveErrorKind::ArityMismatch {
                    function: callee.name.clone(),
                    expected: arity,
                    found: args.len(),
                },
                span,
            )
            .with_context(defined_at.map(|span| Context::DefinedHere {
                what: format!("function '{}'", callee.name),
                span,
            })));
        }

        for arg in args {
            self.resolve_expr(arg)?;
        }

        if self.in_function {
            if !self.uses.callees.contains(&callee.name) {
                self.uses.callees.push(callee.name.clone());
            }
            Ok(())
        } else {
            self.check_call_site(&callee.name, span)
        }
    }

    /// A top-level call may only reach globals that already exist.
    fn check_call_site(&self, callee: &str, span: Span) -> Result<(), ResolveError> {
        if let Some(reason) = self.broken.get(callee) {
            return Err(ResolveError::new(reason.clone(), span));
        }

        let Some(required) = self.requirements.get(callee) else {
            return Ok(());
        };
        match required
            .iter()
            .find(|(global, _)| !self.declared.contains(global))
        {
            Some((global, used_at)) => Err(ResolveError::new(
                ResolveErrorKind::GlobalNotYetDeclared {
                    name: global.clone(),
                    function: callee.to_string(),
                },
                span,
            )
            .with_context(used_at.map(|span| Context::UsedHere {
                name: global.clone(),
                span,
            }))),
            None => Ok(()),
        }
    }
}

use super::*;
use crate::api::ErrorKind;
use crate::diagnostics::context::Context;
use crate::evaluator::{Environment, execute_in};
use crate::parser::parse_program;
use crate::{api::ExecutionOptions, values::Value};

// Helper to parse and resolve a source string against an empty scope
fn resolve_source(source: &str) -> Result<(), ResolveError> {
    let program = parse_program(source)
        .unwrap_or_else(|e| panic!("Parse error in {:?}: {}", source, e));
    Resolver::new().resolve(&program)
}

fn resolve_err(source: &str) -> ResolveError {
    match resolve_source(source) {
        Ok(()) => panic!("expected a resolution error for {:?}", source),
        Err(err) => err,
    }
}

fn assert_resolves(source: &str) {
    if let Err(err) = resolve_source(source) {
        panic!("expected {:?} to resolve, got {}", source, err);
    }
}

// ============================================================================
// Variables
// ============================================================================

#[test]
fn test_use_before_declaration() {
    let err = resolve_err("set x to 1");
    assert_eq!(
        err.kind,
        ResolveErrorKind::UndefinedName {
            name: "x".to_string()
        }
    );
    assert_eq!(err.error_kind(), ErrorKind::UndefinedNameError);
    assert_eq!((err.span.line, err.span.column), (1, 5));
}

#[test]
fn test_read_before_declaration() {
    let err = resolve_err("let y be x\nlet x be 1");
    assert_eq!(
        err.kind,
        ResolveErrorKind::UndefinedName {
            name: "x".to_string()
        }
    );
}

#[test]
fn test_initializer_sees_previous_binding_only() {
    assert!(resolve_source("let x be x").is_err());
    assert_resolves("let x be 1\nlet x be x + 1");
}

#[test]
fn test_block_declarations_end_with_block() {
    assert_resolves("if true then\n  let a be 1\n  a\nend");
    let err = resolve_err("if true then\n  let a be 1\nend\na");
    assert_eq!(err.span.line, 4);

    assert!(resolve_source("while false\n  let w be 1\nend\nw").is_err());
    assert!(resolve_source("if false then 1 else\n  let e be 1\nend\ne").is_err());
}

#[test]
fn test_for_variable_is_scoped_to_loop() {
    assert_resolves("for i from 1 to 3\n  i\nend");
    let err = resolve_err("for i from 1 to 3\nend\ni");
    assert_eq!(
        err.kind,
        ResolveErrorKind::UndefinedName {
            name: "i".to_string()
        }
    );
}

#[test]
fn test_for_bounds_are_resolved_outside_loop() {
    assert!(resolve_source("for i from 1 to i\nend").is_err());
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_recursive_and_forward_calls_resolve() {
    assert_resolves(
        "define function even with n as\n  if n == 0 then return true end\n  return odd(n - 1)\nend\n\
         define function odd with n as\n  if n == 0 then return false end\n  return even(n - 1)\nend\n\
         even(10)",
    );
}

#[test]
fn test_undefined_function() {
    let err = resolve_err("missing(1)");
    assert_eq!(
        err.kind,
        ResolveErrorKind::UndefinedFunction {
            name: "missing".to_string()
        }
    );
    assert_eq!(err.error_kind(), ErrorKind::UndefinedFunctionError);
}

#[test]
fn test_variable_is_not_callable() {
    let err = resolve_err("let f be 1\nf()");
    assert_eq!(err.error_kind(), ErrorKind::UndefinedFunctionError);
}

#[test]
fn test_function_name_is_not_a_variable() {
    let err = resolve_err("define function f as\nend\nf");
    assert_eq!(err.error_kind(), ErrorKind::UndefinedNameError);
}

#[test]
fn test_arity_mismatch() {
    let err = resolve_err("define function add with a, b as\n  return a + b\nend\nadd(1)");
    assert_eq!(
        err.kind,
        ResolveErrorKind::ArityMismatch {
            function: "add".to_string(),
            expected: 2,
            found: 1,
        }
    );
    assert_eq!(err.to_string(), "Function 'add' expects 2 arguments, found 1 argument at 4:1");

    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.kind, ErrorKind::ArityMismatchError);
    assert_eq!(diagnostic.related.len(), 1);
    assert_eq!(diagnostic.related[0].message, "function 'add' defined here");
    assert_eq!(diagnostic.related[0].span.line, 1);
}

#[test]
fn test_arity_checked_inside_function_bodies() {
    let err = resolve_err("define function f with a as\n  return g(a, a)\nend\ndefine function g with x as\nend");
    assert_eq!(err.error_kind(), ErrorKind::ArityMismatchError);
}

#[test]
fn test_duplicate_function() {
    let err = resolve_err("define function f as\nend\nif true then\n  define function f as\n  end\nend");
    assert_eq!(
        err.kind,
        ResolveErrorKind::DuplicateFunction {
            name: "f".to_string()
        }
    );
    assert_eq!(err.span.line, 4);
    let [Context::DefinedHere { what, span }] = err.context.as_slice() else {
        panic!("expected one 'defined here' context, got {:?}", err.context);
    };
    assert_eq!(what, "function 'f'");
    assert_eq!(span.line, 1);
}

#[test]
fn test_nested_function_definitions_are_global() {
    assert_resolves(
        "define function outer as\n  define function inner as\n    return 1\n  end\n  return inner()\nend\ninner() + outer()",
    );
}

// ============================================================================
// Function scopes
// ============================================================================

#[test]
fn test_function_sees_parameters_and_locals() {
    assert_resolves("define function f with a as\n  let b be a * 2\n  return a + b\nend");
}

#[test]
fn test_function_does_not_see_caller_locals() {
    let err = resolve_err(
        "define function callee as\n  return secret\nend\ndefine function caller as\n  let secret be 1\n  return callee()\nend",
    );
    assert_eq!(
        err.kind,
        ResolveErrorKind::UndefinedName {
            name: "secret".to_string()
        }
    );
    assert_eq!(err.span.line, 2);
}

#[test]
fn test_function_does_not_see_top_level_block_locals() {
    let err = resolve_err("if true then\n  let hidden be 1\nend\ndefine function f as\n  return hidden\nend");
    assert_eq!(err.error_kind(), ErrorKind::UndefinedNameError);
}

#[test]
fn test_function_may_name_globals_declared_later() {
    assert_resolves("define function f as\n  return g\nend\nlet g be 1\nf()");
}

#[test]
fn test_call_before_global_is_declared() {
    let err = resolve_err("define function f as\n  return g\nend\nf()\nlet g be 1");
    assert_eq!(
        err.kind,
        ResolveErrorKind::GlobalNotYetDeclared {
            name: "g".to_string(),
            function: "f".to_string(),
        }
    );
    assert_eq!(err.error_kind(), ErrorKind::UndefinedNameError);
    assert_eq!(err.span.line, 4);

    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.related[0].message, "'g' used here");
    assert_eq!(diagnostic.related[0].span.line, 2);
}

#[test]
fn test_global_requirements_are_transitive() {
    let source = "
        define function outer as
            return middle()
        end
        define function middle as
            return inner()
        end
        define function inner as
            return limit
        end
        outer()
        let limit be 3
    ";
    let err = resolve_err(source);
    assert_eq!(
        err.kind,
        ResolveErrorKind::GlobalNotYetDeclared {
            name: "limit".to_string(),
            function: "outer".to_string(),
        }
    );

    let fixed = source.replace("outer()\n        let limit be 3", "let limit be 3\n        outer()");
    assert_resolves(&fixed);
}

#[test]
fn test_recursive_requirements_terminate() {
    assert_resolves(
        "define function ping with n as\n  if n > 0 then return pong(n - 1) end\n  return base\nend\n\
         define function pong with n as\n  return ping(n)\nend\nlet base be 0\npong(3)",
    );
}

#[test]
fn test_calls_inside_top_level_blocks_are_checked() {
    let err = resolve_err("define function f as\n  return g\nend\nif true then\n  f()\nend\nlet g be 1");
    assert_eq!(err.span.line, 5);
}

// ============================================================================
// Return placement
// ============================================================================

#[test]
fn test_return_outside_function() {
    let err = resolve_err("return (1)");
    assert_eq!(err.kind, ResolveErrorKind::ReturnOutsideFunction);
    assert_eq!(err.error_kind(), ErrorKind::ReturnOutsideFunctionError);

    assert!(resolve_source("if true then\n  return\nend").is_err());
    assert!(resolve_source("while true\n  return 1\nend").is_err());
}

#[test]
fn test_return_inside_nested_blocks_of_function() {
    assert_resolves("define function f as\n  while true\n    if true then\n      return 1\n    end\n  end\nend");
}

#[test]
fn test_return_after_nested_function_definition() {
    let err = resolve_err("define function f as\n  define function g as\n  end\nend\nreturn");
    assert_eq!(err.kind, ResolveErrorKind::ReturnOutsideFunction);
}

// ============================================================================
// Idempotence and free function
// ============================================================================

#[test]
fn test_resolution_is_idempotent() {
    for source in ["set x to 1", "let a be 1\na", "return (1)", "f()"] {
        let program = parse_program(source).unwrap();
        let resolver = Resolver::new();
        let first = resolver.resolve(&program);
        let second = resolver.resolve(&program);
        assert_eq!(first, second, "{}", source);
    }
}

#[test]
fn test_resolve_returns_program_unchanged() {
    let program = parse_program("let a be 1\na").unwrap();
    let resolved = resolve(program.clone()).unwrap();
    assert_eq!(resolved, program);
}

// ============================================================================
// Environments
// ============================================================================

fn run_in(env: &mut Environment, source: &str) -> Result<Value, ResolveError> {
    let program = parse_program(source).unwrap();
    Resolver::with_environment(env).resolve(&program)?;
    Ok(execute_in(&program, env, &ExecutionOptions::default()).expect("execution failed"))
}

#[test]
fn test_environment_globals_and_functions_are_visible() {
    let mut env = Environment::new();
    run_in(&mut env, "let x be 2\ndefine function twice with n as\n  return n * 2\nend").unwrap();

    assert_eq!(run_in(&mut env, "twice(x)").unwrap(), Value::Int(4));
    assert!(run_in(&mut env, "twice()").is_err());
    assert!(run_in(&mut env, "y").is_err());
}

#[test]
fn test_environment_function_may_be_redefined() {
    let mut env = Environment::new();
    run_in(&mut env, "define function f as\n  return 1\nend").unwrap();
    assert_eq!(
        run_in(&mut env, "define function f as\n  return 2\nend\nf()").unwrap(),
        Value::Int(2)
    );
}

#[test]
fn test_inherited_function_missing_global_is_checked_at_call() {
    let mut env = Environment::new();
    // `g` is declared after `f` would need it, and the run stops early: `f`
    // is registered but `g` never is.
    let program = parse_program("define function f as\n  return g\nend\nlet z be 1 / 0\nlet g be 1").unwrap();
    Resolver::with_environment(&env).resolve(&program).unwrap();
    assert!(execute_in(&program, &mut env, &ExecutionOptions::default()).is_err());
    assert!(env.function("f").is_some());
    assert!(env.get("g").is_none());

    let err = run_in(&mut env, "f()").unwrap_err();
    assert_eq!(
        err.kind,
        ResolveErrorKind::GlobalNotYetDeclared {
            name: "g".to_string(),
            function: "f".to_string(),
        }
    );
    // The use site lives in earlier source text, so it is not attached.
    assert!(err.context.is_empty());

    assert_eq!(run_in(&mut env, "let g be 5\nf()").unwrap(), Value::Int(5));
}

#[test]
fn test_inherited_function_broken_by_redefinition() {
    let mut env = Environment::new();
    run_in(
        &mut env,
        "define function f with a as\n  return a\nend\ndefine function g as\n  return f(1)\nend",
    )
    .unwrap();

    // Redefining `f` with a different arity is accepted on its own...
    run_in(&mut env, "define function f with a, b as\n  return a + b\nend").unwrap();

    // ...but `g` can no longer be called.
    let err = run_in(&mut env, "g()").unwrap_err();
    assert!(matches!(err.kind, ResolveErrorKind::Stale { ref function, .. } if function == "g"));
    assert_eq!(err.error_kind(), ErrorKind::ArityMismatchError);
    assert_eq!(err.span.line, 1);
}

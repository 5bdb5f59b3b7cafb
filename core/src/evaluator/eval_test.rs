//! Unit tests for the evaluator.

use super::*;
use crate::{
    api::{ErrorKind, Phase},
    diagnostics::context::Context,
    parser::parse_program,
    resolver::Resolver,
    test_utils::init_test_logging,
};

struct Runner {
    env: Environment,
    options: ExecutionOptions,
}

impl Runner {
    fn new() -> Self {
        Self {
            env: Environment::new(),
            options: ExecutionOptions::default(),
        }
    }

    fn with_limits(max_depth: Option<usize>, max_iterations: Option<usize>) -> Self {
        Self {
            env: Environment::new(),
            options: ExecutionOptions {
                max_depth,
                max_iterations,
            },
        }
    }

    /// Parse, resolve against the runner's environment, then execute.
    fn run(&mut self, input: &str) -> Result<Value, ExecutionError> {
        let program = parse_program(input).expect("parsing failed");
        Resolver::with_environment(&self.env)
            .resolve(&program)
            .expect("resolution failed");
        execute_in(&program, &mut self.env, &self.options)
    }

    /// Execute without resolving first.
    fn run_unresolved(&mut self, input: &str) -> Result<Value, ExecutionError> {
        let program = parse_program(input).expect("parsing failed");
        execute_in(&program, &mut self.env, &self.options)
    }
}

fn run(input: &str) -> Value {
    Runner::new()
        .run(input)
        .unwrap_or_else(|e| panic!("execution failed: {}\n{}", input, e))
}

fn run_err(input: &str) -> ExecutionError {
    match Runner::new().run(input) {
        Ok(value) => panic!("expected an execution error for {:?}, got {}", input, value),
        Err(err) => err,
    }
}

// ============================================================================
// Program value
// ============================================================================

#[test]
fn test_program_value_is_last_expression_statement() {
    assert_eq!(run("1\n2\n3"), Value::Int(3));
    assert_eq!(run("let a be 4\na"), Value::Int(4));
}

#[test]
fn test_program_value_is_unit_otherwise() {
    assert_eq!(run(""), Value::Unit);
    assert_eq!(run("1\nlet a be 2"), Value::Unit);
    assert_eq!(run("let a be 1\nif a then a end"), Value::Unit);
}

// ============================================================================
// Arithmetic and precedence
// ============================================================================

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(run("let a be 1 + 2 * 3\na"), Value::Int(7));
    assert_eq!(run("let a be 10 - 3 - 2\na"), Value::Int(5));
    assert_eq!(run("let b be (1 + 2) * 3\nb"), Value::Int(9));
}

#[test]
fn test_division_yields_float() {
    assert_eq!(run("let q be 4 / 2\nq"), Value::Float(2.0));
    assert_eq!(run("1 / 4"), Value::Float(0.25));
}

#[test]
fn test_mixed_numbers() {
    assert_eq!(run("1 + 0.5"), Value::Float(1.5));
    assert_eq!(run("2 * 1.5 == 3"), Value::Bool(true));
    assert_eq!(run("-2.5"), Value::Float(-2.5));
    assert_eq!(run("- -3"), Value::Int(3));
}

#[test]
fn test_division_by_zero() {
    let err = run_err("let z be 0\n1 / z");
    assert!(matches!(
        err.kind,
        ExecutionErrorKind::Runtime(RuntimeError::DivisionByZero { .. })
    ));
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.kind, ErrorKind::DivisionByZeroError);
    assert_eq!(diagnostic.phase, Phase::Execute);
    assert_eq!(diagnostic.position(), Some((2, 1)));
}

#[test]
fn test_negating_boolean_is_type_error() {
    let err = run_err("-true");
    assert_eq!(err.to_diagnostic().kind, ErrorKind::TypeError);
    assert_eq!(err.to_string(), "Cannot apply '-' to Boolean");
}

// ============================================================================
// Logic
// ============================================================================

#[test]
fn test_and_or_yield_operand_values() {
    assert_eq!(run("0 and 5"), Value::Int(0));
    assert_eq!(run("3 and 5"), Value::Int(5));
    assert_eq!(run("0 or 5"), Value::Int(5));
    assert_eq!(run("3 or 5"), Value::Int(3));
    assert_eq!(run("false or 0.0"), Value::Float(0.0));
}

#[test]
fn test_short_circuit_skips_right_operand() {
    assert_eq!(run("let r be 0 and (1 / 0)\nr"), Value::Int(0));
    assert_eq!(run("let r be 1 or (1 / 0)\nr"), Value::Int(1));
    assert!(Runner::new().run("let r be 1 and (1 / 0)").is_err());
}

#[test]
fn test_not_uses_truthiness() {
    assert_eq!(run("not 0"), Value::Bool(true));
    assert_eq!(run("not 0.0"), Value::Bool(true));
    assert_eq!(run("not 2"), Value::Bool(false));
    assert_eq!(run("not false"), Value::Bool(true));
}

// ============================================================================
// Variables and scopes
// ============================================================================

#[test]
fn test_redeclaration_rebinds() {
    assert_eq!(run("let a be 1\nlet a be a + 1\na"), Value::Int(2));
}

#[test]
fn test_assignment_updates_enclosing_binding() {
    let source = "
        let total be 0
        let i be 1
        while i <= 4
            set total to total + i
            set i to i + 1
        end
        total
    ";
    assert_eq!(run(source), Value::Int(10));
}

#[test]
fn test_block_locals_do_not_become_globals() {
    let mut runner = Runner::new();
    runner
        .run("let flag be true\nif flag then\n  let inner be 1\nend")
        .unwrap();
    assert_eq!(runner.env.get("flag"), Some(Value::Bool(true)));
    assert_eq!(runner.env.get("inner"), None);
}

#[test]
fn test_block_shadowing() {
    let source = "
        let x be 1
        if true then
            let x be 2
            set x to 3
        end
        x
    ";
    assert_eq!(run(source), Value::Int(1));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_if_else_chain() {
    let source = "
        define function grade with score as
            if score >= 90 then return 1
            else if score >= 80 then return 2
            else if score >= 70 then return 3
            else return 4
            end
        end
        grade(95) * 1000 + grade(85) * 100 + grade(75) * 10 + grade(10)
    ";
    assert_eq!(run(source), Value::Int(1234));
}

#[test]
fn test_thousand_branch_else_if_chain() {
    let mut source = String::from("let x be 0\nlet picked be -1\nif x == 1 then set picked to 1\n");
    for i in 2..1000 {
        source.push_str(&format!("else if x == {} then set picked to {}\n", i, i));
    }
    source.push_str("else set picked to 42\nend\npicked");
    assert_eq!(run(&source), Value::Int(42));

    source = source.replacen("let x be 0", "let x be 999", 1);
    assert_eq!(run(&source), Value::Int(999));
}

#[test]
fn test_for_ascending_default_step() {
    let source = "
        let sum be 0
        for i from 1 to 5
            set sum to sum + i
        end
        sum
    ";
    assert_eq!(run(source), Value::Int(15));
}

#[test]
fn test_for_descending_with_step() {
    let source = "
        let seen be 0
        for i from 10 to 1 step -2
            set seen to seen * 100 + i
        end
        seen
    ";
    // 10, 8, 6, 4, 2
    assert_eq!(run(source), Value::Int(1008060402));
}

#[test]
fn test_for_direction_mismatch_runs_zero_times() {
    let source = "
        let count be 0
        for i from 1 to 10 step -1
            set count to count + 1
        end
        count
    ";
    assert_eq!(run(source), Value::Int(0));
}

#[test]
fn test_for_float_counter() {
    let source = "
        let last be 0
        for x from 0 to 1 step 0.25
            set last to x
        end
        last
    ";
    assert_eq!(run(source), Value::Float(1.0));
}

#[test]
fn test_for_variable_is_rebound_each_pass() {
    let source = "
        let passes be 0
        for i from 1 to 3
            set i to 100
            set passes to passes + 1
        end
        passes
    ";
    assert_eq!(run(source), Value::Int(3));
}

#[test]
fn test_for_counter_stops_at_integer_limit() {
    let source = "
        let count be 0
        for i from 9223372036854775806 to 9223372036854775807
            set count to count + 1
        end
        count
    ";
    assert_eq!(run(source), Value::Int(2));
}

#[test]
fn test_for_rejects_boolean_bounds() {
    let err = run_err("for i from true to 3\nend");
    assert!(matches!(
        err.kind,
        ExecutionErrorKind::Runtime(RuntimeError::InvalidLoopBound { bound: "start", .. })
    ));
    assert_eq!(err.to_diagnostic().kind, ErrorKind::TypeError);
}

#[test]
fn test_zero_step_hits_iteration_limit() {
    let mut runner = Runner::with_limits(None, Some(50));
    let err = runner
        .run("for i from 5 to 1 step 0\nend")
        .expect_err("expected the iteration limit");
    assert!(matches!(
        err.kind,
        ExecutionErrorKind::ResourceExceeded(ResourceExceededError::IterationLimit {
            max_iterations: 50,
            ..
        })
    ));
    assert_eq!(err.to_diagnostic().kind, ErrorKind::ResourceExceeded);
}

#[test]
fn test_iteration_limit_counts_all_loops() {
    let mut runner = Runner::with_limits(None, Some(10));
    assert!(runner.run("for i from 1 to 5\nend\nfor j from 1 to 5\nend").is_ok());

    let mut runner = Runner::with_limits(None, Some(9));
    assert!(runner.run("for i from 1 to 5\nend\nfor j from 1 to 5\nend").is_err());
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_recursive_factorial() {
    init_test_logging();
    let source = "
        define function factorial with n as
            if n <= 1 then
                return 1
            end
            return n * factorial(n - 1)
        end
        factorial(5)
    ";
    assert_eq!(run(source), Value::Int(120));
}

#[test]
fn test_forward_call() {
    let source = "
        define function first as
            return second() + 1
        end
        define function second as
            return 41
        end
        first()
    ";
    assert_eq!(run(source), Value::Int(42));
}

#[test]
fn test_call_before_definition_in_source() {
    assert_eq!(
        run("double(21)\ndefine function double with n as\n  return n * 2\nend\n"),
        Value::Unit
    );
    assert_eq!(
        run("let r be double(21)\ndefine function double with n as\n  return n * 2\nend\nr"),
        Value::Int(42)
    );
}

#[test]
fn test_falling_off_the_end_returns_unit() {
    let source = "
        define function nothing with x as
            let y be x
        end
        nothing(1)
    ";
    assert_eq!(run(source), Value::Unit);
}

#[test]
fn test_bare_return_yields_unit() {
    let source = "
        define function early with x as
            if x then
                return
            end
            return 1
        end
        early(true)
    ";
    assert_eq!(run(source), Value::Unit);
}

#[test]
fn test_return_unwinds_loops() {
    let source = "
        define function find_first_multiple with n as
            for i from 1 to 100
                while true
                    if i * n > 20 then
                        return i
                    end
                    set i to i + 100
                end
            end
            return 0
        end
        find_first_multiple(7)
    ";
    // The first pass bumps `i` to 101, which then satisfies the condition.
    assert_eq!(run(source), Value::Int(101));
}

#[test]
fn test_functions_see_globals_not_caller_locals() {
    let source = "
        let base be 10
        define function add_base with x as
            return x + base
        end
        define function caller as
            let base be 1000
            return add_base(1)
        end
        caller()
    ";
    assert_eq!(run(source), Value::Int(11));
}

#[test]
fn test_functions_can_assign_globals() {
    let source = "
        let counter be 0
        define function bump as
            set counter to counter + 1
        end
        bump()
        bump()
        counter
    ";
    assert_eq!(run(source), Value::Int(2));
}

#[test]
fn test_arguments_evaluate_left_to_right_in_caller_scope() {
    let source = "
        let log be 0
        define function note with d as
            set log to log * 10 + d
            return d
        end
        define function pair with a, b as
            return a * 10 + b
        end
        let result be pair(note(1), note(2))
        log * 100 + result
    ";
    assert_eq!(run(source), Value::Int(1212));
}

#[test]
fn test_call_depth_limit() {
    let source = "
        define function down with n as
            return down(n + 1)
        end
        down(0)
    ";
    let err = Runner::with_limits(Some(64), None)
        .run(source)
        .expect_err("expected stack overflow");
    assert!(matches!(
        err.kind,
        ExecutionErrorKind::ResourceExceeded(ResourceExceededError::StackOverflow {
            depth: 65,
            max_depth: 64,
            ..
        })
    ));
    // The unwound calls are recorded innermost first, up to a bound.
    assert!(!err.context.is_empty());
    assert!(err.context.len() <= 8);
}

#[test]
fn test_error_inside_call_records_call_site() {
    let source = "
        define function inverse with x as
            return 1 / x
        end
        inverse(0)
    ";
    let err = run_err(source);
    assert_eq!(err.context.len(), 1);
    let Context::InFunctionCall { name, span } = &err.context[0] else {
        panic!("expected call context, got {:?}", err.context[0]);
    };
    assert_eq!(name, "inverse");
    assert_eq!(span.line, 5);
    assert_eq!(err.to_diagnostic().related[0].message, "in call to function 'inverse'");
}

// ============================================================================
// Environment reuse
// ============================================================================

#[test]
fn test_environment_persists_between_runs() {
    let mut runner = Runner::new();
    runner
        .run("let x be 2\ndefine function sq with n as\n  return n * n\nend")
        .unwrap();
    assert_eq!(runner.run("sq(x) + 1").unwrap(), Value::Int(5));
    assert!(runner.env.function("sq").is_some());
}

#[test]
fn test_host_defined_globals() {
    let mut runner = Runner::new();
    runner.env.define("limit", Value::Int(3));
    assert_eq!(runner.run("limit * 2").unwrap(), Value::Int(6));
}

#[test]
fn test_execute_uses_fresh_environment() {
    let program = parse_program("let a be 1\na").unwrap();
    assert_eq!(execute(&program).unwrap(), Value::Int(1));
    assert_eq!(execute(&program).unwrap(), Value::Int(1));
}

// ============================================================================
// Unresolved programs
// ============================================================================

#[test]
fn test_unresolved_programs_fail_cleanly() {
    let mut runner = Runner::new();

    let err = runner.run_unresolved("missing + 1").unwrap_err();
    let diagnostic = err.to_diagnostic();
    assert_eq!(diagnostic.kind, ErrorKind::UndefinedNameError);
    assert_eq!(diagnostic.phase, Phase::Execute);

    let err = runner.run_unresolved("nope()").unwrap_err();
    assert_eq!(err.to_diagnostic().kind, ErrorKind::UndefinedFunctionError);

    let err = runner
        .run_unresolved("define function f with a as\nend\nf()")
        .unwrap_err();
    assert_eq!(err.to_diagnostic().kind, ErrorKind::ArityMismatchError);

    let err = runner.run_unresolved("return 1").unwrap_err();
    assert_eq!(err.to_diagnostic().kind, ErrorKind::ReturnOutsideFunctionError);
}

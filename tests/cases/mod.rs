#![allow(dead_code)]

use once_cell::sync::Lazy;
use quill::{Diagnostic, Engine, Environment, Value};

/// A complete program and the value it evaluates to.
pub struct Sample {
    pub name: &'static str,
    pub source: &'static str,
    pub value: Value,
}

pub const FACTORIAL: &str = "
define function factorial with n as
    if n <= 1 then
        return 1
    end
    return n * factorial(n - 1)
end
factorial(5)
";

/// Well-formed programs exercising every statement form.
pub static SAMPLES: Lazy<Vec<Sample>> = Lazy::new(|| {
    vec![
        Sample {
            name: "precedence",
            source: "let a be 1 + 2 * 3\na",
            value: Value::Int(7),
        },
        Sample {
            name: "factorial",
            source: FACTORIAL,
            value: Value::Int(120),
        },
        Sample {
            name: "fibonacci_loop",
            source: "
                let a be 0
                let b be 1
                for i from 1 to 10
                    let next be a + b
                    set a to b
                    set b to next
                end
                a
            ",
            value: Value::Int(55),
        },
        Sample {
            name: "collatz_steps",
            source: "
                define function is_even with n as
                    let k be n
                    while k >= 2
                        set k to k - 2
                    end
                    return k == 0
                end
                let n be 6
                let steps be 0
                while n != 1
                    if is_even(n) then
                        set n to n / 2
                    else
                        set n to 3 * n + 1
                    end
                    set steps to steps + 1
                end
                steps
            ",
            value: Value::Int(8),
        },
        Sample {
            name: "countdown_sum",
            source: "
                let total be 0
                for i from 10 to 1 step -2
                    set total to total + i
                end
                total
            ",
            value: Value::Int(30),
        },
        Sample {
            name: "grade",
            source: "
                define function grade with score as
                    if score >= 90 then
                        return 4
                    else if score >= 80 then
                        return 3
                    else
                        return 0
                    end
                end
                grade(85) + grade(95) + grade(10)
            ",
            value: Value::Int(7),
        },
        Sample {
            name: "mutual_recursion",
            source: "
                define function even with n as
                    if n == 0 then
                        return true
                    end
                    return odd(n - 1)
                end
                define function odd with n as
                    if n == 0 then
                        return false
                    end
                    return even(n - 1)
                end
                even(10) and not odd(10)
            ",
            value: Value::Bool(true),
        },
        Sample {
            name: "no_expression_statement",
            source: "let x be 1\nset x to x + 1",
            value: Value::Unit,
        },
    ]
});

pub fn run(source: &str) -> Value {
    Engine::default()
        .run(source)
        .unwrap_or_else(|e| panic!("program failed: {}\n{}", source, e))
        .value
}

pub fn run_err(source: &str) -> Diagnostic {
    match Engine::default().run(source) {
        Ok(outcome) => panic!("expected {:?} to fail, got {}", source, outcome.value),
        Err(err) => err,
    }
}

/// Run each input in turn against one environment, like a REPL session.
pub fn session(inputs: &[&str]) -> Vec<Result<Value, Diagnostic>> {
    let engine = Engine::default();
    let mut env = Environment::new();
    inputs
        .iter()
        .map(|input| engine.run_in(input, &mut env).map(|outcome| outcome.value))
        .collect()
}

/// `test_case!(name, input: "...", value: ...)` checks the program value;
/// `test_case!(name, input: "...", error: Kind, at: (line, column))` checks
/// the diagnostic kind and position.
#[macro_export]
macro_rules! test_case {
    ($name:ident, input: $input:expr, value: $value:expr $(,)?) => {
        #[test]
        fn $name() {
            pretty_assertions::assert_eq!(cases::run($input), $value);
        }
    };
    ($name:ident, input: $input:expr, error: $kind:expr, at: ($line:expr, $column:expr) $(,)?) => {
        #[test]
        fn $name() {
            let err = cases::run_err($input);
            pretty_assertions::assert_eq!(err.kind, $kind, "{}", err);
            pretty_assertions::assert_eq!(err.position(), Some(($line, $column)), "{}", err);
        }
    };
}

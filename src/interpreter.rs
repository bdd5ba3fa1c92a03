use std::collections::HashMap;

use tracing::debug;

use crate::ast::{ClassDef, FunctionDef, Program, Statement};
use crate::console::{InputSource, OutputSink};

mod error;
mod number;
mod runtime;
mod value;

pub use error::{EvalError, EvalResult, RuntimeWarning};
pub use number::Number;
pub use value::{Instance, InstanceRef, RangeValue, Value};

use runtime::{ExecResult, InterpreterRuntime};

/// Each user call nests several evaluator frames on the host stack, so the
/// default keeps a full-depth run inside a 2 MiB thread stack even in debug
/// builds. Deeper limits need a thread with a larger stack.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Nested user calls allowed before the run fails with a recursion error.
    pub max_call_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// AST-walking evaluator.
#[derive(Debug, Default, Clone)]
pub struct Interpreter {
    config: EvalConfig,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Registers every top-level `def` and `class` so that calls may appear
    /// before the definition in source order. A later definition of the
    /// same name replaces an earlier one.
    pub fn prepare<'p>(&self, program: &'p Program) -> PreparedProgram<'p> {
        let mut functions = HashMap::new();
        let mut classes = HashMap::new();
        for statement in &program.statements {
            match statement {
                Statement::FunctionDef(function) => {
                    functions.insert(function.name.as_str(), function);
                }
                Statement::ClassDef(class) => {
                    classes.insert(class.name.as_str(), class);
                }
                _ => {}
            }
        }
        debug!(
            functions = functions.len(),
            classes = classes.len(),
            "prepared program"
        );
        PreparedProgram {
            functions,
            classes,
            statements: &program.statements,
            config: self.config,
        }
    }
}

/// A program with its definition tables built, ready to run any number of
/// times. Each run starts from fresh tables and an empty global frame.
pub struct PreparedProgram<'p> {
    functions: HashMap<&'p str, &'p FunctionDef>,
    classes: HashMap<&'p str, &'p ClassDef>,
    statements: &'p [Statement],
    config: EvalConfig,
}

#[derive(Debug)]
pub struct RunOutcome {
    /// Value of a top-level `return`, otherwise `Value::Unit`.
    pub value: Value,
    pub warnings: Vec<RuntimeWarning>,
}

impl PreparedProgram<'_> {
    pub fn run(
        &self,
        output: &mut dyn OutputSink,
        input: &mut dyn InputSource,
    ) -> Result<RunOutcome, EvalError> {
        // run -> exec_block -> exec_statement -> eval_expression
        // -> call_named / call_method -> invoke_function -> exec_block
        let mut runtime = InterpreterRuntime {
            functions: self.functions.clone(),
            classes: self.classes.clone(),
            globals: HashMap::new(),
            call_stack: Vec::new(),
            output,
            input,
            warnings: Vec::new(),
            max_call_depth: self.config.max_call_depth,
        };
        let value = match runtime.exec_block(self.statements)? {
            ExecResult::Continue => Value::Unit,
            ExecResult::Return(value) => value,
        };
        Ok(RunOutcome {
            value,
            warnings: runtime.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use crate::console::{CapturedOutput, ScriptedInput};
    use indoc::{formatdoc, indoc};
    use pretty_assertions::assert_eq;

    struct Run {
        output: CapturedOutput,
        outcome: RunOutcome,
    }

    fn run_with(source: &str, input: &[&str], config: EvalConfig) -> Result<Run, EvalError> {
        let program = compile(source).expect("compile failed");
        let mut output = CapturedOutput::new();
        let mut input = ScriptedInput::new(input.iter().copied());
        let outcome = Interpreter::with_config(config)
            .prepare(&program)
            .run(&mut output, &mut input)?;
        Ok(Run { output, outcome })
    }

    fn run(source: &str) -> Run {
        run_with(source, &[], EvalConfig::default()).expect("run failed")
    }

    fn output_of(source: &str) -> String {
        run(source).output.text()
    }

    #[test]
    fn evaluates_assignment_and_print() {
        let output = output_of(indoc! {"
            x = 5
            y = x * 2 + 1
            print(y)
        "});
        assert_eq!(output, "11");
    }

    #[test]
    fn print_joins_arguments_with_spaces() {
        let output = output_of(indoc! {r#"
            print("a", 1, 2.5, True, None)
            print()
        "#});
        assert_eq!(output, "a 1 2.5 True None\n");
    }

    #[test]
    fn division_by_zero_yields_undefined_marker() {
        let output = output_of(indoc! {"
            print(10 / 0)
            print(10 / 4)
            print(7 % 0)
            print(-7 % 3)
        "});
        assert_eq!(output, "undefined\n2.5\nundefined\n2");
    }

    #[test]
    fn if_elif_else_picks_first_truthy_branch() {
        let output = output_of(indoc! {r#"
            x = 5
            if x > 10:
                print("big")
            elif x > 3:
                print("medium")
            elif x > 1:
                print("small")
            else:
                print("tiny")
        "#});
        assert_eq!(output, "medium");
    }

    #[test]
    fn while_loop_runs_until_condition_is_false() {
        let output = output_of(indoc! {"
            n = 0
            total = 0
            while n < 5:
                n = n + 1
                total = total + n
                print(n, total)
        "});
        assert_eq!(output, "1 1\n2 3\n3 6\n4 10\n5 15");
    }

    #[test]
    fn for_loop_over_ranges_and_strings() {
        let output = output_of(indoc! {r#"
            count_down()
            spell("ab")
            def count_down():
                for i in range(10, 0, -4):
                    print(i)
            def spell(word):
                for c in word:
                    print(c)
                    for i in range(0):
                        print("never")
        "#});
        assert_eq!(output, "10\n6\n2\na\nb");
    }

    #[test]
    fn loop_body_on_the_header_line() {
        assert_eq!(output_of("for i in range(1,6): print(i)\n"), "1\n2\n3\n4\n5");
    }

    #[test]
    fn return_skips_the_rest_of_the_body() {
        let output = output_of(indoc! {r#"
            print(first_positive(-1, 4))
            def first_positive(a, b):
                if a > 0:
                    return a
                elif b > 0:
                    return b
                    print("unreachable")
                else:
                    return 0
        "#});
        assert_eq!(output, "4");
    }

    #[test]
    fn blocks_extend_to_the_next_definition() {
        let output = output_of(indoc! {r#"
            for i in range(2):
                print(i)
            print("inside")
            def unused():
                pass
        "#});
        assert_eq!(output, "0\ninside\n1\ninside");
    }

    #[test]
    fn return_inside_loop_leaves_the_function() {
        let output = output_of(indoc! {"
            print(find(3))
            def find(target):
                for i in range(100):
                    if i == target:
                        return i * 10
        "});
        assert_eq!(output, "30");
    }

    #[test]
    fn function_writes_do_not_leak_into_caller() {
        let run = run(indoc! {"
            x = 1
            f()
            print(x)
            print(y)
            def f():
                x = 99
                y = 2
        "});
        assert_eq!(run.output.text(), "1\n[variable y is not defined]");
        assert_eq!(
            run.outcome.warnings,
            vec![RuntimeWarning::UndefinedVariable {
                name: "y".to_string(),
                line: 4
            }]
        );
    }

    #[test]
    fn functions_see_caller_bindings() {
        let output = output_of(indoc! {"
            scale = 3
            print(times(4))
            def times(n):
                return n * scale
        "});
        assert_eq!(output, "12");
    }

    #[test]
    fn recursion_keeps_each_frame_separate() {
        let output = output_of(indoc! {"
            print(fact(10))
            print(fib(15))
            def fact(n):
                if n <= 1:
                    return 1
                else:
                    return n * fact(n - 1)
            def fib(n):
                if n < 2:
                    return n
                else:
                    return fib(n - 1) + fib(n - 2)
        "});
        assert_eq!(output, "3628800\n610");
    }

    #[test]
    fn runaway_recursion_hits_call_depth_limit() {
        let error = run_with(
            indoc! {"
                loop(0)
                def loop(n):
                    return loop(n + 1)
            "},
            &[],
            EvalConfig { max_call_depth: 16 },
        )
        .err()
        .expect("expected recursion limit");
        assert!(matches!(
            error,
            EvalError::RecursionLimit { ref name, limit: 16, line: 3 } if name == "loop"
        ));
    }

    #[test]
    fn default_call_depth_fits_a_test_thread() {
        let source = |depth: usize| {
            formatdoc! {"
                return down({})
                def down(n):
                    if n == 0:
                        return 0
                    else:
                        return 1 + down(n - 1)
            ", depth}
        };
        let deepest = DEFAULT_MAX_CALL_DEPTH - 1;
        let run = run_with(&source(deepest), &[], EvalConfig::default()).expect("run failed");
        assert_eq!(run.outcome.value, Value::int(deepest as i64));

        let error = run_with(&source(DEFAULT_MAX_CALL_DEPTH), &[], EvalConfig::default())
            .err()
            .expect("expected recursion limit");
        assert!(matches!(
            error,
            EvalError::RecursionLimit { limit: DEFAULT_MAX_CALL_DEPTH, .. }
        ));
    }

    #[test]
    fn extra_arguments_are_ignored_and_missing_stay_unbound() {
        let run = run(indoc! {"
            pair(1, 2, 3)
            pair(7)
            def pair(a, b):
                print(a, b)
        "});
        assert_eq!(run.output.text(), "1 2\n7 [variable b is not defined]");
        assert_eq!(run.outcome.warnings.len(), 1);
    }

    #[test]
    fn classes_construct_instances_and_dispatch_methods() {
        let output = output_of(indoc! {r#"
            p = Point(1, 2)
            p.move(3, 4)
            print(p.x, p.y, p.norm1())
            print(p)
            class Point:
                def __init__(self, x, y):
                    self.x = x
                    self.y = y
                def move(self, dx, dy):
                    self.x = self.x + dx
                    self.y = self.y + dy
                def norm1(self):
                    return self.x + self.y
        "#});
        assert_eq!(output, "4 6 10\n<Point object>");
    }

    #[test]
    fn instance_aliases_share_state() {
        let output = output_of(indoc! {"
            a = Counter()
            b = a
            c = Counter()
            b.bump()
            print(a.count, c.count, a == b, a == c)
            class Counter:
                def __init__(self):
                    self.count = 0
                def bump(self):
                    self.count = self.count + 1
        "});
        assert_eq!(output, "1 0 True False");
    }

    #[test]
    fn instances_from_one_class_keep_separate_state() {
        let output = output_of(indoc! {"
            a = Box(1)
            b = Box(2)
            a.v = 10
            print(a.v, b.v)
            class Box:
                def __init__(self, v):
                    self.v = v
        "});
        assert_eq!(output, "10 2");
    }

    #[test]
    fn class_without_init_still_instantiates() {
        let output = output_of(indoc! {"
            e = Empty(1, 2)
            e.tag = 5
            print(e.tag)
            class Empty:
                pass
        "});
        assert_eq!(output, "5");
    }

    #[test]
    fn degraded_operations_warn_and_continue() {
        let run = run(indoc! {"
            n = 3
            r = missing(1)
            print(r)
            print(n.size)
            n.size = 4
            p = Thing()
            print(p.absent)
            p.nothing()
            print(n.go())
            print(\"done\")
            class Thing:
                pass
        "});
        assert_eq!(run.output.text(), "None\nNone\nNone\nNone\ndone");
        let lines = run
            .outcome
            .warnings
            .iter()
            .map(RuntimeWarning::line)
            .collect::<Vec<_>>();
        assert_eq!(lines, vec![2, 4, 5, 7, 8, 9]);
        assert!(matches!(
            run.outcome.warnings[0],
            RuntimeWarning::UnknownCallTarget { .. }
        ));
        assert!(matches!(
            run.outcome.warnings[4],
            RuntimeWarning::UnknownMethod { .. }
        ));
    }

    #[test]
    fn function_references_can_be_called_through_variables() {
        let output = output_of(indoc! {"
            g = double
            print(g(4))
            print(g)
            def double(n):
                return n * 2
        "});
        assert_eq!(output, "8\n<function double>");
    }

    #[test]
    fn later_definition_replaces_earlier_one() {
        let output = output_of(indoc! {"
            print(f())
            def f():
                return 1
            def f():
                return 2
        "});
        assert_eq!(output, "2");
    }

    #[test]
    fn input_reads_lines_and_int_converts() {
        let program = compile(indoc! {r#"
            name = input("name? ")
            age = int(input())
            print(name, age + 1)
            print(int(""), int(3.9), int(True))
        "#})
        .expect("compile failed");
        let mut output = CapturedOutput::new();
        let mut input = ScriptedInput::new(["Ada", " 36 "]);
        Interpreter::new()
            .prepare(&program)
            .run(&mut output, &mut input)
            .expect("run failed");
        assert_eq!(output.text(), "Ada 37\n0 3 1");
        assert_eq!(input.prompts(), ["name? ".to_string()]);
    }

    #[test]
    fn exhausted_input_is_an_error() {
        let error = run_with("x = input()\n", &[], EvalConfig::default())
            .err()
            .expect("expected input error");
        assert!(matches!(error, EvalError::InputClosed { line: 1 }));
    }

    #[test]
    fn fatal_errors_report_their_line() {
        let cases = [
            ("x = \"a\" - 1\n", "line 1: unsupported operand types for -: 'str' and 'int'"),
            ("\nx = int(\"abc\")\n", "line 2: invalid literal for int(): 'abc'"),
            ("for i in range(1, 5, 0):\n    pass\n", "line 1: range() arg 3 must not be zero"),
            ("for i in 5:\n    pass\n", "line 1: 'int' object is not iterable"),
        ];
        for (source, expected) in cases {
            let error = run_with(source, &[], EvalConfig::default())
                .err()
                .expect("expected evaluation error");
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn logical_operators_return_operands() {
        let output = output_of(indoc! {r#"
            print(0 or "fallback", 2 and 3, not 0, not "x")
            print(1 < 2 and 2 < 3, 1 == 1.0, "a" != "b")
        "#});
        assert_eq!(output, "fallback 3 True False\nTrue True True");
    }

    #[test]
    fn strings_concatenate_and_repeat() {
        let output = output_of(indoc! {r#"
            s = "ab" + 'cd'
            print(s, "-" * 3, f"raw {s}")
        "#});
        assert_eq!(output, "abcd --- raw {s}");
    }

    #[test]
    fn top_level_return_stops_the_program() {
        let run = run(indoc! {r#"
            print("before")
            return 42
            print("after")
        "#});
        assert_eq!(run.output.text(), "before");
        assert_eq!(run.outcome.value, Value::int(42));
    }

    #[test]
    fn each_run_starts_fresh() {
        let program = compile(indoc! {"
            print(counter)
            counter = 1
        "})
        .expect("compile failed");
        let prepared = Interpreter::new().prepare(&program);
        for _ in 0..2 {
            let mut output = CapturedOutput::new();
            let outcome = prepared
                .run(&mut output, &mut ScriptedInput::empty())
                .expect("run failed");
            assert_eq!(output.text(), "[variable counter is not defined]");
            assert_eq!(outcome.warnings.len(), 1);
        }
    }

    #[test]
    fn runs_are_deterministic() {
        let source = indoc! {"
            total = 0
            for i in range(1, 20, 3):
                total = total + i * i % 7
            print(total, total / 3)
        "};
        assert_eq!(output_of(source), output_of(source));
    }
}

use brewin::{CollectStringPrint, Dialect, ErrorKind, Exception, QueuedInput, Runner};
use pretty_assertions::assert_eq;

fn run_with(dialect: Dialect, source: &str, input: &[&str]) -> String {
    let runner = Runner::new(source, dialect).expect("source parses");
    let mut print = CollectStringPrint::new();
    let mut input = QueuedInput::new(input.iter().copied());
    runner.run(&mut input, &mut print).expect("program runs");
    print.into_output()
}

fn run_err(dialect: Dialect, source: &str) -> Exception {
    let runner = Runner::new(source, dialect).expect("source parses");
    let mut print = CollectStringPrint::new();
    runner
        .run(&mut QueuedInput::new::<_, String>([]), &mut print)
        .expect_err("program fails")
}

#[test]
fn v1_arithmetic_and_variables() {
    let out = run_with(Dialect::V1, "func main() { var x; x = 5 + 3 - 2; print(x); }", &[]);
    assert_eq!(out, "6\n");
}

#[test]
fn v1_string_concatenation() {
    let out = run_with(
        Dialect::V1,
        r#"func main() { var s; s = "foo" + "bar"; print(s, "!"); }"#,
        &[],
    );
    assert_eq!(out, "foobar!\n");
}

#[test]
fn v1_mixed_addition_is_a_type_error() {
    let err = run_err(Dialect::V1, r#"func main() { var x; x = 1 + "a"; print(x); }"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn v1_unassigned_variable_prints_nil() {
    let out = run_with(Dialect::V1, "func main() { var x; print(x); }", &[]);
    assert_eq!(out, "nil\n");
}

#[test]
fn v1_undefined_variable_and_redefinition() {
    let err = run_err(Dialect::V1, "func main() { x = 1; }");
    assert_eq!(err.kind, ErrorKind::NameError);
    let err = run_err(Dialect::V1, "func main() { var x; var x; }");
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn v1_keeps_equality_operators() {
    let out = run_with(
        Dialect::V1,
        r#"func main() { print(1 == 1); print(1 != 1); print("a" == "a"); }"#,
        &[],
    );
    assert_eq!(out, "true\nfalse\ntrue\n");
}

#[test]
fn v1_has_no_control_flow() {
    let err = run_err(Dialect::V1, "func main() { if (1 == 1) { print(1); } }");
    assert_eq!(err.kind, ErrorKind::TypeError);
    let err = run_err(
        Dialect::V1,
        "func main() { var i; for (i = 0; i == 0; i = i + 1) { print(i); } }",
    );
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn v1_has_no_booleans_or_extended_operators() {
    for source in [
        "func main() { print(true); }",
        "func main() { var b; b = false; }",
        "func main() { print(2 * 3); }",
        "func main() { print(4 / 2); }",
        "func main() { print(1 < 2); }",
        "func main() { print(1 <= 2); }",
        "func main() { print(1 > 2); }",
        "func main() { print(1 >= 2); }",
        "func main() { print(!(1 == 1)); }",
        "func main() { print(1 == 1 && 2 == 2); }",
        "func main() { print(1 == 2 || 2 == 3); }",
    ] {
        let err = run_err(Dialect::V1, source);
        assert_eq!(err.kind, ErrorKind::TypeError, "expected a type error for: {source}");
    }
}

#[test]
fn v1_has_no_user_functions() {
    let err = run_err(Dialect::V1, "func main() { foo(); } func foo() { print(1); }");
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn v1_main_must_come_first() {
    let err = run_err(Dialect::V1, "func foo() { print(1); } func main() { print(2); }");
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn missing_main_is_reported() {
    let err = run_err(Dialect::V4, "func helper() { print(1); }");
    assert_eq!(err.kind, ErrorKind::NameError);
    assert_eq!(err.message, "No main() function was found");
}

#[test]
fn inputi_echoes_prompt_and_reads() {
    let out = run_with(
        Dialect::V2,
        r#"func main() { var x; x = inputi("enter a number: "); print(x + 1); }"#,
        &["41"],
    );
    assert_eq!(out, "enter a number: \n42\n");
}

#[test]
fn inputs_reads_a_string() {
    let out = run_with(Dialect::V2, r#"func main() { print("hi " + inputs()); }"#, &["there"]);
    assert_eq!(out, "hi there\n");
}

#[test]
fn inputi_rejects_two_arguments() {
    let err = run_err(Dialect::V2, r#"func main() { print(inputi("a", "b")); }"#);
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn inputi_on_non_integer_input_fails() {
    let runner = Runner::new("func main() { print(inputi()); }", Dialect::V2).unwrap();
    let mut print = CollectStringPrint::new();
    let err = runner.run(&mut QueuedInput::new(["abc"]), &mut print).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn exhausted_input_is_a_fault() {
    let err = run_err(Dialect::V2, "func main() { print(inputi()); }");
    assert_eq!(err.kind, ErrorKind::FaultError);
}

#[test]
fn v2_control_flow_and_comparisons() {
    let source = r#"
        func main() {
            var i;
            for (i = 0; i < 5; i = i + 1) {
                if (i == 2 || i == 3) {
                    print("mid", i);
                } else {
                    print(i);
                }
            }
        }
    "#;
    let out = run_with(Dialect::V2, source, &[]);
    assert_eq!(out, "0\n1\nmid2\nmid3\n4\n");
}

#[test]
fn v2_recursion() {
    let source = r#"
        func fib(n) {
            if (n < 2) { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        func main() { print(fib(10)); }
    "#;
    assert_eq!(run_with(Dialect::V2, source, &[]), "55\n");
}

#[test]
fn equality_between_types_is_false_in_untyped_dialects() {
    let source = r#"
        func main() {
            print(1 == "1");
            print(1 != "1");
            print(nil == nil);
            print(true == 1);
        }
    "#;
    assert_eq!(run_with(Dialect::V2, source, &[]), "false\ntrue\ntrue\nfalse\n");
}

#[test]
fn division_truncates_toward_zero() {
    let source = "func main() { print(7 / 2); print(-7 / 2); print(7 / -2); }";
    assert_eq!(run_with(Dialect::V2, source, &[]), "3\n-3\n-3\n");
}

#[test]
fn division_by_zero_is_a_fault_before_v4() {
    for dialect in [Dialect::V2, Dialect::V3] {
        let err = run_err(dialect, "func main() { print(1 / 0); }");
        assert_eq!(err.kind, ErrorKind::FaultError);
    }
}

#[test]
fn negation_requires_an_int() {
    assert_eq!(run_with(Dialect::V2, "func main() { print(-(3 * 2)); }", &[]), "-6\n");
    let err = run_err(Dialect::V2, r#"func main() { print(-"abc"); }"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn not_requires_a_bool_in_v2() {
    assert_eq!(run_with(Dialect::V2, "func main() { print(!false); }", &[]), "true\n");
    let err = run_err(Dialect::V2, "func main() { print(!3); }");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn unknown_function_is_a_name_error() {
    let err = run_err(Dialect::V4, "func main() { missing(1); }");
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn arity_participates_in_dispatch() {
    let source = r#"
        func f(a) { return a; }
        func f(a, b) { return a + b; }
        func main() { print(f(1)); print(f(1, 2)); }
    "#;
    assert_eq!(run_with(Dialect::V2, source, &[]), "1\n3\n");
    let err = run_err(Dialect::V2, "func f(a) { return a; } func main() { f(1, 2, 3); }");
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn output_is_deterministic_across_runs() {
    let source = r#"
        func main() {
            var i;
            var total;
            total = 0;
            for (i = inputi(); i > 0; i = i - 1) {
                total = total + i * i;
            }
            print("total=", total);
        }
    "#;
    let runner = Runner::new(source, Dialect::V2).unwrap();
    let mut first = CollectStringPrint::new();
    runner.run(&mut QueuedInput::new(["4"]), &mut first).unwrap();
    let mut second = CollectStringPrint::new();
    runner.run(&mut QueuedInput::new(["4"]), &mut second).unwrap();
    assert_eq!(first.output(), "total=30\n");
    assert_eq!(first.output(), second.output());
}

//! The v3 type system: declared defaults, Int→Bool coercion, the
//! assignment/parameter/return compatibility matrix, and void rules.

use brewin::{CollectStringPrint, Dialect, ErrorKind, Exception, NoInput, Runner};
use pretty_assertions::assert_eq;

fn run(source: &str) -> String {
    let runner = Runner::new(source, Dialect::V3).expect("source parses");
    let mut print = CollectStringPrint::new();
    runner.run(&mut NoInput, &mut print).expect("program runs");
    print.into_output()
}

fn run_err(source: &str) -> Exception {
    let runner = Runner::new(source, Dialect::V3).expect("source parses");
    let mut print = CollectStringPrint::new();
    runner.run(&mut NoInput, &mut print).expect_err("program fails")
}

#[test]
fn declared_variables_start_at_their_defaults() {
    let source = r#"
        func main() : void {
            var i: int;
            var b: bool;
            var s: string;
            print(i);
            print(b);
            print(s);
        }
    "#;
    assert_eq!(run(source), "0\nfalse\n\n");
}

#[test]
fn int_conditions_coerce_to_bool() {
    let source = r#"
        func main() : void {
            if (3) {
                print("y");
            } else {
                print("n");
            }
        }
    "#;
    assert_eq!(run(source), "y\n");
}

#[test]
fn for_conditions_coerce_too() {
    let source = r#"
        func main() : void {
            var i: int;
            for (i = 0; 3 - i; i = i + 1) {
                print(i);
            }
        }
    "#;
    assert_eq!(run(source), "0\n1\n2\n");
}

#[test]
fn assignment_coerces_ints_into_bool_slots() {
    let source = r#"
        func main() : void {
            var b: bool;
            b = 7;
            print(b);
            b = 0;
            print(b);
        }
    "#;
    assert_eq!(run(source), "true\nfalse\n");
}

#[test]
fn parameters_coerce_ints_into_bool() {
    let source = r#"
        func show(b: bool) : void { print(b); }
        func main() : void {
            show(1);
            show(0);
            show(true);
        }
    "#;
    assert_eq!(run(source), "true\nfalse\ntrue\n");
}

#[test]
fn returns_convert_ints_into_declared_bools() {
    let source = r#"
        func truthy() : bool { return 3; }
        func main() : void { print(truthy()); }
    "#;
    assert_eq!(run(source), "true\n");
}

#[test]
fn logic_and_not_accept_coerced_ints() {
    let source = r#"
        func main() : void {
            print(1 && 2);
            print(1 && 0);
            print(0 || 0);
            print(!3);
            print(!0);
        }
    "#;
    assert_eq!(run(source), "true\nfalse\nfalse\nfalse\ntrue\n");
}

#[test]
fn equality_coerces_when_one_side_is_bool() {
    let source = r#"
        func main() : void {
            print(5 == true);
            print(0 == false);
            print(0 != true);
        }
    "#;
    assert_eq!(run(source), "true\ntrue\ntrue\n");
}

#[test]
fn comparing_distinct_primitives_is_a_type_error() {
    let err = run_err(r#"func main() : void { print(1 == "1"); }"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
    let err = run_err(r#"func main() : void { print(nil == 0); }"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn comparing_void_is_a_type_error() {
    let source = r#"
        func nothing() : void { }
        func main() : void {
            if (nothing() == nil) {
                print("never");
            }
        }
    "#;
    assert_eq!(run_err(source).kind, ErrorKind::TypeError);
}

#[test]
fn printing_void_is_a_type_error() {
    let source = r#"
        func nothing() : void { }
        func main() : void { print(nothing()); }
    "#;
    assert_eq!(run_err(source).kind, ErrorKind::TypeError);
}

#[test]
fn void_functions_may_not_return_values() {
    let source = r#"
        func nothing() : void { return 1; }
        func main() : void { nothing(); }
    "#;
    assert_eq!(run_err(source).kind, ErrorKind::TypeError);
}

#[test]
fn missing_returns_yield_the_declared_default() {
    let source = r#"
        func zero() : int { }
        func empty() : string { }
        func off() : bool { return; }
        func main() : void {
            print(zero());
            print(empty());
            print(off());
        }
    "#;
    assert_eq!(run(source), "0\n\nfalse\n");
}

#[test]
fn nil_does_not_fit_primitive_slots() {
    let err = run_err("func main() : void { var i: int; i = nil; }");
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn mismatched_primitive_assignment_is_a_type_error() {
    let err = run_err(r#"func main() : void { var i: int; i = "text"; }"#);
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn unknown_declared_types_are_rejected() {
    let err = run_err("func main() : void { var w: widget; }");
    assert_eq!(err.kind, ErrorKind::TypeError);

    let runner = Runner::new("func f(w: widget) : void { } func main() : void { }", Dialect::V3).unwrap();
    let mut print = CollectStringPrint::new();
    let err = runner.run(&mut NoInput, &mut print).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);

    let runner = Runner::new("func f() : widget { return nil; } func main() : void { }", Dialect::V3).unwrap();
    let mut print = CollectStringPrint::new();
    let err = runner.run(&mut NoInput, &mut print).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn untyped_parameters_are_rejected_at_load() {
    let runner = Runner::new("func f(x) : void { } func main() : void { }", Dialect::V3).unwrap();
    let mut print = CollectStringPrint::new();
    let err = runner.run(&mut NoInput, &mut print).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn string_equality_compares_contents() {
    let source = r#"
        func main() : void {
            var a: string;
            a = "ab" + "c";
            print(a == "abc");
            print(a != "abd");
        }
    "#;
    assert_eq!(run(source), "true\ntrue\n");
}

#[test]
fn wrong_argument_primitive_is_a_type_error() {
    let source = r#"
        func show(i: int) : void { print(i); }
        func main() : void { show("text"); }
    "#;
    assert_eq!(run_err(source).kind, ErrorKind::TypeError);
}

//! Call-by-need semantics: environment capture, memoization, and
//! short-circuit evaluation (v4).

use brewin::{CollectStringPrint, Dialect, NoInput, Runner};
use pretty_assertions::assert_eq;

fn run(source: &str) -> String {
    let runner = Runner::new(source, Dialect::V4).expect("source parses");
    let mut print = CollectStringPrint::new();
    runner.run(&mut NoInput, &mut print).expect("program runs");
    print.into_output()
}

#[test]
fn assignment_snapshots_the_environment() {
    let source = r#"
        func main() {
            var a;
            a = 5;
            var b;
            b = a;
            a = 10;
            print(b);
        }
    "#;
    // Later mutation of `a` cannot retroactively change what `b` forces to.
    assert_eq!(run(source), "5\n");
}

#[test]
fn bindings_evaluate_at_most_once() {
    let source = r#"
        func noisy() {
            print("effect");
            return 5;
        }
        func main() {
            var x;
            x = noisy();
            print(x);
            print(x);
            print(x + 1);
        }
    "#;
    assert_eq!(run(source), "effect\n5\n5\n6\n");
}

#[test]
fn unused_bindings_never_evaluate() {
    let source = r#"
        func main() {
            var x;
            x = 1 / 0;
            print("done");
        }
    "#;
    assert_eq!(run(source), "done\n");
}

#[test]
fn unused_arguments_never_evaluate() {
    let source = r#"
        func constant(a) { return 2; }
        func main() { print(constant(1 / 0)); }
    "#;
    assert_eq!(run(source), "2\n");
}

#[test]
fn arguments_capture_the_call_site_environment() {
    let source = r#"
        func identity(v) { return v; }
        func main() {
            var a;
            a = 1;
            var b;
            b = identity(a);
            a = 2;
            print(b);
        }
    "#;
    assert_eq!(run(source), "1\n");
}

#[test]
fn returned_expressions_force_at_the_use_site() {
    // The returned thunk captures the callee frame and survives its pop.
    let source = r#"
        func make() {
            var t;
            t = 3;
            return t + 1;
        }
        func main() { print(make()); }
    "#;
    assert_eq!(run(source), "4\n");
}

#[test]
fn short_circuit_or_skips_the_right_operand() {
    let source = r#"
        func main() {
            if (true || (1 / 0) == 0) {
                print("ok");
            }
        }
    "#;
    assert_eq!(run(source), "ok\n");
}

#[test]
fn short_circuit_and_skips_the_right_operand() {
    let source = r#"
        func boom() {
            print("boom");
            return true;
        }
        func main() {
            var b;
            b = false && boom();
            print(b);
            print(true && boom());
        }
    "#;
    assert_eq!(run(source), "false\nboom\ntrue\n");
}

#[test]
fn loops_force_their_condition_every_iteration() {
    let source = r#"
        func main() {
            var i;
            var total;
            total = 0;
            for (i = 0; i < 4; i = i + 1) {
                total = total + i;
            }
            print(total);
        }
    "#;
    assert_eq!(run(source), "6\n");
}

#[test]
fn side_effects_happen_in_forcing_order() {
    let source = r#"
        func trace(label, value) {
            print(label);
            return value;
        }
        func main() {
            var x;
            x = trace("left", 2) + trace("right", 3);
            print("before");
            print(x);
        }
    "#;
    // Nothing runs until x is forced; then left before right.
    assert_eq!(run(source), "before\nleft\nright\n5\n");
}

#[test]
fn call_statements_run_even_if_their_result_is_dropped() {
    let source = r#"
        func shout() {
            print("ran");
            return 1;
        }
        func main() {
            shout();
            print("after");
        }
    "#;
    assert_eq!(run(source), "ran\nafter\n");
}

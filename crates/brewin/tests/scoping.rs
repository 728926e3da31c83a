use brewin::{CollectStringPrint, Dialect, ErrorKind, Exception, NoInput, Runner};
use pretty_assertions::assert_eq;

fn run(dialect: Dialect, source: &str) -> String {
    let runner = Runner::new(source, dialect).expect("source parses");
    let mut print = CollectStringPrint::new();
    runner.run(&mut NoInput, &mut print).expect("program runs");
    print.into_output()
}

fn run_err(dialect: Dialect, source: &str) -> Exception {
    let runner = Runner::new(source, dialect).expect("source parses");
    let mut print = CollectStringPrint::new();
    runner.run(&mut NoInput, &mut print).expect_err("program fails")
}

#[test]
fn block_locals_are_invisible_after_the_block() {
    let source = r#"
        func main() {
            if (true) {
                var y;
                y = 2;
                print(y);
            }
            print(y);
        }
    "#;
    let err = run_err(Dialect::V2, source);
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn enclosing_scope_may_reuse_a_block_local_name() {
    let source = r#"
        func main() {
            if (true) {
                var t;
                t = 1;
            }
            var t;
            t = 3;
            print(t);
        }
    "#;
    assert_eq!(run(Dialect::V2, source), "3\n");
}

#[test]
fn inner_blocks_see_enclosing_locals() {
    let source = r#"
        func main() {
            var x;
            x = 1;
            if (x == 1) {
                x = 2;
                var y;
                y = x + 1;
                print(y);
            }
            print(x);
        }
    "#;
    assert_eq!(run(Dialect::V2, source), "3\n2\n");
}

#[test]
fn for_body_scope_is_fresh_each_iteration() {
    let source = r#"
        func main() {
            var i;
            for (i = 0; i < 2; i = i + 1) {
                var t;
                t = i * 10;
                print(t);
            }
        }
    "#;
    assert_eq!(run(Dialect::V2, source), "0\n10\n");
}

#[test]
fn callee_cannot_read_caller_locals() {
    // Function opacity: x lives in main's function frame.
    let source = r#"
        func f() { print(x); }
        func main() { var x; x = 1; f(); }
    "#;
    let err = run_err(Dialect::V2, source);
    assert_eq!(err.kind, ErrorKind::NameError);
}

#[test]
fn callee_set_still_reaches_caller_locals() {
    // The get/set asymmetry: lookup is function-opaque, update is not.
    let source = r#"
        func f() { x = 10; }
        func main() { var x; x = 1; f(); print(x); }
    "#;
    assert_eq!(run(Dialect::V2, source), "10\n");
    assert_eq!(run(Dialect::V4, source), "10\n");
}

#[test]
fn parameters_shadow_nothing_and_are_local() {
    let source = r#"
        func f(x) { x = x + 1; return x; }
        func main() {
            var x;
            x = 5;
            print(f(x));
            print(x);
        }
    "#;
    assert_eq!(run(Dialect::V2, source), "6\n5\n");
}

#[test]
fn deeper_calls_only_see_their_own_frame() {
    let source = r#"
        func g() { print(a); }
        func f() { var a; a = 2; g(); }
        func main() { var a; a = 1; f(); }
    "#;
    let err = run_err(Dialect::V2, source);
    assert_eq!(err.kind, ErrorKind::NameError);
}

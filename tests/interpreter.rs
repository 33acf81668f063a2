#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::Write;
    use std::rc::Rc;

    use rlox::lox::{Lox, RunOutcome};

    /// Clonable in-memory sink so the test can read what the interpreter
    /// printed after handing ownership of the writer to the session.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("output should be UTF-8")
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture_session() -> (Lox, SharedBuf) {
        let buf = SharedBuf::default();
        let lox = Lox::with_output(Box::new(buf.clone()));
        (lox, buf)
    }

    fn run(source: &str) -> (RunOutcome, String) {
        let (mut lox, buf) = capture_session();
        let outcome = lox.run(source);
        (outcome, buf.contents())
    }

    /// Run a program expected to complete without any diagnostics and
    /// return its printed output.
    fn run_clean(source: &str) -> String {
        let (outcome, output) = run(source);
        assert!(
            outcome.is_clean(),
            "unexpected errors: {:?} / {:?}",
            outcome.compile_errors,
            outcome.runtime_error
        );
        output
    }

    fn runtime_error(source: &str) -> String {
        let (outcome, _) = run(source);
        assert!(outcome.compile_errors.is_empty());
        outcome
            .runtime_error
            .expect("program should fail at runtime")
            .to_string()
    }

    // ─────────────────────── operators and values ───────────────────────

    #[test]
    fn test_interp_01_arithmetic_and_display() {
        assert_eq!(run_clean("print 1 + 2 * 3;"), "7\n");
        assert_eq!(run_clean("print 10 / 4;"), "2.5\n");
        assert_eq!(run_clean("print -(1 + 2);"), "-3\n");
    }

    #[test]
    fn test_interp_02_string_concatenation() {
        assert_eq!(run_clean("print \"foo\" + \"bar\";"), "foobar\n");
        // A string operand on either side coerces the other via display.
        assert_eq!(run_clean("print \"a\" + 1;"), "a1\n");
        assert_eq!(run_clean("print 1 + \"a\" + 2;"), "1a2\n");
        assert_eq!(run_clean("print \"v=\" + true;"), "v=true\n");
    }

    #[test]
    fn test_interp_03_divide_by_zero() {
        assert_eq!(
            runtime_error("print 1 / 0;"),
            "[line 1] Attempted to divide by zero."
        );
    }

    #[test]
    fn test_interp_04_type_errors() {
        assert_eq!(
            runtime_error("print 1 - \"a\";"),
            "[line 1] Operands must be numbers."
        );
        assert_eq!(
            runtime_error("print -\"a\";"),
            "[line 1] Operand must be a number."
        );
        assert_eq!(
            runtime_error("print true + false;"),
            "[line 1] Operands must be two numbers or two strings."
        );
    }

    #[test]
    fn test_interp_05_equality_no_coercion() {
        assert_eq!(run_clean("print nil == nil;"), "true\n");
        assert_eq!(run_clean("print 0 == false;"), "false\n");
        assert_eq!(run_clean("print \"1\" == 1;"), "false\n");
        assert_eq!(run_clean("print 2 != 3;"), "true\n");
    }

    #[test]
    fn test_interp_06_truthiness() {
        // Only nil and false are falsey.
        assert_eq!(run_clean("print !nil;"), "true\n");
        assert_eq!(run_clean("if (0) print \"yes\"; else print \"no\";"), "yes\n");
        assert_eq!(run_clean("if (\"\") print \"yes\";"), "yes\n");
    }

    #[test]
    fn test_interp_07_logical_yield_operand_values() {
        assert_eq!(run_clean("print nil or \"fallback\";"), "fallback\n");
        assert_eq!(run_clean("print 1 and 2;"), "2\n");
        assert_eq!(run_clean("print false and (1 / 0);"), "false\n");
    }

    #[test]
    fn test_interp_08_ternary_evaluates_single_branch() {
        assert_eq!(run_clean("print true ? 1 : 1 / 0;"), "1\n");
        assert_eq!(run_clean("print false ? 1 / 0 : 2;"), "2\n");
    }

    #[test]
    fn test_interp_09_comma_yields_right_operand() {
        assert_eq!(run_clean("print 1 + 1, \"right\";"), "right\n");
    }

    // ─────────────────────── scoping and closures ───────────────────────

    #[test]
    fn test_interp_10_shadowing() {
        assert_eq!(
            run_clean("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_interp_11_closure_counter() {
        let source = r#"
            fun makeCounter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }
            var counter = makeCounter();
            print counter();
            print counter();
        "#;
        assert_eq!(run_clean(source), "1\n2\n");
    }

    #[test]
    fn test_interp_12_closures_share_environment() {
        let source = r#"
            fun makePair() {
                var value = 0;
                fun set(v) { value = v; }
                fun get() { return value; }
                set(41);
                print get();
            }
            makePair();
        "#;
        assert_eq!(run_clean(source), "41\n");
    }

    #[test]
    fn test_interp_13_undefined_variable() {
        assert_eq!(
            runtime_error("print ghost;"),
            "[line 1] Undefined variable 'ghost'."
        );
    }

    // ───────────────────────── control flow ─────────────────────────────

    #[test]
    fn test_interp_14_while_and_break() {
        let source = r#"
            var i = 0;
            while (true) {
                if (i == 3) break;
                print i;
                i = i + 1;
            }
        "#;
        assert_eq!(run_clean(source), "0\n1\n2\n");
    }

    #[test]
    fn test_interp_15_break_leaves_innermost_loop_only() {
        let source = r#"
            for (var i = 0; i < 2; i = i + 1) {
                for (var j = 0; j < 5; j = j + 1) {
                    if (j == 1) break;
                    print i + j;
                }
            }
        "#;
        assert_eq!(run_clean(source), "0\n1\n");
    }

    #[test]
    fn test_interp_16_continue_in_for_still_increments() {
        let source = r#"
            for (var i = 0; i < 5; i = i + 1) {
                if (i == 2) continue;
                print i;
            }
        "#;
        assert_eq!(run_clean(source), "0\n1\n3\n4\n");
    }

    #[test]
    fn test_interp_17_continue_in_while() {
        let source = r#"
            var i = 0;
            while (i < 4) {
                i = i + 1;
                if (i == 2) continue;
                print i;
            }
        "#;
        assert_eq!(run_clean(source), "1\n3\n4\n");
    }

    // ─────────────────────────── functions ──────────────────────────────

    #[test]
    fn test_interp_18_function_return_and_default_nil() {
        assert_eq!(
            run_clean("fun add(a, b) { return a + b; } print add(1, 2);"),
            "3\n"
        );
        assert_eq!(run_clean("fun noop() { 1 + 1; } print noop();"), "nil\n");
    }

    #[test]
    fn test_interp_19_return_unwinds_through_loops() {
        let source = r#"
            fun firstOver(limit) {
                var i = 0;
                while (true) {
                    if (i > limit) return i;
                    i = i + 1;
                }
            }
            print firstOver(3);
        "#;
        assert_eq!(run_clean(source), "4\n");
    }

    #[test]
    fn test_interp_20_recursion() {
        assert_eq!(
            run_clean(
                "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(10);"
            ),
            "55\n"
        );
    }

    #[test]
    fn test_interp_21_arity_mismatch() {
        assert_eq!(
            runtime_error("fun add(a, b) { return a + b; } add(1);"),
            "[line 1] Expected 2 arguments but got 1."
        );
    }

    #[test]
    fn test_interp_22_calling_a_non_callable() {
        assert_eq!(
            runtime_error("var x = 1; x();"),
            "[line 1] Can only call functions and classes."
        );
    }

    #[test]
    fn test_interp_23_clock_native() {
        assert_eq!(run_clean("print clock() > 0;"), "true\n");
    }

    #[test]
    fn test_interp_24_function_display() {
        assert_eq!(run_clean("fun f() {} print f;"), "<fn f>\n");
        assert_eq!(run_clean("print clock;"), "<native fn clock>\n");
    }

    // ──────────────────────────── classes ───────────────────────────────

    #[test]
    fn test_interp_25_fields_and_methods() {
        let source = r#"
            class Counter {
                init() { this.count = 0; }
                bump() {
                    this.count = this.count + 1;
                    return this.count;
                }
            }
            var c = Counter();
            print c.bump();
            print c.bump();
            print c.count;
        "#;
        assert_eq!(run_clean(source), "1\n2\n2\n");
    }

    #[test]
    fn test_interp_26_init_arity_and_result() {
        let source = r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                }
            }
            var p = Point(3, 4);
            print p.x + p.y;
            print p;
        "#;
        assert_eq!(run_clean(source), "7\nPoint instance\n");

        assert_eq!(
            runtime_error(
                "class Point { init(x, y) { this.x = x; this.y = y; } } Point(1);"
            ),
            "[line 1] Expected 2 arguments but got 1."
        );
    }

    #[test]
    fn test_interp_27_init_with_return_still_yields_instance() {
        let source = r#"
            class Early {
                init() { return; }
            }
            print Early();
        "#;
        assert_eq!(run_clean(source), "Early instance\n");
    }

    #[test]
    fn test_interp_28_inherited_method_dispatch() {
        let source = r#"
            class Animal {
                speak() { return "..."; }
                greet() { return "hi"; }
            }
            class Dog < Animal {
                speak() { return "woof"; }
            }
            var d = Dog();
            print d.speak();
            print d.greet();
        "#;
        assert_eq!(run_clean(source), "woof\nhi\n");
    }

    #[test]
    fn test_interp_29_superclass_must_be_a_class() {
        assert_eq!(
            runtime_error("var NotAClass = 1; class Oops < NotAClass {}"),
            "[line 1] Superclass must be a class."
        );
    }

    #[test]
    fn test_interp_30_bound_method_remembers_instance() {
        let source = r#"
            class Greeter {
                init(name) { this.name = name; }
                greet() { return "hello " + this.name; }
            }
            var m = Greeter("lox").greet;
            print m();
        "#;
        assert_eq!(run_clean(source), "hello lox\n");
    }

    #[test]
    fn test_interp_31_property_errors() {
        assert_eq!(
            runtime_error("print 1.foo;"),
            "[line 1] Only instances have properties."
        );
        assert_eq!(
            runtime_error("class Empty {} print Empty().missing;"),
            "[line 1] Undefined property 'missing'."
        );
    }

    // ───────────────────── pipeline gating and REPL ─────────────────────

    #[test]
    fn test_interp_32_compile_errors_suppress_execution() {
        let (outcome, output) = run("print 1;\nvar = 2;\nvar = 3;");
        assert_eq!(outcome.compile_errors.len(), 2);
        assert!(outcome.runtime_error.is_none());
        assert_eq!(output, "", "no statement should have executed");
    }

    #[test]
    fn test_interp_33_resolve_errors_suppress_execution() {
        let (outcome, output) = run("{ var unused = 1; } print 2;");
        assert_eq!(outcome.compile_errors.len(), 1);
        assert_eq!(output, "");
    }

    #[test]
    fn test_interp_34_runtime_error_stops_later_statements() {
        let (outcome, output) = run("print 1; print ghost; print 2;");
        assert!(outcome.compile_errors.is_empty());
        assert!(outcome.runtime_error.is_some());
        assert_eq!(output, "1\n");
    }

    #[test]
    fn test_interp_35_state_persists_across_runs() {
        let (mut lox, buf) = capture_session();

        assert!(lox.run("var a = 1;").is_clean());
        assert!(lox.run("fun next() { a = a + 1; return a; }").is_clean());
        assert!(lox.run("print next(); print next();").is_clean());

        assert_eq!(buf.contents(), "2\n3\n");
    }

    #[test]
    fn test_interp_36_repl_echoes_expressions_and_vars() {
        let (mut lox, buf) = capture_session();
        lox.set_repl_session();

        assert!(lox.run("1 + 2;").is_clean());
        assert!(lox.run("var a = 5;").is_clean());
        assert!(lox.run("if (true) 7;").is_clean());

        // Top-level expressions and var declarations echo; nested
        // statements do not.
        assert_eq!(buf.contents(), "3\n5\n");
    }

    #[test]
    fn test_interp_37_script_mode_does_not_echo() {
        assert_eq!(run_clean("1 + 2;"), "");
    }

    #[test]
    fn test_interp_38_closure_survives_across_repl_runs() {
        let (mut lox, buf) = capture_session();

        assert!(lox
            .run("fun makeCounter() { var c = 0; fun inc() { c = c + 1; return c; } return inc; }")
            .is_clean());
        assert!(lox.run("var counter = makeCounter();").is_clean());
        assert!(lox.run("print counter();").is_clean());
        assert!(lox.run("print counter();").is_clean());

        assert_eq!(buf.contents(), "1\n2\n");
    }
}

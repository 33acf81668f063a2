#[cfg(test)]
mod resolver_tests {
    use rlox::lox::Lox;

    fn compile_errors(source: &str) -> Vec<String> {
        let mut lox = Lox::new();
        let outcome = lox.run(source);
        outcome
            .compile_errors
            .iter()
            .map(|e| e.to_string())
            .collect()
    }

    #[test]
    fn test_resolver_01_self_initializer_read() {
        let errors = compile_errors("{ var a = 1; { var a = a; } }");
        assert!(errors
            .iter()
            .any(|e| e.contains("Can't read local variable in its own initializer")));
    }

    #[test]
    fn test_resolver_02_duplicate_declaration() {
        let errors = compile_errors("{ var a = 1; var a = 2; print a; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Already a variable with this name in this scope"));
        assert!(errors[0].contains("at 'a'"));
    }

    #[test]
    fn test_resolver_03_duplicate_allowed_in_globals() {
        // Redeclaring a global is fine; REPL sessions rely on it.
        let errors = compile_errors("var a = 1; var a = 2; print a;");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_04_unused_variable() {
        let errors = compile_errors("{ var hoard = 1; }");
        assert_eq!(errors, vec!["[line 1] Error: Unused variable 'hoard'"]);
    }

    #[test]
    fn test_resolver_05_assignment_does_not_count_as_use() {
        let errors = compile_errors("{ var a = 1; a = 2; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Unused variable 'a'"));
    }

    #[test]
    fn test_resolver_06_read_from_inner_scope_counts_as_use() {
        let errors = compile_errors("{ var a = 1; { print a; } }");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_07_unused_parameter() {
        let errors = compile_errors("fun f(x) { return 1; } print f(0);");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Unused variable 'x'"));
    }

    #[test]
    fn test_resolver_08_return_outside_function() {
        let errors = compile_errors("return 1;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't return from top-level code"));
        assert!(errors[0].contains("at 'return'"));
    }

    #[test]
    fn test_resolver_09_this_outside_class() {
        let errors = compile_errors("print this;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't use 'this' outside of a class"));
    }

    #[test]
    fn test_resolver_10_this_inside_method_is_fine() {
        let errors = compile_errors(
            "class P { describe() { return this; } } print P().describe();",
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_11_return_inside_method_is_fine() {
        let errors = compile_errors("class P { zero() { return 0; } } print P().zero();");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn test_resolver_12_recursion_resolves() {
        let errors = compile_errors(
            "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print fib(5);",
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }
}

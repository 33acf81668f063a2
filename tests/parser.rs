#[cfg(test)]
mod parser_tests {
    use rlox::ast::{Ast, StmtId};
    use rlox::ast_printer::AstPrinter;
    use rlox::error::LoxError;
    use rlox::parser::Parser;
    use rlox::scanner::Scanner;
    use rlox::token::Token;

    fn parse_source(source: &str) -> (Ast, Vec<StmtId>, Vec<LoxError>) {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .collect::<Result<_, _>>()
            .expect("source should scan cleanly");

        let mut ast = Ast::new();
        let (statements, errors) = Parser::new(&tokens, &mut ast).parse();
        (ast, statements, errors)
    }

    fn printed(source: &str) -> Vec<String> {
        let (ast, statements, errors) = parse_source(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

        statements
            .iter()
            .map(|s| AstPrinter::print_stmt(&ast, *s))
            .collect()
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_eq!(printed("1 + 2 * 3;"), vec!["(+ 1.0 (* 2.0 3.0))"]);
        assert_eq!(printed("(1 + 2) * 3;"), vec!["(* (group (+ 1.0 2.0)) 3.0)"]);
        assert_eq!(printed("1 < 2 == true;"), vec!["(== (< 1.0 2.0) true)"]);
    }

    #[test]
    fn test_parser_02_ternary_binds_looser_than_equality() {
        assert_eq!(
            printed("a == b ? 1 : 2;"),
            vec!["(?: (== a b) 1.0 2.0)"]
        );
    }

    #[test]
    fn test_parser_03_ternary_right_associative() {
        // a ? 1 : b ? 2 : 3  ⇒  a ? 1 : (b ? 2 : 3)
        assert_eq!(
            printed("a ? 1 : b ? 2 : 3;"),
            vec!["(?: a 1.0 (?: b 2.0 3.0))"]
        );
    }

    #[test]
    fn test_parser_04_comma_sequencing_left_associative() {
        assert_eq!(printed("1, 2, 3;"), vec!["(, (, 1.0 2.0) 3.0)"]);
    }

    #[test]
    fn test_parser_05_comma_is_separator_in_calls() {
        // Inside an argument list a comma separates arguments instead of
        // sequencing them.
        assert_eq!(printed("f(1, 2);"), vec!["(call f 1.0 2.0)"]);
    }

    #[test]
    fn test_parser_06_assignment_right_associative() {
        assert_eq!(printed("a = b = 1;"), vec!["(= a (= b 1.0))"]);
    }

    #[test]
    fn test_parser_07_invalid_assignment_target() {
        let (_, _, errors) = parse_source("1 + 2 = 3;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn test_parser_08_for_desugars_to_while() {
        let out = printed("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0],
            "(block (var i 0.0) (while (< i 3.0) (print i) (= i (+ i 1.0))))"
        );
    }

    #[test]
    fn test_parser_09_for_without_clauses_loops_forever() {
        assert_eq!(printed("for (;;) break;"), vec!["(while true (break))"]);
    }

    #[test]
    fn test_parser_10_dangling_else_binds_to_nearest_if() {
        assert_eq!(
            printed("if (a) if (b) print 1; else print 2;"),
            vec!["(if a (if b (print 1.0) (print 2.0)))"]
        );
    }

    #[test]
    fn test_parser_11_break_outside_loop() {
        let (_, _, errors) = parse_source("break;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Must be inside a loop to use 'break'"));
    }

    #[test]
    fn test_parser_12_continue_outside_function_body_inside_loop() {
        // The loop does not extend into a nested function body.
        let (_, _, errors) = parse_source("while (true) { fun f() { continue; } }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .to_string()
            .contains("Must be inside a loop to use 'continue'"));
    }

    #[test]
    fn test_parser_13_class_with_superclass_and_methods() {
        assert_eq!(
            printed("class B < A { init(x) { this.x = x; } }"),
            vec!["(class B < A (fun init (x) (.= this x x)))"]
        );
    }

    #[test]
    fn test_parser_14_synchronize_one_error_per_statement() {
        // Two malformed statements and one good one: exactly two
        // diagnostics, with the good statement still parsed.
        let (_, statements, errors) = parse_source("var = 1;\nprint 1;\nvar = 2;");
        assert_eq!(errors.len(), 2);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_parser_15_error_at_end() {
        let (_, _, errors) = parse_source("print 1");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains(" at end"));
    }

    #[test]
    fn test_parser_16_var_initializer_allows_comma() {
        assert_eq!(printed("var a = 1, 2;"), vec!["(var a (, 1.0 2.0))"]);
    }
}

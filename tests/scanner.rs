#[cfg(test)]
mod scanner_tests {
    use rlox::error::LoxError;
    use rlox::scanner::*;
    use rlox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_ternary_symbols() {
        assert_token_sequence(
            "a ? b : c;",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::QUESTION_MARK, "?"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::COLON, ":"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_loop_keywords() {
        assert_token_sequence(
            "break continue while for",
            &[
                (TokenType::BREAK, "break"),
                (TokenType::CONTINUE, "continue"),
                (TokenType::WHILE, "while"),
                (TokenType::FOR, "for"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_number_and_string_literals() {
        let scanner = Scanner::new(b"3.14 \"hi\"");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 3.14));
        assert!(matches!(tokens[1].token_type, TokenType::STRING(ref s) if s == "hi"));
        assert_eq!(tokens[1].lexeme, "\"hi\"");
    }

    #[test]
    fn test_scanner_05_comments_are_skipped() {
        assert_token_sequence(
            "a // line comment\nb /* block\ncomment */ c",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_06_block_comment_tracks_lines() {
        let scanner = Scanner::new(b"/* one\ntwo */ x");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_scanner_07_unterminated_block_comment() {
        let scanner = Scanner::new(b"/* never closed");
        let results: Vec<_> = scanner.collect();

        let errors: Vec<&LoxError> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated block comment.");
    }

    #[test]
    fn test_scanner_08_unterminated_string() {
        let scanner = Scanner::new(b"\"open");
        let results: Vec<_> = scanner.collect();

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(errors, vec!["[line 1] Error: Unterminated string."]);
    }

    #[test]
    fn test_scanner_09_unexpected_chars_interleaved() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());

        let results: Vec<_> = scanner.collect();

        // Expected sequence: COMMA, DOT, error for '$', LEFT_PAREN,
        // error for '#', EOF.
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_scanner_10_multiline_string_line_tracking() {
        let scanner = Scanner::new(b"\"a\nb\" x");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert!(matches!(tokens[0].token_type, TokenType::STRING(ref s) if s == "a\nb"));
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 2);
    }
}

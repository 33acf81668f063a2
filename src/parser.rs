/*!
Recursive‑descent parser with panic‑mode error recovery.

The parser consumes a borrowed token slice and allocates AST nodes into a
shared [`Ast`] arena, returning the ordered list of top‑level statement ids
alongside every diagnostic it collected.  Fatal errors inside a statement
trigger `synchronize()`, which discards tokens up to the next statement
boundary so that one malformed statement produces exactly one report instead
of a cascade.  Non‑fatal diagnostics (invalid assignment target, parameter
overflow, `break`/`continue` outside a loop) are recorded without discarding
the surrounding parse.

Grammar (EBNF — condensed)
--------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" method* "}" ;
method         → IDENT "(" parameters? ")" block ;
funDecl        → "fun" IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" commaExpr )? ";" ;
statement      → exprStmt | printStmt | forStmt | whileStmt | ifStmt
               | breakStmt | continueStmt | returnStmt | block ;
exprStmt       → commaExpr ";" ;
printStmt      → "print" commaExpr ";" ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
whileStmt      → "while" "(" expression ")" statement ;
ifStmt         → "if" "(" expression ")" statement ( "else" statement )? ;
breakStmt      → "break" ";" ;
continueStmt   → "continue" ";" ;
returnStmt     → "return" expression? ";" ;
block          → "{" declaration* "}" ;
parameters     → IDENT ( "," IDENT )* ;

commaExpr      → expression ( "," expression )* ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → ternary ( "and" ternary )* ;
ternary        → equality ( "?" expression ":" expression )? ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
arguments      → expression ( "," expression )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" ;
```

The comma operator is the loosest binding level and only appears in
statement / `var`‑initializer position; argument lists and parentheses parse
at `expression` level so `,` keeps its separator meaning there.

`for` desugars to `Block([initializer?, While { condition, body, increment }])`.
The increment lives in a dedicated slot on the `While` node instead of being
appended to the body, so `continue` can skip the remainder of the body while
the increment still runs (see the interpreter's loop handling).
*/

use crate::ast::{Ast, Expr, ExprId, LiteralValue, Stmt, StmtId};
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Top‑level parser over an immutable slice of tokens, allocating into `ast`.
pub struct Parser<'a> {
    tokens: &'a [Token],
    ast: &'a mut Ast,
    current: usize,

    /// Nesting depth of loop bodies currently being parsed; `break` and
    /// `continue` are only legal when this is non‑zero.  Reset to zero while
    /// parsing a function body, since loops do not cross function boundaries.
    loop_depth: usize,

    /// Non‑fatal diagnostics plus every synchronized fatal error.
    errors: Vec<LoxError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.
    pub fn new(tokens: &'a [Token], ast: &'a mut Ast) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            ast,
            current: 0,
            loop_depth: 0,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Returns the statement list together with
    /// every diagnostic; the list covers only statements that parsed cleanly.
    pub fn parse(mut self) -> (Vec<StmtId>, Vec<LoxError>) {
        info!("Beginning parse phase");

        let mut statements: Vec<StmtId> = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                }
            }
        }

        (statements, self.errors)
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Result<StmtId> {
        debug!("Entering declaration");

        if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::FUN) {
            self.function("function")
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Result<StmtId> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected class name")?;

        let superclass: Option<ExprId> = if self.matches(TokenType::LESS) {
            let super_name = self.consume(TokenType::IDENTIFIER, "Expected superclass name")?;
            Some(self.ast.push_expr(Expr::Variable(super_name)))
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut methods: Vec<StmtId> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            // Methods reuse the function rule, minus the 'fun' keyword.
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body")?;

        Ok(self.ast.push_stmt(Stmt::Class {
            name,
            superclass,
            methods,
        }))
    }

    fn function(&mut self, kind: &str) -> Result<StmtId> {
        let name: Token = self.consume(TokenType::IDENTIFIER, format!("Expected {kind} name"))?;

        self.consume(
            TokenType::LEFT_PAREN,
            format!("Expected '(' after {kind} name"),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= 255 {
                    // Reported but not fatal: the parse carries on.
                    let token = self.peek().clone();
                    self.errors.push(LoxError::parse_at(
                        &token,
                        "Cannot have more than 255 parameters",
                    ));
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expected parameter name")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;
        self.consume(
            TokenType::LEFT_BRACE,
            format!("Expected '{{' before {kind} body"),
        )?;

        // A function body is a fresh lexical island for break/continue.
        let enclosing_loop_depth = self.loop_depth;
        self.loop_depth = 0;
        let body = self.block_statements();
        self.loop_depth = enclosing_loop_depth;

        Ok(self.ast.push_stmt(Stmt::Function {
            name,
            params,
            body: body?,
        }))
    }

    fn var_declaration(&mut self) -> Result<StmtId> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected variable name")?;

        let initializer: Option<ExprId> = if self.matches(TokenType::EQUAL) {
            Some(self.comma_expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration",
        )?;

        Ok(self.ast.push_stmt(Stmt::Var { name, initializer }))
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<StmtId> {
        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::BREAK) {
            self.break_statement()
        } else if self.matches(TokenType::CONTINUE) {
            self.continue_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            let statements = self.block_statements()?;
            Ok(self.ast.push_stmt(Stmt::Block(statements)))
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    /// Desugar `for (init; cond; inc) body` into
    /// `{ init; while (cond) body [inc] }`.
    fn for_statement(&mut self) -> Result<StmtId> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'")?;

        let initializer: Option<StmtId> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: ExprId = if !self.check(TokenType::SEMICOLON) {
            self.expression()?
        } else {
            // An omitted condition loops forever.
            self.ast.push_expr(Expr::Literal(LiteralValue::True))
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition")?;

        let increment: Option<ExprId> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        let while_stmt = self.ast.push_stmt(Stmt::While {
            condition,
            body: body?,
            increment,
        });

        Ok(match initializer {
            Some(init) => self.ast.push_stmt(Stmt::Block(vec![init, while_stmt])),
            None => while_stmt,
        })
    }

    fn if_statement(&mut self) -> Result<StmtId> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition: ExprId = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        // 'else' binds to the nearest unmatched 'if'.
        let then_branch: StmtId = self.statement()?;
        let else_branch: Option<StmtId> = if self.matches(TokenType::ELSE) {
            Some(self.statement()?)
        } else {
            None
        };

        Ok(self.ast.push_stmt(Stmt::If {
            condition,
            then_branch,
            else_branch,
        }))
    }

    fn while_statement(&mut self) -> Result<StmtId> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'")?;
        let condition: ExprId = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;

        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        Ok(self.ast.push_stmt(Stmt::While {
            condition,
            body: body?,
            increment: None,
        }))
    }

    fn break_statement(&mut self) -> Result<StmtId> {
        let keyword: Token = self.previous().clone();

        if self.loop_depth == 0 {
            // Reported, but the node is still produced.
            self.errors.push(LoxError::parse_at(
                &keyword,
                "Must be inside a loop to use 'break'",
            ));
        }

        self.consume(TokenType::SEMICOLON, "Expected ';' after 'break'")?;
        Ok(self.ast.push_stmt(Stmt::Break(keyword)))
    }

    fn continue_statement(&mut self) -> Result<StmtId> {
        let keyword: Token = self.previous().clone();

        if self.loop_depth == 0 {
            self.errors.push(LoxError::parse_at(
                &keyword,
                "Must be inside a loop to use 'continue'",
            ));
        }

        self.consume(TokenType::SEMICOLON, "Expected ';' after 'continue'")?;
        Ok(self.ast.push_stmt(Stmt::Continue(keyword)))
    }

    fn return_statement(&mut self) -> Result<StmtId> {
        let keyword: Token = self.previous().clone();
        let value: Option<ExprId> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value")?;
        Ok(self.ast.push_stmt(Stmt::Return { keyword, value }))
    }

    fn print_statement(&mut self) -> Result<StmtId> {
        let value: ExprId = self.comma_expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value")?;

        Ok(self.ast.push_stmt(Stmt::Print(value)))
    }

    fn expression_statement(&mut self) -> Result<StmtId> {
        let expr: ExprId = self.comma_expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression")?;
        Ok(self.ast.push_stmt(Stmt::Expression(expr)))
    }

    /// Parse the statements of a `{ … }` block, assuming the opening brace
    /// was already consumed.
    fn block_statements(&mut self) -> Result<Vec<StmtId>> {
        let mut statements: Vec<StmtId> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;
        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    /// Comma sequencing: `a, b` evaluates both and yields `b`.
    fn comma_expression(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.expression()?;

        while self.matches(TokenType::COMMA) {
            let operator: Token = self.previous().clone();
            let right: ExprId = self.expression()?;

            expr = self.ast.push_expr(Expr::Binary {
                left: expr,
                operator,
                right,
            });
        }

        Ok(expr)
    }

    fn expression(&mut self) -> Result<ExprId> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<ExprId> {
        let expr: ExprId = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: ExprId = self.assignment()?;

            match self.ast.expr(expr).clone() {
                Expr::Variable(name) => {
                    return Ok(self.ast.push_expr(Expr::Assign { name, value }));
                }

                Expr::Get { object, name } => {
                    return Ok(self.ast.push_expr(Expr::Set {
                        object,
                        name,
                        value,
                    }));
                }

                _ => {
                    // Reported, parsing continues with the already‑built
                    // expression as the result.
                    self.errors
                        .push(LoxError::parse_at(&equals, "Invalid assignment target"));
                }
            }
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: ExprId = self.logical_and()?;

            expr = self.ast.push_expr(Expr::Logical {
                left: expr,
                operator,
                right,
            });
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.ternary()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: ExprId = self.ternary()?;

            expr = self.ast.push_expr(Expr::Logical {
                left: expr,
                operator,
                right,
            });
        }

        Ok(expr)
    }

    /// `condition ? if_true : if_false`, right‑associative; the condition
    /// parses at equality level.
    fn ternary(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.equality()?;

        if self.matches(TokenType::QUESTION_MARK) {
            let if_true: ExprId = self.expression()?;
            self.consume(TokenType::COLON, "Expected ':' after ternary branch")?;
            let if_false: ExprId = self.expression()?;

            expr = self.ast.push_expr(Expr::Ternary {
                condition: expr,
                if_true,
                if_false,
            });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.comparison()?;

        while self.matches(TokenType::BANG_EQUAL) || self.matches(TokenType::EQUAL_EQUAL) {
            let operator: Token = self.previous().clone();
            let right: ExprId = self.comparison()?;

            expr = self.ast.push_expr(Expr::Binary {
                left: expr,
                operator,
                right,
            });
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.term()?;

        while self.matches(TokenType::GREATER)
            || self.matches(TokenType::GREATER_EQUAL)
            || self.matches(TokenType::LESS)
            || self.matches(TokenType::LESS_EQUAL)
        {
            let operator: Token = self.previous().clone();
            let right: ExprId = self.term()?;

            expr = self.ast.push_expr(Expr::Binary {
                left: expr,
                operator,
                right,
            });
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.factor()?;

        while self.matches(TokenType::MINUS) || self.matches(TokenType::PLUS) {
            let operator: Token = self.previous().clone();
            let right: ExprId = self.factor()?;

            expr = self.ast.push_expr(Expr::Binary {
                left: expr,
                operator,
                right,
            });
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.unary()?;

        while self.matches(TokenType::STAR) || self.matches(TokenType::SLASH) {
            let operator: Token = self.previous().clone();
            let right: ExprId = self.unary()?;

            expr = self.ast.push_expr(Expr::Binary {
                left: expr,
                operator,
                right,
            });
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<ExprId> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: ExprId = self.unary()?;

            return Ok(self.ast.push_expr(Expr::Unary { operator, right }));
        }

        self.call()
    }

    fn call(&mut self) -> Result<ExprId> {
        let mut expr: ExprId = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expected property name after '.'")?;

                expr = self.ast.push_expr(Expr::Get { object: expr, name });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: ExprId) -> Result<ExprId> {
        let mut arguments: Vec<ExprId> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= 255 {
                    let token = self.peek().clone();
                    self.errors.push(LoxError::parse_at(
                        &token,
                        "Cannot have more than 255 arguments",
                    ));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(self.ast.push_expr(Expr::Call {
            callee,
            paren,
            arguments,
        }))
    }

    fn primary(&mut self) -> Result<ExprId> {
        if self.matches(TokenType::FALSE) {
            return Ok(self.ast.push_expr(Expr::Literal(LiteralValue::False)));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(self.ast.push_expr(Expr::Literal(LiteralValue::True)));
        }
        if self.matches(TokenType::NIL) {
            return Ok(self.ast.push_expr(Expr::Literal(LiteralValue::Nil)));
        }

        if let TokenType::NUMBER(n) = self.peek().token_type {
            self.advance();
            return Ok(self.ast.push_expr(Expr::Literal(LiteralValue::Number(n))));
        }

        if let TokenType::STRING(ref s) = self.peek().token_type {
            let s = s.clone();
            self.advance();
            return Ok(self.ast.push_expr(Expr::Literal(LiteralValue::Str(s))));
        }

        if self.matches(TokenType::THIS) {
            let keyword = self.previous().clone();
            return Ok(self.ast.push_expr(Expr::This(keyword)));
        }

        if self.matches(TokenType::IDENTIFIER) {
            let name = self.previous().clone();
            return Ok(self.ast.push_expr(Expr::Variable(name)));
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: ExprId = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

            return Ok(self.ast.push_expr(Expr::Grouping(expr)));
        }

        Err(LoxError::parse_at(self.peek(), "Expected expression"))
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume<S: Into<String>>(&mut self, ttype: TokenType, message: S) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(LoxError::parse_at(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous().clone()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}

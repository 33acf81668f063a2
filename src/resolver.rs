//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String, VarState>` tracking
//!    declared/defined/used).
//! 2. Report static errors (redeclaration, forward‑read in initializer,
//!    unused locals, invalid `return`/`this`).  Resolution keeps going after
//!    each of them so a single pass reports everything; the driver aborts
//!    before interpretation if any were collected.
//! 3. Tell the interpreter, for *each* variable occurrence, whether it is a
//!    local (and at what depth) or a global—so the interpreter never falls
//!    back to dynamic lookup that would see a later shadowing local.
//!
//! The computed hop distance for a node must equal, at every execution of
//! that node, the number of `enclosing` links between the interpreter's
//! current environment and the one defining the name.  Every place the
//! interpreter creates an environment therefore has a `begin_scope` /
//! `end_scope` mirror here.

use crate::ast::{Ast, Expr, ExprId, Stmt, StmtId};
use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Are we inside a user function or method?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
}

/// Are we inside a class body?  Used to validate `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Per‑name bookkeeping within one scope.
#[derive(Debug)]
struct VarState {
    /// `false` between declaration and the end of the initializer.
    defined: bool,

    /// Whether the name was ever *read* (assignment does not count).
    used: bool,

    /// Declaration line, for the unused‑variable diagnostic.
    line: usize,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances (locals vs. globals) by calling back into the interpreter.
pub struct Resolver<'a> {
    ast: &'a Ast,
    interpreter: &'a mut Interpreter,
    scopes: Vec<HashMap<String, VarState>>,
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl<'a> Resolver<'a> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(ast: &'a Ast, interpreter: &'a mut Interpreter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            ast,
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements and return every diagnostic collected.
    pub fn resolve(mut self, statements: &[StmtId]) -> Vec<LoxError> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(*stmt);
        }

        self.errors
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, id: StmtId) {
        // Detach the arena reference from `self` so match arms can mutate
        // resolver state while borrowing the node.
        let ast = self.ast;

        debug!("Resolving stmt: {:?}", ast.stmt(id));

        match ast.stmt(id) {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(*s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define, so that the
                // initializer cannot read the name it is initializing.
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(*expr);
                }
                self.define(name);
            }

            Stmt::Function { name, params, body } => {
                // The function's own name is visible inside its body,
                // enabling recursion.
                self.declare(name);
                self.define(name);
                self.resolve_function(params, body, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(*expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(*condition);
                self.resolve_stmt(*then_branch);
                if let Some(eb) = else_branch {
                    self.resolve_stmt(*eb);
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                self.resolve_expr(*condition);
                self.resolve_stmt(*body);
                if let Some(inc) = increment {
                    self.resolve_expr(*inc);
                }
            }

            // Loop placement is validated by the parser's lexical flag.
            Stmt::Break(_) | Stmt::Continue(_) => {}

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.errors.push(LoxError::resolve_at(
                        keyword,
                        "Can't return from top-level code",
                    ));
                }
                if let Some(expr) = value {
                    self.resolve_expr(*expr);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(sc) = superclass {
                    self.resolve_expr(*sc);
                }

                // Method bodies see `this` one scope outside their own
                // parameters, mirroring the bind‑time environment.
                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(
                        "this".to_string(),
                        VarState {
                            defined: true,
                            used: true,
                            line: name.line,
                        },
                    );
                }

                for method in methods {
                    if let Stmt::Function { params, body, .. } = ast.stmt(*method) {
                        self.resolve_function(params, body, FunctionType::Method);
                    }
                }

                self.end_scope();
                self.current_class = enclosing_class;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, id: ExprId) {
        let ast = self.ast;

        debug!("Resolving expr: {:?}", ast.expr(id));

        match ast.expr(id) {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(*inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(*right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(*left);
                self.resolve_expr(*right);
            }

            Expr::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                self.resolve_expr(*condition);
                self.resolve_expr(*if_true);
                self.resolve_expr(*if_false);
            }

            Expr::Variable(tok) => {
                // Cannot read a local in its own initializer.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&tok.lexeme).is_some_and(|state| !state.defined) {
                        self.errors.push(LoxError::resolve_at(
                            tok,
                            "Can't read local variable in its own initializer",
                        ));
                    }
                }

                self.resolve_local(id, tok, true);
            }

            Expr::Assign { name, value } => {
                // First resolve the RHS, then bind the LHS.  A bare write
                // does not mark the variable as used.
                self.resolve_expr(*value);
                self.resolve_local(id, name, false);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(*callee);
                for arg in arguments {
                    self.resolve_expr(*arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(*object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(*object);
                self.resolve_expr(*value);
            }

            Expr::This(keyword) => {
                if self.current_class == ClassType::None {
                    self.errors.push(LoxError::resolve_at(
                        keyword,
                        "Can't use 'this' outside of a class",
                    ));
                    return;
                }

                self.resolve_local(id, keyword, true);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, params: &[Token], body: &[StmtId], ftype: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = ftype;

        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        for stmt in body {
            self.resolve_stmt(*stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Pop the innermost scope, flagging any local that was never read.
    fn end_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            let mut unused: Vec<(&String, &VarState)> =
                scope.iter().filter(|(_, state)| !state.used).collect();
            unused.sort_by_key(|(_, state)| state.line);

            for (name, state) in unused {
                self.errors.push(LoxError::resolve(
                    state.line,
                    format!("Unused variable '{}'", name),
                ));
            }
        }
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.errors.push(LoxError::resolve_at(
                    name,
                    "Already a variable with this name in this scope",
                ));
                return;
            }

            scope.insert(
                name.lexeme.clone(),
                VarState {
                    defined: false,
                    used: false,
                    line: name.line,
                },
            );
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if let Some(state) = scope.get_mut(&name.lexeme) {
                state.defined = true;
            } else {
                scope.insert(
                    name.lexeme.clone(),
                    VarState {
                        defined: true,
                        used: false,
                        line: name.line,
                    },
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as either a local at some depth, or a
    /// global if not found in *any* scope (globals get no table entry and
    /// fall back to dynamic lookup).
    fn resolve_local(&mut self, expr: ExprId, name: &Token, is_read: bool) {
        // Check innermost → outermost.
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(state) = scope.get_mut(&name.lexeme) {
                if is_read {
                    state.used = true;
                }

                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(expr, depth);
                return;
            }
        }

        // Not found in any local scope ⇒ global.
        debug!("Resolved '{}' as global", name.lexeme);
    }
}

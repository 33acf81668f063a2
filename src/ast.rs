//! Arena‑allocated AST node families for the Lox language.
//!
//! Expressions and statements are closed enums; every pass (resolver,
//! interpreter, printer) pattern‑matches exhaustively over them.  Nodes live
//! in a flat [`Ast`] arena and refer to their children through stable integer
//! ids ([`ExprId`] / [`StmtId`]).  The arena only ever grows, which gives two
//! properties the runtime relies on:
//!
//! 1. An id is a stable identity for a node, so the resolver's binding
//!    distances can be stored in a plain array indexed by `ExprId` instead of
//!    a map keyed on node references.
//! 2. The arena outlives individual REPL lines; a closure created on one line
//!    keeps a valid `StmtId` for its declaration on every later line.

use serde::Serialize;

use crate::token::Token;

/// Stable index of an expression node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(u32);

/// Stable index of a statement node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StmtId(u32);

impl ExprId {
    /// Raw arena slot, usable as an array index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl StmtId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// These variants are the *terminal leaves* of the expression tree and
/// therefore do **not** retain a reference to the originating [`Token`].
/// The parser copies (or converts) the value at parse‑time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal (Lox's `null`).
    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*
/// in Lox.  Children are arena ids; operator tokens are kept for runtime
/// error locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(ExprId),

    /// Prefix unary operator expression, e.g. `!isReady` or `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: ExprId,
    },

    /// Infix binary operator expression, e.g. `a + b`, `x <= y`.
    /// Also carries the comma sequencing operator `a, b`.
    Binary {
        left: ExprId,
        /// Operator token such as `+`, `*`, `==`, `,`, …
        operator: Token,
        right: ExprId,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: ExprId,
        operator: Token,
        right: ExprId,
    },

    /// Conditional expression `condition ? if_true : if_false`.
    Ternary {
        condition: ExprId,
        if_true: ExprId,
        if_false: ExprId,
    },

    /// Variable access ‑ resolves to the identifier's current value.
    Variable(Token),

    /// Assignment expression: `identifier "=" expression`.
    Assign { name: Token, value: ExprId },

    /// Function‑ or method‑call expression, e.g. `clock()` or `add(1, 2)`.
    Call {
        /// Expression that evaluates to a callable.
        callee: ExprId,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        /// Argument list (may be empty).
        arguments: Vec<ExprId>,
    },

    /// Property access `object.property`.
    Get { object: ExprId, name: Token },

    /// Property assignment `object.property = value`.
    Set {
        object: ExprId,
        name: Token,
        value: ExprId,
    },

    /// The `this` keyword inside a method.
    This(Token),
}

/// **Abstract‑Syntax‑Tree node** for *statements* (complete executable
/// constructs).  A program is a sequence of these, returned by the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(ExprId),

    /// `print` statement used for output.
    Print(ExprId),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<ExprId>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<StmtId>),

    /// `if` / `else` conditional.
    If {
        condition: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },

    /// `while` loop.  `increment` is only populated by `for` desugaring:
    /// it runs after every iteration, including iterations cut short by
    /// `continue`, but not after `break`.
    While {
        condition: ExprId,
        body: StmtId,
        increment: Option<ExprId>,
    },

    /// `break` statement; the keyword token is kept for diagnostics.
    Break(Token),

    /// `continue` statement.
    Continue(Token),

    /// Function declaration ‑ becomes a first‑class callable value.
    Function {
        name: Token,

        /// Parameter name tokens (arity ≤ 255).
        params: Vec<Token>,

        /// Body executed when the function is called.
        body: Vec<StmtId>,
    },

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for diagnostics).
        keyword: Token,

        /// Optional expression to return.  Absent ⇒ `nil` is returned.
        value: Option<ExprId>,
    },

    /// Class declaration with an optional superclass and method list.
    Class {
        name: Token,

        /// `Expr::Variable` naming the superclass, if any.
        superclass: Option<ExprId>,

        /// Method declarations; each id points at a `Stmt::Function`.
        methods: Vec<StmtId>,
    },
}

/// Flat arena owning every AST node produced by the parser.
///
/// The arena is append‑only; ids handed out earlier stay valid forever.
#[derive(Debug, Default, Serialize)]
pub struct Ast {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an expression node and return its id.
    pub fn push_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    /// Allocate a statement node and return its id.
    pub fn push_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    /// Number of expression slots allocated so far; used to size the
    /// interpreter's binding‑distance table.
    #[inline]
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

impl Expr {
    /// Source line of the token anchoring this expression, for diagnostics.
    pub fn line(&self, ast: &Ast) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Grouping(inner) => ast.expr(*inner).line(ast),
            Expr::Unary { operator, .. } => operator.line,
            Expr::Binary { operator, .. } => operator.line,
            Expr::Logical { operator, .. } => operator.line,
            Expr::Ternary { condition, .. } => ast.expr(*condition).line(ast),
            Expr::Variable(token) => token.line,
            Expr::Assign { name, .. } => name.line,
            Expr::Call { paren, .. } => paren.line,
            Expr::Get { name, .. } => name.line,
            Expr::Set { name, .. } => name.line,
            Expr::This(token) => token.line,
        }
    }
}

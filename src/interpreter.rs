//! Tree‑walking evaluator.
//!
//! Statements execute as a recursive walk that returns a [`Signal`]:
//! `break`, `continue` and `return` are ordinary control‑flow results
//! propagated upward until the nearest loop or call frame absorbs them, so
//! the error channel carries only genuine runtime errors.
//!
//! The interpreter owns one mutable "current environment" pointer into the
//! scope chain plus the resolver's binding‑distance table.  Both survive
//! across `interpret` calls, which is what lets a REPL session accumulate
//! state (and closures keep captured environments alive) from line to line.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, SystemTimeError, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Ast, Expr, ExprId, LiteralValue, Stmt, StmtId};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::function::{LoxFunction, NativeFunction};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Outcome of executing one statement.  Loops absorb `Break`/`Continue`;
/// call frames absorb `Return`.  These are intentional transfers, never
/// user‑visible errors.
#[derive(Debug)]
pub enum Signal {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,

    /// Binding distance per expression, indexed by the arena id.  `None`
    /// means the occurrence resolved to a global (or was never a variable).
    locals: Vec<Option<usize>>,

    /// REPL‑session flag: echo top‑level expression / var values.
    repl: bool,

    /// Output sink for `print` and REPL echo; swappable for tests.
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new Interpreter writing to stdout, with native functions
    /// such as `clock` pre‑defined in the global environment.
    pub fn new() -> Self {
        Self::with_output(Box::new(std::io::stdout()))
    }

    /// Creates a new Interpreter writing `print` output to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let timestamp: f64 = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e: SystemTimeError| format!("Clock error: {}", e))?
                        .as_secs_f64();
                    Ok(Value::Number(timestamp))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Vec::new(),
            repl: false,
            out,
        }
    }

    /// One‑way switch: echo every top‑level expression statement and
    /// variable declaration value, in addition to normal `print` output.
    pub fn set_repl_session(&mut self) {
        info!("REPL session mode enabled");
        self.repl = true;
    }

    /// Record a resolved binding distance for `expr`.  Called by the
    /// resolver; the table only ever grows, matching the arena.
    pub fn note_local(&mut self, expr: ExprId, depth: usize) {
        if self.locals.len() <= expr.index() {
            self.locals.resize(expr.index() + 1, None);
        }

        self.locals[expr.index()] = Some(depth);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the current run.
    pub fn interpret(&mut self, ast: &Ast, statements: &[StmtId]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if self.repl {
                self.execute_top(ast, *stmt)?;
            } else {
                self.execute(ast, *stmt)?;
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Top‑level execution in REPL mode: expression statements and variable
    /// declarations echo their value.
    fn execute_top(&mut self, ast: &Ast, id: StmtId) -> Result<Signal> {
        match ast.stmt(id) {
            Stmt::Expression(expr) => {
                let value = self.evaluate(ast, *expr)?;
                writeln!(self.out, "{}", value)?;
                Ok(Signal::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(ast, *expr)?,
                    None => Value::Nil,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, value.clone());

                writeln!(self.out, "{}", value)?;
                Ok(Signal::Normal)
            }

            _ => self.execute(ast, id),
        }
    }

    /// Executes a single statement.
    fn execute(&mut self, ast: &Ast, id: StmtId) -> Result<Signal> {
        match ast.stmt(id) {
            Stmt::Expression(expr) => {
                self.evaluate(ast, *expr)?;
                Ok(Signal::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(ast, *expr)?;
                writeln!(self.out, "{}", value)?;
                Ok(Signal::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(ast, *expr)?,
                    None => Value::Nil,
                };

                debug!("Variable '{}' defined with value: {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Signal::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(ast, statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(ast, *condition)?.is_truthy() {
                    self.execute(ast, *then_branch)
                } else if let Some(eb) = else_branch {
                    self.execute(ast, *eb)
                } else {
                    Ok(Signal::Normal)
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                debug!("Entering while loop");

                loop {
                    if !self.evaluate(ast, *condition)?.is_truthy() {
                        break;
                    }

                    match self.execute(ast, *body)? {
                        // `continue` falls through so the increment slot
                        // (populated by for‑desugaring) still runs.
                        Signal::Normal | Signal::Continue => {}
                        Signal::Break => break,
                        ret @ Signal::Return(_) => return Ok(ret),
                    }

                    if let Some(inc) = increment {
                        self.evaluate(ast, *inc)?;
                    }
                }

                Ok(Signal::Normal)
            }

            Stmt::Break(_) => Ok(Signal::Break),

            Stmt::Continue(_) => Ok(Signal::Continue),

            Stmt::Function { name, .. } => {
                debug!("Defining function '{}'", name.lexeme);

                // Capture the current environment as the closure.
                let function = LoxFunction {
                    name: name.lexeme.clone(),
                    declaration: id,
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Function(Rc::new(function)));

                Ok(Signal::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(ast, *expr)?,
                    None => Value::Nil,
                };

                Ok(Signal::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(ast, name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        ast: &Ast,
        name: &Token,
        superclass: Option<&ExprId>,
        methods: &[StmtId],
    ) -> Result<Signal> {
        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(ast, *expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(LoxError::runtime(
                        ast.expr(*expr).line(ast),
                        "Superclass must be a class.",
                    ));
                }
            },
            None => None,
        };

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();

        for method in methods {
            if let Stmt::Function {
                name: method_name, ..
            } = ast.stmt(*method)
            {
                let function = LoxFunction {
                    name: method_name.lexeme.clone(),
                    declaration: *method,
                    closure: Rc::clone(&self.environment),
                    is_initializer: method_name.lexeme == "init",
                };

                method_map.insert(method_name.lexeme.clone(), Rc::new(function));
            }
        }

        let class = LoxClass::new(name.lexeme.clone(), method_map, superclass);

        debug!("Class '{}' defined", name.lexeme);

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(Signal::Normal)
    }

    /// Execute `statements` with `environment` as the current scope,
    /// restoring the previous scope on **every** exit path (normal
    /// completion, propagating signal, or error).
    pub fn execute_block(
        &mut self,
        ast: &Ast,
        statements: &[StmtId],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Signal> {
        let previous = Rc::clone(&self.environment);
        self.environment = environment;

        let mut result = Ok(Signal::Normal);

        for stmt in statements {
            match self.execute(ast, *stmt) {
                Ok(Signal::Normal) => {}
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    // ─────────────────────────── expressions ───────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, ast: &Ast, id: ExprId) -> Result<Value> {
        match ast.expr(id) {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(ast, *inner),

            Expr::Unary { operator, right } => self.evaluate_unary(ast, operator, *right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(ast, *left, operator, *right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                // Short‑circuit: the result is the last evaluated operand's
                // own value, not a coerced boolean.
                let left_val = self.evaluate(ast, *left)?;

                let take_left = match operator.token_type {
                    TokenType::OR => left_val.is_truthy(),
                    _ => !left_val.is_truthy(), // AND
                };

                if take_left {
                    Ok(left_val)
                } else {
                    self.evaluate(ast, *right)
                }
            }

            Expr::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                // Exactly one branch is evaluated.
                if self.evaluate(ast, *condition)?.is_truthy() {
                    self.evaluate(ast, *if_true)
                } else {
                    self.evaluate(ast, *if_false)
                }
            }

            Expr::Variable(name) => self.look_up_variable(name, id),

            Expr::This(keyword) => self.look_up_variable(keyword, id),

            Expr::Assign { name, value } => {
                let value = self.evaluate(ast, *value)?;

                let target = match self.local_depth(id) {
                    Some(distance) => self.environment.borrow_mut().assign_at(
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                };

                target.map_err(|msg| LoxError::runtime(name.line, msg))?;
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(ast, *callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(ast, *arg)?);
                }

                self.invoke_callable(ast, &callee_val, paren, arg_values)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(ast, *object)?;
                self.get_property(&object, name)
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(ast, *object)?;

                let Value::Instance(instance) = object else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value = self.evaluate(ast, *value)?;
                instance.borrow_mut().set_field(&name.lexeme, value.clone());
                Ok(value)
            }
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, ast: &Ast, op: &Token, right: ExprId) -> Result<Value> {
        let right_val = self.evaluate(ast, right)?;

        match op.token_type {
            TokenType::MINUS => {
                if let Value::Number(n) = right_val {
                    Ok(Value::Number(-n))
                } else {
                    Err(LoxError::runtime(op.line, "Operand must be a number."))
                }
            }

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(LoxError::runtime(op.line, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression (including comma sequencing).
    fn evaluate_binary(
        &mut self,
        ast: &Ast,
        left: ExprId,
        op: &Token,
        right: ExprId,
    ) -> Result<Value> {
        let left_val = self.evaluate(ast, left)?;
        let right_val = self.evaluate(ast, right)?;

        match op.token_type {
            // Sequencing: both sides evaluate, the right value wins.
            TokenType::COMMA => Ok(right_val),

            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                // Permissive concatenation: a string on either side pulls in
                // the other operand's display form.
                (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),
                (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        // A distinct error, never an infinity result.
                        Err(LoxError::runtime(op.line, "Attempted to divide by zero."))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }
                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val.equals(&right_val))),
            TokenType::BANG_EQUAL => Ok(Value::Bool(!left_val.equals(&right_val))),

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
            },

            _ => Err(LoxError::runtime(op.line, "Invalid binary operator.")),
        }
    }

    // ────────────────────────── variable access ─────────────────────────

    #[inline]
    fn local_depth(&self, expr: ExprId) -> Option<usize> {
        self.locals.get(expr.index()).copied().flatten()
    }

    /// Resolved distance present → fetch that many hops up the current
    /// chain; absent → dynamic lookup in the globals.
    fn look_up_variable(&self, name: &Token, expr: ExprId) -> Result<Value> {
        let lookup = match self.local_depth(expr) {
            Some(distance) => self.environment.borrow().get_at(distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        lookup.map_err(|msg| LoxError::runtime(name.line, msg))
    }

    // ─────────────────────────── call protocol ──────────────────────────

    /// Invokes a callable (native function, user function, or class).
    fn invoke_callable(
        &mut self,
        ast: &Ast,
        callee: &Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        match callee {
            Value::NativeFunction(native) => {
                debug!("Calling native function '{}'", native.name);

                self.check_arity(native.arity, arguments.len(), paren)?;

                (native.func)(&arguments).map_err(|msg| LoxError::runtime(paren.line, msg))
            }

            Value::Function(function) => {
                debug!("Calling user-defined function '{}'", function.name);

                self.check_arity(function.arity(ast), arguments.len(), paren)?;
                self.call_function(ast, function, arguments)
            }

            Value::Class(class) => {
                debug!("Instantiating class '{}'", class.name);

                // `init`'s parameter list governs the call arity.
                let initializer = class.find_method("init");
                let arity = initializer.as_ref().map_or(0, |init| init.arity(ast));

                self.check_arity(arity, arguments.len(), paren)?;

                let instance = Value::Instance(Rc::new(RefCell::new(LoxInstance::new(
                    Rc::clone(class),
                ))));

                if let Some(init) = initializer {
                    // The bound initializer runs for its side effects; the
                    // call's result is always the fresh instance.
                    let bound = init.bind(instance.clone());
                    self.call_function(ast, &bound, arguments)?;
                }

                Ok(instance)
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn check_arity(&self, expected: usize, got: usize, paren: &Token) -> Result<()> {
        if expected != got {
            return Err(LoxError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", expected, got),
            ));
        }

        Ok(())
    }

    /// Calls a user function: fresh environment chained to the captured
    /// closure, positional parameter binding, body executed as a block.
    fn call_function(
        &mut self,
        ast: &Ast,
        function: &LoxFunction,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let Stmt::Function { params, body, .. } = ast.stmt(function.declaration) else {
            return Err(LoxError::runtime(
                0,
                format!("Invalid function '{}'.", function.name),
            ));
        };

        let mut environment = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, argument) in params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let signal = self.execute_block(ast, body, Rc::new(RefCell::new(environment)))?;

        if function.is_initializer {
            // Initializers yield their bound instance, converting any
            // explicit `return` along the way.
            return function
                .closure
                .borrow()
                .get_at(0, "this")
                .map_err(|msg| LoxError::runtime(0, msg));
        }

        match signal {
            Signal::Return(value) => Ok(value),
            _ => Ok(Value::Nil),
        }
    }

    // ───────────────────────────── properties ───────────────────────────

    /// `Get` on an instance: fields first, then class methods (with
    /// superclass fallback), binding any found method to the instance.
    fn get_property(&self, object: &Value, name: &Token) -> Result<Value> {
        let Value::Instance(instance) = object else {
            return Err(LoxError::runtime(
                name.line,
                "Only instances have properties.",
            ));
        };

        if let Some(value) = instance.borrow().get_field(&name.lexeme) {
            return Ok(value);
        }

        if let Some(method) = instance.borrow().class().find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(object.clone()))));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }
}

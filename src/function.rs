//! Callable runtime values: user‑defined functions (closures) and native
//! functions provided by the host.
//!
//! A [`LoxFunction`] pairs a declaration in the AST arena with the
//! environment that was current at its definition site; that captured chain
//! is what makes closures work after the defining scope has exited.  The
//! actual call protocol (parameter binding, body execution, return
//! unwinding) lives in the interpreter.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{Ast, Stmt, StmtId};
use crate::environment::Environment;
use crate::value::Value;

/// A user‑defined function value.
#[derive(Debug)]
pub struct LoxFunction {
    /// Function name, used for display and diagnostics.
    pub name: String,

    /// Arena id of the `Stmt::Function` declaration.
    pub declaration: StmtId,

    /// Environment captured at the definition site.
    pub closure: Rc<RefCell<Environment>>,

    /// Whether this is a class `init` method; initializers always yield
    /// their bound instance, whatever their body returns.
    pub is_initializer: bool,
}

impl LoxFunction {
    /// Number of parameters the declaration takes.
    pub fn arity(&self, ast: &Ast) -> usize {
        match ast.stmt(self.declaration) {
            Stmt::Function { params, .. } => params.len(),
            _ => 0,
        }
    }

    /// Produce a copy of this function whose closure is wrapped in a fresh
    /// single‑binding environment defining `this` as `instance`.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", instance);

        LoxFunction {
            name: self.name.clone(),
            declaration: self.declaration,
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }
}

/// A host‑provided function such as `clock`.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

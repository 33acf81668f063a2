//! Lexically scoped name→value tables.
//!
//! Environments form a parent chain: one is created per block, function call,
//! or method bind, pointing at its enclosing scope.  They are shared through
//! `Rc<RefCell<_>>` because an environment may be reachable both from the live
//! call stack and from any number of outstanding closures that captured it.
//!
//! `get`/`assign` walk the chain dynamically (used for globals).  `get_at`/
//! `assign_at` jump a pre‑computed number of hops; the resolver guarantees
//! the binding exists at that depth, so a miss there indicates a scope‑shape
//! bug in the interpreter rather than a user error.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Introduce (or overwrite) a binding in this scope.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup walking the enclosing chain.
    pub fn get(&self, name: &str) -> Result<Value, String> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(format!("Undefined variable '{}'.", name))
        }
    }

    /// Dynamic assignment walking the enclosing chain.  Declarations must
    /// precede assignment, so an unknown name is an error.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), String> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(format!("Undefined variable '{}'.", name))
        }
    }

    /// Fetch a binding exactly `distance` hops up the chain.
    pub fn get_at(&self, distance: usize, name: &str) -> Result<Value, String> {
        if distance == 0 {
            self.values
                .get(name)
                .cloned()
                .ok_or_else(|| format!("Undefined variable '{}'.", name))
        } else {
            match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get_at(distance - 1, name),
                None => Err(format!("Undefined variable '{}'.", name)),
            }
        }
    }

    /// Assign a binding exactly `distance` hops up the chain.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value) -> Result<(), String> {
        if distance == 0 {
            if self.values.contains_key(name) {
                self.values.insert(name.to_string(), value);
                Ok(())
            } else {
                Err(format!("Undefined variable '{}'.", name))
            }
        } else {
            match &self.enclosing {
                Some(enclosing) => enclosing.borrow_mut().assign_at(distance - 1, name, value),
                None => Err(format!("Undefined variable '{}'.", name)),
            }
        }
    }
}

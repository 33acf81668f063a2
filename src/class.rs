//! Class objects and instances.
//!
//! A class is a callable bundle of methods with an optional superclass;
//! method lookup walks the superclass chain.  Instances hold per‑object
//! fields, defined lazily on first assignment; property reads consult fields
//! before methods.

use std::collections::HashMap;
use std::rc::Rc;

use crate::function::LoxFunction;
use crate::value::Value;

/// A runtime class object.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    pub superclass: Option<Rc<LoxClass>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        methods: HashMap<String, Rc<LoxFunction>>,
        superclass: Option<Rc<LoxClass>>,
    ) -> Self {
        LoxClass {
            name,
            methods,
            superclass,
        }
    }

    /// Look a method up on this class, falling back through the superclass
    /// chain.  Subclass definitions shadow inherited ones.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }
}

/// A runtime instance of a [`LoxClass`].
#[derive(Debug)]
pub struct LoxInstance {
    class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass> {
        &self.class
    }

    /// Field lookup only; method binding is the interpreter's job since it
    /// needs the owning `Rc` handle to bind `this`.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    /// Define or overwrite a field.  There is no method‑name collision
    /// check; a field simply shadows a method of the same name.
    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

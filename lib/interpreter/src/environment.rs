use std::{cell::RefCell, collections::HashMap, rc::Rc};

use scanner::Token;

use crate::value::Value;

/// One scope in the chain: its own bindings plus a link to the scope it
/// nests inside. The chain ends at the globals.
#[derive(Debug, Default)]
pub struct Environment<'a> {
    values: HashMap<&'a str, Value<'a>>,
    enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Self { values: HashMap::new(), enclosing: Some(enclosing) }
    }

    /// Always succeeds; re-declaring a name rebinds it in this scope.
    pub fn define(&mut self, name: &'a str, value: Value<'a>) {
        self.values.insert(name, value);
    }

    /// Walks outward through the chain. `None` means no scope defines the
    /// name.
    pub fn get(&self, name: &Token) -> Option<Value<'a>> {
        match self.values.get(name.lexeme()) {
            Some(value) => Some(value.clone()),
            None => self.enclosing.as_ref().and_then(|e| e.borrow().get(name)),
        }
    }

    /// Overwrites the innermost existing binding; never creates one.
    pub fn assign(&mut self, name: &Token, value: Value<'a>) -> bool {
        match self.values.get_mut(name.lexeme()) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow_mut().assign(name, value),
                None => false,
            },
        }
    }
}

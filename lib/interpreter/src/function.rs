use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    io::Write,
    rc::Rc,
};

use parser::FunctionDecl;

use crate::{environment::Environment, Interpreter, Result, Value};

/// A user-defined function: its declaration plus the environment that was
/// active where the declaration executed, which is what makes closures work.
#[derive(Clone)]
pub struct Function<'a> {
    declaration: Rc<FunctionDecl<'a>>,
    closure: Rc<RefCell<Environment<'a>>>,
}

impl<'a> Function<'a> {
    pub(crate) fn new(
        declaration: Rc<FunctionDecl<'a>>,
        closure: Rc<RefCell<Environment<'a>>>,
    ) -> Self {
        Self { declaration, closure }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme()
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Runs the body in a fresh scope chained to the closure, with the
    /// parameters bound positionally. The caller has already checked the
    /// argument count against the arity.
    pub(crate) fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
        output: &mut dyn Write,
    ) -> Result<Value<'a>> {
        let mut environment = Environment::with_enclosing(self.closure.clone());
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(param.lexeme(), argument);
        }

        interpreter.execute_block(
            &self.declaration.body,
            Rc::new(RefCell::new(environment)),
            output,
        )?;

        Ok(Value::Nil)
    }
}

impl Display for Function<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl Debug for Function<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The closure can contain this very function, so it stays out of
        // the debug output
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish()
    }
}

/// A host-provided function exposed to scripts.
#[derive(Clone, Copy, Debug)]
pub struct NativeFun<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub function: fn(Vec<Value<'a>>) -> Value<'a>,
}

impl PartialEq for NativeFun<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function
    }
}

impl Display for NativeFun<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn>")
    }
}

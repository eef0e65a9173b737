use std::{
    cell::RefCell,
    io::Write,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

use cursor::Line;
use errors::{LoxError, LoxErrors};
use parser::{Expr, LiteralValue, Parser, Stmt};
use scanner::{Scanner, Token, TokenData};

mod environment;
mod function;
mod value;

use environment::Environment;
pub use function::{Function, NativeFun};
pub use value::Value;

#[derive(thiserror::Error, Debug)]
pub enum InterpretError {
    #[error("{0}")]
    CompileError(LoxErrors),
    #[error("{}\n[line {}]", .0, .0.line)]
    RuntimeError(#[from] RuntimeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A runtime diagnostic, tagged with the line of the token it blames.
/// Runtime errors are fatal to the current run: nothing after the failing
/// statement executes.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct RuntimeError {
    pub error: RuntimeErrorType,
    pub line: Line,
}

impl RuntimeError {
    fn new(error: RuntimeErrorType, token: &Token) -> Self {
        Self { error, line: token.line() }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RuntimeErrorType {
    #[error("Operand of '{0}' must be a number.")]
    NonNumberOperand(String),
    #[error("Operands of '{0}' must be numbers.")]
    NonNumberOperands(String),
    #[error("Operands of '+' must be two numbers or two strings.")]
    InvalidAdditionOperands,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
    #[error("Can only call functions.")]
    NotCallable,
    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, InterpretError>;

/// Walks the statement tree against a persistent global environment. One
/// interpreter instance carries its globals across `run_source` calls, which
/// is what keeps a REPL session's definitions alive.
pub struct Interpreter<'a> {
    globals: Rc<RefCell<Environment<'a>>>,
    environment: Rc<RefCell<Environment<'a>>>,
}

impl Default for Interpreter<'_> {
    fn default() -> Self {
        let globals = Rc::new(RefCell::new(Environment::default()));
        let mut interpreter = Self { globals: globals.clone(), environment: globals };
        interpreter.define_native(NativeFun { name: "clock", arity: 0, function: clock });
        interpreter
    }
}

/// Seconds since the Unix epoch. Non-decreasing on any sane host clock.
fn clock<'a>(_arguments: Vec<Value<'a>>) -> Value<'a> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    Value::Number(now.as_secs_f64())
}

impl<'a> Interpreter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host function in the globals.
    pub fn define_native(&mut self, native: NativeFun<'a>) {
        self.globals.borrow_mut().define(native.name, Value::NativeFun(native));
    }

    /// Scan, parse, interpret. Any scan or parse diagnostic suppresses
    /// evaluation entirely; the program never runs against a malformed tree.
    pub fn run_source(&mut self, source: &'a str, output: &mut dyn Write) -> Result<()> {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        let mut errors: Vec<LoxError> = scan_errors.iter().map(LoxError::from).collect();

        match Parser::new(tokens).parse() {
            Ok(statements) if errors.is_empty() => return self.interpret(&statements, output),
            Ok(_) => (),
            Err(parse_errors) => errors.extend(parse_errors.0),
        }

        Err(InterpretError::CompileError(LoxErrors(errors)))
    }

    /// Executes statements in order, stopping at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt<'a>], output: &mut dyn Write) -> Result<()> {
        for statement in statements {
            self.execute(statement, output)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt<'a>, output: &mut dyn Write) -> Result<()> {
        log::trace!("executing {:?}", stmt);
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr, output)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr, output)?;
                writeln!(output, "{}", value)?;
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(initializer) => self.evaluate(initializer, output)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(name.lexeme(), value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(self.environment.clone());
                self.execute_block(statements, Rc::new(RefCell::new(environment)), output)
            }
            Stmt::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition, output)?.is_truthy() {
                    self.execute(then_branch, output)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch, output)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition, output)?.is_truthy() {
                    self.execute(body, output)?;
                }
                Ok(())
            }
            Stmt::Function(declaration) => {
                let function = Function::new(declaration.clone(), self.environment.clone());
                self.environment
                    .borrow_mut()
                    .define(declaration.name.lexeme(), Value::Function(Rc::new(function)));
                Ok(())
            }
        }
    }

    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt<'a>],
        environment: Rc<RefCell<Environment<'a>>>,
        output: &mut dyn Write,
    ) -> Result<()> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = statements.iter().try_for_each(|statement| self.execute(statement, output));
        // Restored on every exit path, or an error would strand us in a
        // dead scope
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr<'a>, output: &mut dyn Write) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(LiteralValue::Number(n)) => Ok((*n).into()),
            Expr::Literal(LiteralValue::Str(s)) => Ok((*s).into()),
            Expr::Literal(LiteralValue::Boolean(b)) => Ok((*b).into()),
            Expr::Literal(LiteralValue::Nil) => Ok(Value::Nil),

            Expr::Grouping(expr) => self.evaluate(expr, output),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right, output)?;
                match (&operator.data, right) {
                    (TokenData::Minus, Value::Number(n)) => Ok((-n).into()),
                    (TokenData::Minus, _) => Err(RuntimeError::new(
                        RuntimeErrorType::NonNumberOperand(operator.lexeme().to_string()),
                        operator,
                    )
                    .into()),
                    (TokenData::Bang, value) => Ok((!value.is_truthy()).into()),
                    _ => unreachable!("parser only emits '-' and '!' as unary operators"),
                }
            }

            Expr::Variable(name) => match self.environment.borrow().get(name) {
                Some(value) => Ok(value),
                None => Err(RuntimeError::new(
                    RuntimeErrorType::UndefinedVariable(name.lexeme().to_string()),
                    name,
                )
                .into()),
            },

            Expr::Assign { name, value } => {
                let value = self.evaluate(value, output)?;
                if self.environment.borrow_mut().assign(name, value.clone()) {
                    Ok(value)
                } else {
                    Err(RuntimeError::new(
                        RuntimeErrorType::UndefinedVariable(name.lexeme().to_string()),
                        name,
                    )
                    .into())
                }
            }

            Expr::Logical { left, operator, right } => {
                let left = self.evaluate(left, output)?;
                match operator.data {
                    // Short-circuit: the left value itself is the result
                    TokenData::Or if left.is_truthy() => Ok(left),
                    TokenData::And if !left.is_truthy() => Ok(left),
                    TokenData::Or | TokenData::And => self.evaluate(right, output),
                    _ => unreachable!("parser only emits 'and' and 'or' as logical operators"),
                }
            }

            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left, output)?;
                let right = self.evaluate(right, output)?;
                match (&left, &right, &operator.data) {
                    (Value::Number(l), Value::Number(r), TokenData::Minus) => Ok((l - r).into()),
                    (Value::Number(l), Value::Number(r), TokenData::Slash) => Ok((l / r).into()),
                    (Value::Number(l), Value::Number(r), TokenData::Star) => Ok((l * r).into()),
                    (Value::Number(l), Value::Number(r), TokenData::Plus) => Ok((l + r).into()),
                    (Value::Str(l), Value::Str(r), TokenData::Plus) => {
                        Ok(format!("{}{}", l, r).into())
                    }

                    (Value::Number(l), Value::Number(r), TokenData::Greater) => Ok((l > r).into()),
                    (Value::Number(l), Value::Number(r), TokenData::GreaterEqual) => {
                        Ok((l >= r).into())
                    }
                    (Value::Number(l), Value::Number(r), TokenData::Less) => Ok((l < r).into()),
                    (Value::Number(l), Value::Number(r), TokenData::LessEqual) => {
                        Ok((l <= r).into())
                    }

                    (_, _, TokenData::EqualEqual) => Ok((left == right).into()),
                    (_, _, TokenData::BangEqual) => Ok((left != right).into()),

                    (_, _, TokenData::Plus) => {
                        Err(RuntimeError::new(RuntimeErrorType::InvalidAdditionOperands, operator)
                            .into())
                    }
                    (
                        _,
                        _,
                        TokenData::Minus
                        | TokenData::Slash
                        | TokenData::Star
                        | TokenData::Greater
                        | TokenData::GreaterEqual
                        | TokenData::Less
                        | TokenData::LessEqual,
                    ) => Err(RuntimeError::new(
                        RuntimeErrorType::NonNumberOperands(operator.lexeme().to_string()),
                        operator,
                    )
                    .into()),

                    _ => unreachable!("parser only emits binary operator tokens"),
                }
            }

            Expr::Call { callee, closing_paren, arguments } => {
                let callee = self.evaluate(callee, output)?;

                let arguments = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument, output))
                    .collect::<Result<Vec<_>>>()?;

                match callee {
                    Value::Function(function) => {
                        self.check_arity(function.arity(), arguments.len(), closing_paren)?;
                        function.call(self, arguments, output)
                    }
                    Value::NativeFun(native) => {
                        self.check_arity(native.arity, arguments.len(), closing_paren)?;
                        Ok((native.function)(arguments))
                    }
                    _ => Err(RuntimeError::new(RuntimeErrorType::NotCallable, closing_paren)
                        .into()),
                }
            }
        }
    }

    fn check_arity(&self, expected: usize, got: usize, closing_paren: &Token) -> Result<()> {
        if expected == got {
            Ok(())
        } else {
            Err(RuntimeError::new(
                RuntimeErrorType::ArityMismatch { expected, got },
                closing_paren,
            )
            .into())
        }
    }
}

mod expr;
mod stmt;

use std::{cell::RefCell, iter::Peekable, rc::Rc, vec};

use errors::{LoxError, LoxErrors, Result};
pub use expr::{Expr, LiteralValue};
use scanner::{Token, TokenData, TokenType};
pub use stmt::{FunctionDecl, Stmt};

use TokenType::*;

const MAX_PARAMETERS: usize = 255;
const MAX_ARGUMENTS: usize = 255;

#[derive(Debug)]
pub struct ParserError<'a> {
    error: ParserErrorType,
    token: Token<'a>,
}

impl<'a> ParserError<'a> {
    fn new(error: ParserErrorType, token: Token<'a>) -> Self {
        Self { token, error }
    }
}

impl<'a> From<ParserError<'a>> for LoxError {
    fn from(error: ParserError<'a>) -> Self {
        LoxError {
            line: error.token.line(),
            at: match error.token.ty() {
                Eof => "end".to_string(),
                _ => format!("'{}'", error.token.lexeme()),
            },
            message: error.error.to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParserErrorType {
    #[error("Expect '(' after {0}.")]
    ExpectedLeftParen(&'static str),
    #[error("Expect ')' after {0}.")]
    ExpectedRightParen(&'static str),
    #[error("Expect ';' after {0}.")]
    ExpectedSemicolon(&'static str),
    #[error("Expect '{{' before {0} body.")]
    ExpectedLeftBrace(&'static str),
    #[error("Expect '}}' after block.")]
    ExpectedRightBrace,
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expect variable name.")]
    ExpectedVariableName,
    #[error("Expect function name.")]
    ExpectedFunctionName,
    #[error("Expect parameter name.")]
    ExpectedParameterName,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
    #[error("Can't have more than 255 arguments.")]
    TooManyArguments,
    #[error("Can't have more than 255 parameters.")]
    TooManyParameters,
}

#[derive(Debug)]
pub struct Parser<'a> {
    tokens: RefCell<Peekable<vec::IntoIter<Token<'a>>>>,
    errors: RefCell<Vec<LoxError>>,
}

impl<'a> Parser<'a> {
    /// The token sequence must be Eof-terminated, as the scanner produces it.
    pub fn new(tokens: Vec<Token<'a>>) -> Self {
        Self {
            tokens: RefCell::new(tokens.into_iter().peekable()),
            errors: RefCell::new(Vec::new()),
        }
    }

    /// Parses a whole program. Statements are only returned when no
    /// diagnostic was recorded; a malformed statement costs one diagnostic
    /// and parsing resumes at the next statement boundary.
    pub fn parse(&self) -> std::result::Result<Vec<Stmt<'a>>, LoxErrors> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    log::trace!("parse error: {e}, synchronizing");
                    self.errors.borrow_mut().push(e);
                    self.synchronize();
                }
            }
        }

        let errors = self.errors.take();
        if errors.is_empty() {
            Ok(stmts)
        } else {
            Err(LoxErrors(errors))
        }
    }

    fn declaration(&self) -> Result<Stmt<'a>> {
        if self.consume(Fun).is_ok() {
            self.function_declaration("function")
        } else if self.consume(Var).is_ok() {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn function_declaration(&self, kind: &'static str) -> Result<Stmt<'a>> {
        let name = self.consume_or_error(Identifier, ParserErrorType::ExpectedFunctionName)?;
        self.consume_or_error(LeftParen, ParserErrorType::ExpectedLeftParen("function name"))?;

        let mut params = Vec::new();
        if self.peek() != Some(RightParen) {
            loop {
                if params.len() >= MAX_PARAMETERS {
                    self.report(ParserErrorType::TooManyParameters);
                }
                params.push(
                    self.consume_or_error(Identifier, ParserErrorType::ExpectedParameterName)?,
                );
                if self.consume(Comma).is_err() {
                    break;
                }
            }
        }
        self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen("parameters"))?;

        self.consume_or_error(LeftBrace, ParserErrorType::ExpectedLeftBrace(kind))?;
        let body = self.block()?;

        Ok(Stmt::Function(Rc::new(FunctionDecl { name, params, body })))
    }

    fn var_declaration(&self) -> Result<Stmt<'a>> {
        let name = self.consume_or_error(Identifier, ParserErrorType::ExpectedVariableName)?;

        let initializer = match self.consume(Equal) {
            Ok(_) => Some(self.expression()?),
            Err(_) => None,
        };

        self.consume_or_error(
            Semicolon,
            ParserErrorType::ExpectedSemicolon("variable declaration"),
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&self) -> Result<Stmt<'a>> {
        if self.consume(Print).is_ok() {
            return self.print_statement();
        }

        if self.consume(LeftBrace).is_ok() {
            return Ok(Stmt::Block(self.block()?));
        }

        if self.consume(If).is_ok() {
            return self.if_statement();
        }

        if self.consume(While).is_ok() {
            return self.while_statement();
        }

        if self.consume(For).is_ok() {
            return self.for_statement();
        }

        self.expression_statement()
    }

    /// `for` has no node of its own, it desugars into the equivalent
    /// initializer + `while` block right here.
    fn for_statement(&self) -> Result<Stmt<'a>> {
        self.consume_or_error(LeftParen, ParserErrorType::ExpectedLeftParen("'for'"))?;

        let initializer = if self.consume(Semicolon).is_ok() {
            None
        } else if self.consume(Var).is_ok() {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.peek() == Some(Semicolon) {
            Expr::Literal(LiteralValue::Boolean(true))
        } else {
            self.expression()?
        };
        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolon("loop condition"))?;

        let increment =
            if self.peek() == Some(RightParen) { None } else { Some(self.expression()?) };
        self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen("for clauses"))?;

        let body = self.statement()?;

        let while_stmt = Stmt::While {
            condition,
            body: Box::new(Stmt::Block(
                [Some(body), increment.map(Stmt::Expression)].into_iter().flatten().collect(),
            )),
        };

        Ok(Stmt::Block([initializer, Some(while_stmt)].into_iter().flatten().collect()))
    }

    fn while_statement(&self) -> Result<Stmt<'a>> {
        self.consume_or_error(LeftParen, ParserErrorType::ExpectedLeftParen("'while'"))?;
        let condition = self.expression()?;
        self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen("condition"))?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn if_statement(&self) -> Result<Stmt<'a>> {
        self.consume_or_error(LeftParen, ParserErrorType::ExpectedLeftParen("'if'"))?;
        let condition = self.expression()?;
        self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen("condition"))?;

        let then_branch = Box::new(self.statement()?);

        // `else` binds to the nearest unmatched `if`
        let else_branch = match self.consume(Else) {
            Ok(_) => Some(self.statement()?),
            Err(_) => None,
        }
        .map(Box::new);

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn block(&self) -> Result<Vec<Stmt<'a>>> {
        let mut stmts = Vec::new();

        while !matches!(self.peek(), Some(RightBrace | Eof) | None) {
            stmts.push(self.declaration()?);
        }

        self.consume_or_error(RightBrace, ParserErrorType::ExpectedRightBrace)?;
        Ok(stmts)
    }

    fn print_statement(&self) -> Result<Stmt<'a>> {
        let value = self.expression()?;

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolon("value"))?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&self) -> Result<Stmt<'a>> {
        let value = self.expression()?;

        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolon("expression"))?;

        Ok(Stmt::Expression(value))
    }

    fn expression(&self) -> Result<Expr<'a>> {
        self.assignment()
    }

    fn assignment(&self) -> Result<Expr<'a>> {
        let expr = self.or()?;

        if let Ok(equal) = self.consume(Equal) {
            let value = Box::new(self.assignment()?);

            if let Expr::Variable(name) = expr {
                return Ok(Expr::Assign { name, value });
            }

            // Recoverable: the diagnostic is recorded and the right-hand
            // side stands in as the expression result
            self.report_at(ParserErrorType::InvalidAssignmentTarget, equal);
            return Ok(*value);
        }

        Ok(expr)
    }

    fn or(&self) -> Result<Expr<'a>> {
        let mut expr = self.and()?;

        while let Ok(operator) = self.consume(Or) {
            let right = Box::new(self.and()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn and(&self) -> Result<Expr<'a>> {
        let mut expr = self.equality()?;

        while let Ok(operator) = self.consume(And) {
            let right = Box::new(self.equality()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn equality(&self) -> Result<Expr<'a>> {
        let mut expr = self.comparison()?;

        while matches!(self.peek(), Some(BangEqual | EqualEqual)) {
            let operator = self.advance();
            let right = Box::new(self.comparison()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn comparison(&self) -> Result<Expr<'a>> {
        let mut expr = self.term()?;

        while matches!(self.peek(), Some(Greater | GreaterEqual | Less | LessEqual)) {
            let operator = self.advance();
            let right = Box::new(self.term()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn term(&self) -> Result<Expr<'a>> {
        let mut expr = self.factor()?;

        while matches!(self.peek(), Some(Plus | Minus)) {
            let operator = self.advance();
            let right = Box::new(self.factor()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn factor(&self) -> Result<Expr<'a>> {
        let mut expr = self.unary()?;

        while matches!(self.peek(), Some(Star | Slash)) {
            let operator = self.advance();
            let right = Box::new(self.unary()?);
            expr = Expr::Binary { left: Box::new(expr), operator, right }
        }
        Ok(expr)
    }

    fn unary(&self) -> Result<Expr<'a>> {
        if matches!(self.peek(), Some(Minus | Bang)) {
            let operator = self.advance();
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { operator, right });
        }
        self.call()
    }

    fn call(&self) -> Result<Expr<'a>> {
        let mut expr = self.primary()?;

        // Each `(...)` suffix wraps everything to its left as the callee
        while self.consume(LeftParen).is_ok() {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&self, callee: Expr<'a>) -> Result<Expr<'a>> {
        let mut arguments = Vec::new();

        if self.peek() != Some(RightParen) {
            loop {
                if arguments.len() >= MAX_ARGUMENTS {
                    self.report(ParserErrorType::TooManyArguments);
                }

                arguments.push(self.expression()?);

                if self.consume(Comma).is_err() {
                    break;
                }
            }
        }

        let closing_paren =
            self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen("arguments"))?;

        Ok(Expr::Call { callee: Box::new(callee), closing_paren, arguments })
    }

    fn primary(&self) -> Result<Expr<'a>> {
        let token = self.advance();
        match token.data {
            TokenData::False => Ok(Expr::Literal(LiteralValue::Boolean(false))),
            TokenData::True => Ok(Expr::Literal(LiteralValue::Boolean(true))),
            TokenData::Nil => Ok(Expr::Literal(LiteralValue::Nil)),
            TokenData::Str(s) => Ok(Expr::Literal(LiteralValue::Str(s))),
            TokenData::Number(n) => Ok(Expr::Literal(LiteralValue::Number(n))),
            TokenData::LeftParen => {
                let expr = self.expression()?;

                self.consume_or_error(
                    RightParen,
                    ParserErrorType::ExpectedRightParen("expression"),
                )?;

                Ok(Expr::Grouping(Box::new(expr)))
            }
            TokenData::Identifier => Ok(Expr::Variable(token)),

            _ => Err(ParserError::new(ParserErrorType::ExpectedExpression, token).into()),
        }
    }

    /// Consumes the next token if it has the given type. `Err` carries the
    /// unconsumed token instead.
    fn consume(&self, ty: TokenType) -> std::result::Result<Token<'a>, Token<'a>> {
        match self.peek_token() {
            Some(t) if t.ty() == ty => Ok(self.advance()),
            Some(t) => Err(t),
            None => unreachable!("token sequence is Eof-terminated"),
        }
    }

    fn consume_or_error(&self, ty: TokenType, error: ParserErrorType) -> Result<Token<'a>> {
        self.consume(ty).map_err(|token| ParserError::new(error, token).into())
    }

    /// Records a non-fatal diagnostic at the current token without leaving
    /// statement parsing.
    fn report(&self, error: ParserErrorType) {
        if let Some(token) = self.peek_token() {
            self.report_at(error, token);
        }
    }

    fn report_at(&self, error: ParserErrorType, token: Token<'a>) {
        self.errors.borrow_mut().push(ParserError::new(error, token).into());
    }

    /// Discards tokens up to the next statement boundary: past a semicolon,
    /// or up to (not including) a token that starts a declaration.
    fn synchronize(&self) {
        loop {
            match self.peek() {
                None | Some(Eof | Class | Fun | Var | For | If | While | Print | Return) => return,
                Some(Semicolon) => {
                    self.advance();
                    return;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

// Helpers
impl<'a> Parser<'a> {
    fn peek_token(&self) -> Option<Token<'a>> {
        self.tokens.borrow_mut().peek().cloned()
    }

    fn peek(&self) -> Option<TokenType> {
        self.peek_token().map(|t| t.ty())
    }

    fn advance(&self) -> Token<'a> {
        self.tokens.borrow_mut().next().expect("token sequence is Eof-terminated")
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Some(Eof) | None)
    }
}

#[cfg(test)]
mod tests {
    use cursor::Line;
    use pretty_assertions::assert_eq;
    use scanner::Scanner;

    use super::*;

    fn parse(source: &str) -> std::result::Result<Vec<Stmt>, LoxErrors> {
        let (tokens, scan_errors) = Scanner::new(source).scan_tokens();
        assert!(scan_errors.is_empty(), "unexpected scan errors: {scan_errors:?}");
        Parser::new(tokens).parse()
    }

    fn error(line: usize, at: &str, error: ParserErrorType) -> LoxError {
        LoxError { line: Line(line), at: at.to_string(), message: error.to_string() }
    }

    #[test]
    fn missing_semicolon() {
        let result = parse("var a = 1");
        assert_eq!(
            result.unwrap_err(),
            LoxErrors(vec![error(
                1,
                "end",
                ParserErrorType::ExpectedSemicolon("variable declaration")
            )])
        );
    }

    #[test]
    fn synchronize_after_error() {
        let result = parse("var a = 1 var b = 2;\nvar c = 3");
        assert_eq!(
            result.unwrap_err(),
            LoxErrors(vec![
                error(1, "'var'", ParserErrorType::ExpectedSemicolon("variable declaration")),
                error(2, "end", ParserErrorType::ExpectedSemicolon("variable declaration")),
            ])
        );
    }

    #[test]
    fn invalid_assignment_target_is_a_single_diagnostic() {
        // The broken assignment must not swallow the following statement
        let result = parse("1 = 2;\nprint 3;");
        assert_eq!(
            result.unwrap_err(),
            LoxErrors(vec![error(1, "'='", ParserErrorType::InvalidAssignmentTarget)])
        );
    }

    #[test]
    fn precedence_climbing() {
        let stmts = parse("print 1 + 2 * 3 == 7;").unwrap();
        let Stmt::Print(expr) = &stmts[0] else { panic!("expected print statement") };
        assert_eq!(expr.to_string(), "(== (+ 1 (* 2 3)) 7)");
    }

    #[test]
    fn binary_operators_fold_left() {
        let stmts = parse("print 7 - 3 - 1; print 8 / 4 / 2;").unwrap();
        let Stmt::Print(expr) = &stmts[0] else { panic!("expected print statement") };
        assert_eq!(expr.to_string(), "(- (- 7 3) 1)");
        let Stmt::Print(expr) = &stmts[1] else { panic!("expected print statement") };
        assert_eq!(expr.to_string(), "(/ (/ 8 4) 2)");
    }

    #[test]
    fn unary_and_grouping() {
        let stmts = parse("print -(1 + 2) * !x;").unwrap();
        let Stmt::Print(expr) = &stmts[0] else { panic!("expected print statement") };
        assert_eq!(expr.to_string(), "(* (- (group (+ 1 2))) (! x))");
    }

    #[test]
    fn logical_operators() {
        let stmts = parse("print a or b and c;").unwrap();
        let Stmt::Print(expr) = &stmts[0] else { panic!("expected print statement") };
        assert_eq!(expr.to_string(), "(or a (and b c))");
    }

    #[test]
    fn call_suffixes_nest_leftwards() {
        let stmts = parse("f(1)(2, g());").unwrap();
        let Stmt::Expression(expr) = &stmts[0] else { panic!("expected expression statement") };
        assert_eq!(expr.to_string(), "(call (call f 1) 2 (call g))");
    }

    #[test]
    fn else_binds_to_nearest_if() {
        let stmts = parse("if (a) if (b) print 1; else print 2;").unwrap();
        let Stmt::If { else_branch, then_branch, .. } = &stmts[0] else {
            panic!("expected if statement")
        };
        assert!(else_branch.is_none());
        assert!(matches!(**then_branch, Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn for_desugars_to_while() {
        let stmts = parse("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();
        let Stmt::Block(outer) = &stmts[0] else { panic!("expected block") };
        assert!(matches!(outer[0], Stmt::Var { .. }));
        let Stmt::While { condition, body } = &outer[1] else { panic!("expected while") };
        assert_eq!(condition.to_string(), "(< i 3)");

        // The increment trails the original body inside the loop block
        let Stmt::Block(loop_body) = &**body else { panic!("expected block body") };
        assert!(matches!(loop_body[0], Stmt::Print(_)));
        let Stmt::Expression(increment) = &loop_body[1] else { panic!("expected increment") };
        assert_eq!(increment.to_string(), "(assign i (+ i 1))");
    }

    #[test]
    fn for_without_condition_loops_on_true() {
        let stmts = parse("for (;;) print 1;").unwrap();
        let Stmt::Block(outer) = &stmts[0] else { panic!("expected block") };
        let Stmt::While { condition, .. } = &outer[0] else { panic!("expected while") };
        assert_eq!(condition.to_string(), "true");
    }

    #[test]
    fn function_declaration() {
        let stmts = parse("fun add(a, b) { print a + b; }").unwrap();
        let Stmt::Function(decl) = &stmts[0] else { panic!("expected function declaration") };
        assert_eq!(decl.name.lexeme(), "add");
        assert_eq!(decl.params.iter().map(|p| p.lexeme()).collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(decl.body.len(), 1);
    }

    #[test]
    fn var_without_initializer() {
        let stmts = parse("var a;").unwrap();
        assert!(matches!(&stmts[0], Stmt::Var { initializer: None, .. }));
    }

    #[test]
    fn unterminated_block_reports_at_end() {
        let result = parse("{ print 1;");
        assert_eq!(
            result.unwrap_err(),
            LoxErrors(vec![error(1, "end", ParserErrorType::ExpectedRightBrace)])
        );
    }

    #[test]
    fn expression_error_at_eof() {
        let result = parse("print ");
        assert_eq!(
            result.unwrap_err(),
            LoxErrors(vec![error(1, "end", ParserErrorType::ExpectedExpression)])
        );
    }
}

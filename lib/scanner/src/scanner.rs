use cursor::{Cursor, Line, SourceRange};
use errors::LoxError;

pub mod token;
pub use token::{Token, TokenData, TokenType};

use TokenData::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanErrorType {
    #[error("Unexpected character '{0}'.")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct ScanError<'a> {
    pub error: ScanErrorType,
    pub range: SourceRange<'a>,
}

impl<'a> ScanError<'a> {
    fn new(error: ScanErrorType, range: impl Into<SourceRange<'a>>) -> Self {
        Self { error, range: range.into() }
    }

    pub fn line(&self) -> Line {
        self.range.line()
    }
}

impl From<&ScanError<'_>> for LoxError {
    fn from(e: &ScanError) -> Self {
        LoxError { line: e.line(), at: String::new(), message: e.error.to_string() }
    }
}

/// Single pass, maximal-munch scanner. Errors are recovered in place, so a
/// broken literal or a stray character costs one diagnostic and scanning
/// picks up at the next character.
pub struct Scanner<'a> {
    start: Cursor<'a>,
    current: Cursor<'a>,
    tokens: Vec<Token<'a>>,
    errors: Vec<ScanError<'a>>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let cursor = Cursor::new(source);
        Self { start: cursor.clone(), current: cursor, tokens: Vec::new(), errors: Vec::new() }
    }

    pub fn scan_tokens(mut self) -> (Vec<Token<'a>>, Vec<ScanError<'a>>) {
        loop {
            self.start = self.current.clone();
            let Some(c) = self.consume() else { break };

            match c {
                '(' => self.add_token(LeftParen),
                ')' => self.add_token(RightParen),
                '{' => self.add_token(LeftBrace),
                '}' => self.add_token(RightBrace),
                ',' => self.add_token(Comma),
                '.' => self.add_token(Dot),
                '-' => self.add_token(Minus),
                '+' => self.add_token(Plus),
                ';' => self.add_token(Semicolon),
                '*' => self.add_token(Star),

                '!' => {
                    if self.consume_if_matches('=') {
                        self.add_token(BangEqual)
                    } else {
                        self.add_token(Bang)
                    }
                }

                '=' => {
                    if self.consume_if_matches('=') {
                        self.add_token(EqualEqual)
                    } else {
                        self.add_token(Equal)
                    }
                }

                '<' => {
                    if self.consume_if_matches('=') {
                        self.add_token(LessEqual)
                    } else {
                        self.add_token(Less)
                    }
                }

                '>' => {
                    if self.consume_if_matches('=') {
                        self.add_token(GreaterEqual)
                    } else {
                        self.add_token(Greater)
                    }
                }

                '/' => {
                    if self.consume_if_matches('/') {
                        // Comment, runs to the end of the line
                        while self.current.peek().is_some_and(|c| c != '\n') {
                            self.consume();
                        }
                    } else {
                        self.add_token(Slash)
                    }
                }

                // The cursor counts lines on its own
                ' ' | '\r' | '\t' | '\n' => (),

                '"' => self.string(),

                d if d.is_ascii_digit() => self.number(),

                c if is_identifier_start(c) => self.identifier(),

                c => self.error(ScanErrorType::UnexpectedCharacter(c)),
            }
        }

        self.tokens.push(Token::new(Eof, (self.current.clone(), self.current.clone())));
        (self.tokens, self.errors)
    }

    fn consume(&mut self) -> Option<char> {
        self.current.next()
    }

    fn consume_if_matches(&mut self, expected: char) -> bool {
        if self.current.peek() == Some(expected) {
            self.consume();
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, data: TokenData<'a>) {
        self.tokens.push(Token::new(data, (self.start.clone(), self.current.clone())));
    }

    fn error(&mut self, error: ScanErrorType) {
        self.errors.push(ScanError::new(error, (self.start.clone(), self.current.clone())));
    }

    fn string(&mut self) {
        loop {
            match self.consume() {
                Some('"') => {
                    let lexeme = self.start.slice_until(&self.current);
                    self.add_token(Str(&lexeme[1..lexeme.len() - 1]));
                    return;
                }
                // Strings may span lines, the cursor keeps counting
                Some(_) => (),
                None => {
                    self.error(ScanErrorType::UnterminatedString);
                    return;
                }
            }
        }
    }

    fn number(&mut self) {
        while self.current.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.consume();
        }

        // A fractional part only counts if a digit follows the dot, so
        // `1.` stays two tokens
        if self.current.peek() == Some('.')
            && self.current.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.consume();
            while self.current.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.consume();
            }
        }

        let lexeme = self.start.slice_until(&self.current);
        let value = lexeme.parse().expect("digit runs always parse as f64");
        self.add_token(Number(value));
    }

    fn identifier(&mut self) {
        while self.current.peek().is_some_and(is_identifier_continue) {
            self.consume();
        }

        let lexeme = self.start.slice_until(&self.current);
        self.add_token(keyword(lexeme).unwrap_or(Identifier));
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword<'a>(lexeme: &str) -> Option<TokenData<'a>> {
    let keyword = match lexeme {
        "and" => And,
        "class" => Class,
        "else" => Else,
        "false" => False,
        "for" => For,
        "fun" => Fun,
        "if" => If,
        "nil" => Nil,
        "or" => Or,
        "print" => Print,
        "return" => Return,
        "super" => Super,
        "this" => This,
        "true" => True,
        "var" => Var,
        "while" => While,
        _ => return None,
    };
    Some(keyword)
}

use std::ops::{Deref, DerefMut};

use cursor::Line;
use itertools::Itertools;

/// A single scan or parse diagnostic: the line it occurred on, the place in
/// the statement it points at (a quoted lexeme, `end`, or nothing), and a
/// human-readable message.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("[line {line}] Error{}: {message}", if at.is_empty() { String::new() } else { format!(" at {at}") })]
pub struct LoxError {
    pub line: Line,
    pub at: String,
    pub message: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub struct LoxErrors(pub Vec<LoxError>);

impl From<LoxError> for LoxErrors {
    fn from(e: LoxError) -> Self {
        Self(vec![e])
    }
}

impl Deref for LoxErrors {
    type Target = Vec<LoxError>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for LoxErrors {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl std::fmt::Display for LoxErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|e| e.to_string()).join("\n"))
    }
}

pub type Result<T> = std::result::Result<T, LoxError>;

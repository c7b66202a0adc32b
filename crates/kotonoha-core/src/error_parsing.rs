//! Parser-side error taxonomy.
//!
//! A closed `enum` carrying the error's *category* (the
//! machine-consumable identity a caller switches on — the REPL uses it
//! to decide whether to keep reading lines) plus a human-readable
//! message, both attached to a [`Position`].

use std::error::Error;
use std::fmt;

use crate::token::Position;

/// The seven recoverable syntax error categories the parser can report.
/// `Missing*` categories are what the REPL watches for to decide whether
/// an unbalanced construct is still being typed across multiple lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    MissingRParen,
    MissingRBrace,
    MissingRSquareBrace,
    MissingFunctionName,
    MissingDoubleQuotes,
    UnexpectedToken,
    IllegalCharacter,
}

impl SyntaxErrorKind {
    /// Whether the REPL should keep accumulating input lines rather than
    /// flush this error immediately (§6).
    pub fn awaits_continuation(self) -> bool {
        matches!(
            self,
            SyntaxErrorKind::MissingRBrace
                | SyntaxErrorKind::MissingRParen
                | SyntaxErrorKind::MissingRSquareBrace
        )
    }
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyntaxErrorKind::MissingRParen => "MISSING_RPAREN",
            SyntaxErrorKind::MissingRBrace => "MISSING_RBRACE",
            SyntaxErrorKind::MissingRSquareBrace => "MISSING_R_SQUARE_BRACE",
            SyntaxErrorKind::MissingFunctionName => "MISSING_FUNCTION_NAME",
            SyntaxErrorKind::MissingDoubleQuotes => "MISSING_DOUBLE_QUOTES",
            SyntaxErrorKind::UnexpectedToken => "UNEXPECTED_TOKEN",
            SyntaxErrorKind::IllegalCharacter => "ILLEGAL_CHARACTER",
        };
        f.write_str(name)
    }
}

/// A single parser diagnostic: its category, a human-readable message,
/// and the position it was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub position: Position,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.position, self.message)
    }
}

impl Error for SyntaxError {}

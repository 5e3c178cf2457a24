use std::fmt;

use serde::Serialize;

use crate::span::SourceExtent;

/// A lexer error with the extent of the offending input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub extent: SourceExtent,
}

impl LexError {
    pub fn new(kind: LexErrorKind, extent: SourceExtent) -> Self {
        Self { kind, extent }
    }
}

/// The specific kind of lexer error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    /// A character that cannot start any token.
    UnexpectedCharacter(char),
    /// Input ended in the middle of a token. The payload names what was
    /// being read ("string", "token").
    UnexpectedEof(&'static str),
    /// A run of operator characters that is not an operator, e.g. `..`.
    UnknownOperator(String),
    /// A second decimal point inside a number literal.
    SecondDecimalPoint,
    /// The base prefix of a bytes literal is not a number.
    InvalidBytesBase(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character {c:?}"),
            Self::UnexpectedEof(what) => write!(f, "unexpected end of input while reading {what}"),
            Self::UnknownOperator(op) => write!(f, "unknown operator {op:?}"),
            Self::SecondDecimalPoint => write!(f, "unexpected second decimal point in number"),
            Self::InvalidBytesBase(base) => write!(f, "invalid bytes base {base:?}"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for LexError {}

/// A runtime error raised by the evaluator.
///
/// Every variant carries a complete human-readable message; the variant
/// itself classifies the failure the way the language surfaces it.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// An unbound variable was referenced.
    Name(String),
    /// A primitive was applied to a value of the wrong kind.
    Type(String),
    /// A structurally valid operation failed on its value, e.g. a list
    /// index out of bounds or division by zero.
    Value(String),
    /// An `?` assertion condition was not `#true ()`.
    Assertion(String),
    /// No case of a match function matched, or a float appeared in a
    /// pattern.
    Match(String),
    /// Structural misuse of the tree, e.g. evaluating a spread outside of
    /// pattern position.
    Runtime(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Name(m)
            | EvalError::Type(m)
            | EvalError::Value(m)
            | EvalError::Assertion(m)
            | EvalError::Match(m)
            | EvalError::Runtime(m) => write!(f, "{m}"),
        }
    }
}

impl std::error::Error for EvalError {}

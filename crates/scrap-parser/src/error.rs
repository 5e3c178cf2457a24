use std::fmt;

use scrap_common::span::SourceExtent;
use scrap_common::token::Token;

/// A parse error.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The token stream ran out mid-expression.
    UnexpectedEof,
    /// A token that cannot appear here.
    UnexpectedToken(Token),
    /// The left side of `=` was not a variable.
    ExpectedVariableInAssignment,
    /// A record element that is neither `name = expr` nor a spread.
    ExpectedRecordEntry,
    /// A match alternative that is not of the form `pattern -> body`.
    ExpectedCaseArm,
    /// A spread followed by further elements.
    SpreadNotLast { container: &'static str },
    /// A bytes literal with a base other than 16, 32, 64, or 85.
    UnknownBytesBase(u32),
    /// A bytes literal whose payload does not decode in its base.
    InvalidBytesPayload { base: u32, message: String },
}

impl ParseError {
    /// The source extent of the offending construct, when one is known.
    pub fn extent(&self) -> Option<SourceExtent> {
        match self {
            ParseError::UnexpectedToken(token) => Some(token.extent),
            _ => None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEof => write!(f, "unexpected end of input"),
            ParseError::UnexpectedToken(token) => {
                write!(f, "unexpected {}", token.kind.describe())
            }
            ParseError::ExpectedVariableInAssignment => {
                write!(f, "expected variable on the left side of assignment")
            }
            ParseError::ExpectedRecordEntry => {
                write!(f, "failed to parse variable assignment in record constructor")
            }
            ParseError::ExpectedCaseArm => {
                write!(f, "expected function in match expression")
            }
            ParseError::SpreadNotLast { container } => {
                write!(f, "spread must come at end of {container} match")
            }
            ParseError::UnknownBytesBase(base) => {
                write!(f, "unexpected base {base} in bytes literal")
            }
            ParseError::InvalidBytesPayload { base, message } => {
                write!(f, "invalid base{base} bytes literal: {message}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

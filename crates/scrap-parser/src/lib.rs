//! Scrapscript parser: tokens in, expression tree out.
//!
//! The expression tree defined in [`ast`] is the single representation
//! shared by every pass -- the evaluator produces values that are
//! themselves tree nodes, the serializer walks it, and the type checker
//! reads it. The parser is a precedence-climbing loop over the operator
//! table in `scrap_common::prec`.

pub mod ast;
mod bytes;
pub mod error;
mod parser;

use std::fmt;

use scrap_common::error::LexError;

use crate::ast::ExprRef;
use crate::error::ParseError;
pub use crate::parser::Parser;

/// A lexing or parsing failure.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
    Lex(LexError),
    Parse(ParseError),
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::Lex(e) => write!(f, "{e}"),
            SyntaxError::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SyntaxError {}

impl From<LexError> for SyntaxError {
    fn from(e: LexError) -> Self {
        SyntaxError::Lex(e)
    }
}

impl From<ParseError> for SyntaxError {
    fn from(e: ParseError) -> Self {
        SyntaxError::Parse(e)
    }
}

/// Tokenize and parse a complete source buffer.
pub fn parse(source: &str) -> Result<ExprRef, SyntaxError> {
    let tokens = scrap_lexer::tokenize(source)?;
    Ok(Parser::new(tokens).parse()?)
}

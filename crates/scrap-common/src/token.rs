use num_bigint::BigInt;
use serde::Serialize;

use crate::span::SourceExtent;

/// A token produced by the scrapscript lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub extent: SourceExtent,
}

impl Token {
    pub fn new(kind: TokenKind, extent: SourceExtent) -> Self {
        Token { kind, extent }
    }
}

/// Every kind of token in the language.
///
/// Operators are carried as their source text; the parser resolves them
/// against the precedence table. Bytes literals keep their undecoded
/// payload and base because decoding happens in the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    /// Integer literal (arbitrary precision), e.g. `42`.
    IntLit(BigInt),
    /// Float literal, e.g. `3.14` or `10.`.
    FloatLit(f64),
    /// String literal contents (no escape processing), e.g. `"hello"`.
    StringLit(String),
    /// Bytes literal, e.g. `~~QUJD` or `~~16'414243`. The payload is kept
    /// as text; `base` is one of 16, 32, 64, 85.
    BytesLit { value: String, base: u32 },
    /// An operator from the precedence table, e.g. `+`, `->`, `...`.
    Operator(String),
    /// An identifier, e.g. `quicksort`, `$$add`, `x'`.
    Name(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `#` -- introduces a variant tag.
    Hash,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::IntLit(v) => format!("integer literal {v}"),
            TokenKind::FloatLit(v) => format!("float literal {v}"),
            TokenKind::StringLit(s) => format!("string literal {s:?}"),
            TokenKind::BytesLit { value, .. } => format!("bytes literal ~~{value}"),
            TokenKind::Operator(op) => format!("operator {op:?}"),
            TokenKind::Name(name) => format!("name {name:?}"),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Hash => "'#'".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }

    /// Whether this token is a specific operator.
    pub fn is_operator(&self, op: &str) -> bool {
        matches!(self, TokenKind::Operator(s) if s == op)
    }
}

/// Whether a character can appear in an identifier. Identifiers may
/// contain alphanumerics plus `$`, `'`, and `_`; a token that starts with
/// a digit is a number, not an identifier.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '$' | '\'' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_chars() {
        for c in "abcXYZ019$'_".chars() {
            assert!(is_identifier_char(c), "{c:?}");
        }
        for c in "+-*/ \t\n#~(".chars() {
            assert!(!is_identifier_char(c), "{c:?}");
        }
    }

    #[test]
    fn is_operator_matches_exact_text() {
        let kind = TokenKind::Operator("->".to_string());
        assert!(kind.is_operator("->"));
        assert!(!kind.is_operator("-"));
        assert!(!TokenKind::Hash.is_operator("#"));
    }

    #[test]
    fn describe_names_the_token() {
        assert_eq!(TokenKind::Eof.describe(), "end of input");
        assert_eq!(
            TokenKind::Name("abc".to_string()).describe(),
            "name \"abc\""
        );
        assert_eq!(TokenKind::IntLit(BigInt::from(7)).describe(), "integer literal 7");
    }
}

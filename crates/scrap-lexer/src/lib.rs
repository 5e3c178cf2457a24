// Scrapscript lexer -- turns source text into a token stream.
//
// Whitespace is insignificant; comments run from `--` to end of line.
// Operators are recognized by longest match against the precedence table,
// so `>>` beats `>` and `...` beats `.`. Every token carries a source
// extent whose end points at its last character.

mod cursor;

use num_bigint::BigInt;

use cursor::Cursor;
use scrap_common::error::{LexError, LexErrorKind};
use scrap_common::prec;
use scrap_common::span::{SourceExtent, SourceLocation};
use scrap_common::token::{is_identifier_char, Token, TokenKind};

/// The scrapscript lexer.
///
/// Implements `Iterator<Item = Result<Token, LexError>>`; iteration ends
/// after the `Eof` token or the first error.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    token_start: SourceLocation,
    token_end: SourceLocation,
    done: bool,
}

/// Tokenize an entire source buffer. The final `Eof` token is dropped;
/// the parser treats stream exhaustion as end of input.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    for token in Lexer::new(source) {
        let token = token?;
        if token.kind == TokenKind::Eof {
            break;
        }
        tokens.push(token);
    }
    Ok(tokens)
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            token_start: SourceLocation::origin(),
            token_end: SourceLocation::origin(),
            done: false,
        }
    }

    /// Read the next token. Returns an `Eof` token at end of input.
    pub fn read_token(&mut self) -> Result<Token, LexError> {
        // Consume whitespace, re-marking the token start until a real
        // character shows up.
        let c = loop {
            self.token_start = self.cursor.loc();
            self.token_end = self.cursor.loc();
            match self.read_char() {
                None => return Ok(self.make(TokenKind::Eof)),
                Some(c) if !c.is_whitespace() => break c,
                Some(_) => {}
            }
        };

        match c {
            '"' => self.read_string(),
            '-' => {
                if self.cursor.peek() == Some('-') {
                    self.read_comment();
                    self.read_token()
                } else {
                    self.read_op('-')
                }
            }
            '#' => Ok(self.make(TokenKind::Hash)),
            '~' => {
                if self.cursor.peek() == Some('~') {
                    self.read_char();
                    self.read_bytes()
                } else {
                    Err(self.error(LexErrorKind::UnexpectedCharacter('~')))
                }
            }
            '(' => Ok(self.make(TokenKind::LParen)),
            ')' => Ok(self.make(TokenKind::RParen)),
            '[' => Ok(self.make(TokenKind::LBracket)),
            ']' => Ok(self.make(TokenKind::RBracket)),
            '{' => Ok(self.make(TokenKind::LBrace)),
            '}' => Ok(self.make(TokenKind::RBrace)),
            c if c.is_ascii_digit() => self.read_number(c),
            c if prec::is_operator_char(c) => self.read_op(c),
            c if is_identifier_char(c) => self.read_var(c),
            c => Err(self.error(LexErrorKind::UnexpectedCharacter(c))),
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Consume one character, recording the extent end at its position.
    fn read_char(&mut self) -> Option<char> {
        self.token_end = self.cursor.loc();
        self.cursor.advance()
    }

    fn make(&self, kind: TokenKind) -> Token {
        Token::new(kind, SourceExtent::new(self.token_start, self.token_end))
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        LexError::new(kind, SourceExtent::new(self.token_start, self.token_end))
    }

    // ── Token readers ──────────────────────────────────────────────────

    /// `"..."` with no escape processing.
    fn read_string(&mut self) -> Result<Token, LexError> {
        let mut buf = String::new();
        loop {
            match self.read_char() {
                None => return Err(self.error(LexErrorKind::UnexpectedEof("string"))),
                Some('"') => break,
                Some(c) => buf.push(c),
            }
        }
        Ok(self.make(TokenKind::StringLit(buf)))
    }

    /// `--` to end of line.
    fn read_comment(&mut self) {
        while let Some(c) = self.read_char() {
            if c == '\n' {
                break;
            }
        }
    }

    /// A run of digits with at most one `.`. A trailing `.` still yields a
    /// float; a second `.` is an error.
    fn read_number(&mut self, first: char) -> Result<Token, LexError> {
        let mut buf = String::from(first);
        let mut has_decimal = false;
        while let Some(c) = self.cursor.peek() {
            if c == '.' {
                if has_decimal {
                    return Err(self.error(LexErrorKind::SecondDecimalPoint));
                }
                has_decimal = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            self.read_char();
            buf.push(c);
        }
        if has_decimal {
            let value: f64 = buf.parse().expect("digit run with one dot parses as f64");
            Ok(self.make(TokenKind::FloatLit(value)))
        } else {
            let value: BigInt = buf.parse().expect("digit run parses as integer");
            Ok(self.make(TokenKind::IntLit(value)))
        }
    }

    /// Longest-match operator recognition against the precedence table.
    fn read_op(&mut self, first: char) -> Result<Token, LexError> {
        let mut buf = String::from(first);
        while let Some(c) = self.cursor.peek() {
            let mut candidate = buf.clone();
            candidate.push(c);
            if !prec::starts_operator(&candidate) {
                break;
            }
            self.read_char();
            buf = candidate;
        }
        if prec::binding_power(&buf).is_some() {
            Ok(self.make(TokenKind::Operator(buf)))
        } else {
            Err(self.error(LexErrorKind::UnknownOperator(buf)))
        }
    }

    /// An identifier.
    fn read_var(&mut self, first: char) -> Result<Token, LexError> {
        let mut buf = String::from(first);
        while let Some(c) = self.cursor.peek() {
            if !is_identifier_char(c) {
                break;
            }
            self.read_char();
            buf.push(c);
        }
        Ok(self.make(TokenKind::Name(buf)))
    }

    /// A bytes literal after the leading `~~`: everything up to the next
    /// whitespace, split as `[base']payload`. Decoding happens in the
    /// parser; the default base is 64.
    fn read_bytes(&mut self) -> Result<Token, LexError> {
        let mut buf = String::new();
        while let Some(c) = self.cursor.peek() {
            if c.is_whitespace() {
                break;
            }
            self.read_char();
            buf.push(c);
        }
        let (base, value) = match buf.rfind('\'') {
            Some(idx) => {
                let base_text = &buf[..idx];
                let base: u32 = base_text
                    .parse()
                    .map_err(|_| self.error(LexErrorKind::InvalidBytesBase(base_text.to_string())))?;
                (base, buf[idx + 1..].to_string())
            }
            None => (64, buf),
        };
        Ok(self.make(TokenKind::BytesLit { value, base }))
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.read_token();
        match &result {
            Ok(token) if token.kind == TokenKind::Eof => self.done = true,
            Err(_) => self.done = true,
            _ => {}
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_simple_binop() {
        assert_eq!(
            kinds("1 + 2"),
            vec![
                TokenKind::IntLit(BigInt::from(1)),
                TokenKind::Operator("+".into()),
                TokenKind::IntLit(BigInt::from(2)),
            ]
        );
    }

    #[test]
    fn lex_empty_input_is_empty() {
        assert_eq!(kinds(""), Vec::<TokenKind>::new());
        assert_eq!(kinds("   \n\t "), Vec::<TokenKind>::new());
    }

    #[test]
    fn lex_trailing_whitespace() {
        assert_eq!(kinds("- "), vec![TokenKind::Operator("-".into())]);
        assert_eq!(kinds("123 "), vec![TokenKind::IntLit(BigInt::from(123))]);
        assert_eq!(kinds("[ "), vec![TokenKind::LBracket]);
    }

    #[test]
    fn lex_comment_is_skipped() {
        assert_eq!(kinds("-- 1\n2"), vec![TokenKind::IntLit(BigInt::from(2))]);
        assert_eq!(kinds("-- only"), Vec::<TokenKind>::new());
    }

    #[test]
    fn lex_lone_tilde_is_an_error() {
        let err = tokenize("~").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('~'));
        let err = tokenize("~=").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('~'));
    }

    #[test]
    fn lex_double_dot_is_an_error() {
        let err = tokenize("..").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnknownOperator("..".into()));
    }

    #[test]
    fn lex_triple_dot_is_spread() {
        assert_eq!(kinds("..."), vec![TokenKind::Operator("...".into())]);
    }
}

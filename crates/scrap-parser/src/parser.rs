//! The precedence-climbing parser.
//!
//! `parse_expr` loops while the next operator's left binding strength is
//! at least the ambient precedence, parsing right-hand sides at the
//! operator's right strength. Adjacency is application at the
//! juxtaposition strength. `parse_atom` handles literals, grouping,
//! lists, records, variants, spreads, match functions, and unary minus.
//!
//! A handful of operators build dedicated nodes instead of `Binop`:
//! `=` (assignment), `->` (functions), `.` (where), `?` (assert),
//! `@` (access). `|>`/`<|` desugar to application and `>>`/`<<` to a
//! fresh-variable lambda; the fresh-name counter lives on the parser, so
//! every parse starts its gensyms at `$v0`.

use indexmap::IndexMap;

use scrap_common::prec::{self, APPLY};
use scrap_common::token::{Token, TokenKind};

use crate::ast::{BinopKind, Expr, ExprRef, MatchCase};
use crate::bytes::decode_bytes;
use crate::error::ParseError;

/// List and record elements parse at this strength so that `,` (strength
/// 1) terminates them.
const ELEMENT_PREC: f64 = 2.0;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    gensym_counter: u32,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            gensym_counter: 0,
        }
    }

    /// Parse a complete expression from the token stream.
    pub fn parse(mut self) -> Result<ExprRef, ParseError> {
        self.parse_expr(0.0)
    }

    // ── Token stream ───────────────────────────────────────────────────

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_token(&mut self) -> Result<Token, ParseError> {
        self.bump().ok_or(ParseError::UnexpectedEof)
    }

    fn gensym(&mut self) -> String {
        let n = self.gensym_counter;
        self.gensym_counter += 1;
        format!("$v{n}")
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn parse_expr(&mut self, ambient: f64) -> Result<ExprRef, ParseError> {
        let mut left = self.parse_atom()?;
        loop {
            // Decide on the next step before touching the stream.
            let infix_power = match self.peek() {
                None => break,
                Some(TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace) => break,
                Some(TokenKind::Operator(op)) => {
                    let power = prec::binding_power(op)
                        .expect("the lexer only emits operators from the table");
                    if power.left < ambient {
                        break;
                    }
                    Some(power.right)
                }
                // Juxtaposition: function application.
                Some(_) => {
                    if APPLY.left < ambient {
                        break;
                    }
                    None
                }
            };
            left = match infix_power {
                Some(right_power) => {
                    let token = self.bump().expect("peeked above");
                    self.parse_infix(token, left, right_power)?
                }
                None => {
                    let arg = self.parse_expr(APPLY.right)?;
                    Expr::apply(left, arg)
                }
            };
        }
        Ok(left)
    }

    fn parse_infix(
        &mut self,
        token: Token,
        left: ExprRef,
        right_power: f64,
    ) -> Result<ExprRef, ParseError> {
        let op = match &token.kind {
            TokenKind::Operator(op) => op.clone(),
            _ => return Err(ParseError::UnexpectedToken(token)),
        };
        Ok(match op.as_str() {
            "=" => {
                if left.as_var().is_none() {
                    return Err(ParseError::ExpectedVariableInAssignment);
                }
                Expr::assign(left, self.parse_expr(right_power)?)
            }
            "->" => Expr::function(left, self.parse_expr(right_power)?),
            "|>" => {
                let func = self.parse_expr(right_power)?;
                Expr::apply(func, left)
            }
            "<|" => Expr::apply(left, self.parse_expr(right_power)?),
            ">>" => {
                let right = self.parse_expr(right_power)?;
                let name = self.gensym();
                Expr::function(
                    Expr::var(name.clone()),
                    Expr::apply(right, Expr::apply(left, Expr::var(name))),
                )
            }
            "<<" => {
                let right = self.parse_expr(right_power)?;
                let name = self.gensym();
                Expr::function(
                    Expr::var(name.clone()),
                    Expr::apply(left, Expr::apply(right, Expr::var(name))),
                )
            }
            "." => Expr::where_expr(left, self.parse_expr(right_power)?),
            "?" => Expr::assert_expr(left, self.parse_expr(right_power)?),
            "@" => Expr::access(left, self.parse_expr(right_power)?),
            other => match BinopKind::from_str(other) {
                Some(kind) => Expr::binop(kind, left, self.parse_expr(right_power)?),
                None => return Err(ParseError::UnexpectedToken(token)),
            },
        })
    }

    // ── Atoms ──────────────────────────────────────────────────────────

    fn parse_atom(&mut self) -> Result<ExprRef, ParseError> {
        let token = self.expect_token()?;
        match token.kind {
            TokenKind::IntLit(value) => Ok(Expr::int(value)),
            TokenKind::FloatLit(value) => Ok(Expr::float(value)),
            TokenKind::StringLit(value) => Ok(Expr::string(value)),
            TokenKind::Name(name) => Ok(Expr::var(name)),
            TokenKind::BytesLit { ref value, base } => {
                Ok(Expr::bytes(decode_bytes(value, base)?))
            }
            TokenKind::Hash => self.parse_variant(),
            TokenKind::Operator(ref op) if op == "..." => Ok(self.parse_spread()),
            TokenKind::Operator(ref op) if op == "|" => self.parse_match_function(),
            TokenKind::Operator(ref op) if op == "-" => self.parse_negation(),
            TokenKind::LParen => self.parse_group(),
            TokenKind::LBracket => self.parse_list(),
            TokenKind::LBrace => self.parse_record(),
            _ => Err(ParseError::UnexpectedToken(token)),
        }
    }

    /// `#tag value`. The payload parses just above application strength so
    /// `f #true () #false ()` applies `f` to both variants, and variants
    /// work as match patterns and in boolean expressions.
    fn parse_variant(&mut self) -> Result<ExprRef, ParseError> {
        let tag_token = self.expect_token()?;
        match tag_token.kind {
            TokenKind::Name(tag) => {
                let value = self.parse_expr(APPLY.right + 1.0)?;
                Ok(Expr::variant(tag, value))
            }
            _ => Err(ParseError::UnexpectedToken(tag_token)),
        }
    }

    /// `...` optionally followed by a name to bind the remainder.
    fn parse_spread(&mut self) -> ExprRef {
        if let Some(TokenKind::Name(name)) = self.peek() {
            let name = name.clone();
            self.pos += 1;
            Expr::spread(Some(name))
        } else {
            Expr::spread(None)
        }
    }

    /// Alternatives parse as `Function`s at the strength of `|` and are
    /// split into cases; cases accumulate while a `|` is peekable.
    fn parse_match_function(&mut self) -> Result<ExprRef, ParseError> {
        let bar = prec::binding_power("|").expect("| is in the table");
        let mut cases = vec![self.parse_case(bar.right)?];
        while matches!(self.peek(), Some(kind) if kind.is_operator("|")) {
            self.pos += 1;
            cases.push(self.parse_case(bar.right)?);
        }
        Ok(Expr::match_function(cases))
    }

    fn parse_case(&mut self, power: f64) -> Result<MatchCase, ParseError> {
        let expr = self.parse_expr(power)?;
        match &*expr {
            Expr::Function { arg, body } => Ok(MatchCase::new(arg.clone(), body.clone())),
            _ => Err(ParseError::ExpectedCaseArm),
        }
    }

    /// Unary minus binds above every binary operator and above
    /// application, so `-a b` is `(-a) b`. Negative literals fold.
    fn parse_negation(&mut self) -> Result<ExprRef, ParseError> {
        let operand = self.parse_expr(prec::highest() + 1.0)?;
        match &*operand {
            Expr::Int(value) => return Ok(Expr::int(-value.clone())),
            Expr::Float(value) => return Ok(Expr::float(-*value)),
            _ => {}
        }
        Ok(Expr::binop(BinopKind::Sub, Expr::int(0), operand))
    }

    /// `()` is a hole; `(e)` is `e`.
    fn parse_group(&mut self) -> Result<ExprRef, ParseError> {
        if matches!(self.peek(), Some(TokenKind::RParen)) {
            self.pos += 1;
            return Ok(Expr::hole());
        }
        let inner = self.parse_expr(0.0)?;
        let closing = self.expect_token()?;
        if closing.kind != TokenKind::RParen {
            return Err(ParseError::UnexpectedToken(closing));
        }
        Ok(inner)
    }

    fn parse_list(&mut self) -> Result<ExprRef, ParseError> {
        let mut items: Vec<ExprRef> = Vec::new();
        if matches!(self.peek(), Some(TokenKind::RBracket)) {
            self.pos += 1;
            return Ok(Expr::list(items));
        }
        items.push(self.parse_expr(ELEMENT_PREC)?);
        loop {
            let separator = self.expect_token()?;
            if separator.kind == TokenKind::RBracket {
                break;
            }
            let last = items.last().expect("list has at least one element");
            if matches!(&**last, Expr::Spread(_)) {
                return Err(ParseError::SpreadNotLast { container: "list" });
            }
            items.push(self.parse_expr(ELEMENT_PREC)?);
        }
        Ok(Expr::list(items))
    }

    fn parse_record(&mut self) -> Result<ExprRef, ParseError> {
        let mut fields: IndexMap<String, ExprRef> = IndexMap::new();
        if matches!(self.peek(), Some(TokenKind::RBrace)) {
            self.pos += 1;
            return Ok(Expr::record(fields));
        }
        let (name, value) = self.parse_record_entry()?;
        let mut last_was_spread = matches!(&*value, Expr::Spread(_));
        fields.insert(name, value);
        loop {
            let separator = self.expect_token()?;
            if separator.kind == TokenKind::RBrace {
                break;
            }
            if last_was_spread {
                return Err(ParseError::SpreadNotLast { container: "record" });
            }
            let (name, value) = self.parse_record_entry()?;
            last_was_spread = matches!(&*value, Expr::Spread(_));
            fields.insert(name, value);
        }
        Ok(Expr::record(fields))
    }

    /// One record element: `name = expr`, or a spread (stored under the
    /// `...` key so field order records its position).
    fn parse_record_entry(&mut self) -> Result<(String, ExprRef), ParseError> {
        let entry = self.parse_expr(ELEMENT_PREC)?;
        match &*entry {
            Expr::Spread(_) => Ok(("...".to_string(), entry.clone())),
            Expr::Assign { name, value } => {
                let field = name
                    .as_var()
                    .expect("assignment left sides are variables")
                    .to_string();
                Ok((field, value.clone()))
            }
            _ => Err(ParseError::ExpectedRecordEntry),
        }
    }
}

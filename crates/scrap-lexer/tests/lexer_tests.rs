//! Integration tests for the scrapscript lexer: token streams, operator
//! longest-match, bytes literals, and source extent accuracy.

use num_bigint::BigInt;
use scrap_lexer::tokenize;
use scrap_common::token::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("tokenize should succeed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn int(v: i64) -> TokenKind {
    TokenKind::IntLit(BigInt::from(v))
}

fn op(s: &str) -> TokenKind {
    TokenKind::Operator(s.to_string())
}

fn name(s: &str) -> TokenKind {
    TokenKind::Name(s.to_string())
}

// ── Token streams ──────────────────────────────────────────────────────

#[test]
fn tokenize_numbers() {
    assert_eq!(kinds("1"), vec![int(1)]);
    assert_eq!(kinds("123"), vec![int(123)]);
    assert_eq!(kinds("3.14"), vec![TokenKind::FloatLit(3.14)]);
    // A trailing dot still makes a float.
    assert_eq!(kinds("10."), vec![TokenKind::FloatLit(10.0)]);
}

#[test]
fn tokenize_huge_integer() {
    let source = "123456789012345678901234567890";
    let expected: BigInt = source.parse().unwrap();
    assert_eq!(kinds(source), vec![TokenKind::IntLit(expected)]);
}

#[test]
fn tokenize_negative_number_is_operator_then_literal() {
    assert_eq!(kinds("-123"), vec![op("-"), int(123)]);
    assert_eq!(kinds("-3.14"), vec![op("-"), TokenKind::FloatLit(3.14)]);
}

#[test]
fn tokenize_binops_with_and_without_spaces() {
    let ops = [
        "+", "-", "*", "/", "^", "%", "==", "/=", "<", ">", "<=", ">=", "&&", "||", "++", ">+",
        "+<",
    ];
    for o in ops {
        assert_eq!(
            kinds(&format!("a {o} b")),
            vec![name("a"), op(o), name("b")],
            "with spaces: {o}"
        );
        assert_eq!(
            kinds(&format!("a{o}b")),
            vec![name("a"), op(o), name("b")],
            "without spaces: {o}"
        );
    }
}

#[test]
fn tokenize_dollar_names() {
    assert_eq!(kinds("$sha1'foo"), vec![name("$sha1'foo")]);
    assert_eq!(kinds("$$bills"), vec![name("$$bills")]);
}

#[test]
fn tokenize_string_with_spaces() {
    assert_eq!(
        kinds("\"hello world\""),
        vec![TokenKind::StringLit("hello world".into())]
    );
}

#[test]
fn tokenize_unterminated_string_is_eof_error() {
    use scrap_common::error::LexErrorKind;
    let err = tokenize("\"hello").unwrap_err();
    assert_eq!(err.kind, LexErrorKind::UnexpectedEof("string"));
}

#[test]
fn tokenize_function_arrows() {
    assert_eq!(
        kinds("a -> b -> a + b"),
        vec![
            name("a"),
            op("->"),
            name("b"),
            op("->"),
            name("a"),
            op("+"),
            name("b"),
        ]
    );
    assert_eq!(
        kinds("a->b->a+b"),
        vec![
            name("a"),
            op("->"),
            name("b"),
            op("->"),
            name("a"),
            op("+"),
            name("b"),
        ]
    );
}

#[test]
fn tokenize_where_assert_hastype() {
    assert_eq!(kinds("a . b"), vec![name("a"), op("."), name("b")]);
    assert_eq!(kinds("a ? b"), vec![name("a"), op("?"), name("b")]);
    assert_eq!(kinds("a : b"), vec![name("a"), op(":"), name("b")]);
    assert_eq!(kinds("a!b"), vec![name("a"), op("!"), name("b")]);
}

#[test]
fn tokenize_pipes_and_compose() {
    assert_eq!(kinds("x |> f"), vec![name("x"), op("|>"), name("f")]);
    assert_eq!(kinds("f <| x"), vec![name("f"), op("<|"), name("x")]);
    assert_eq!(kinds("f >> g"), vec![name("f"), op(">>"), name("g")]);
    assert_eq!(kinds("f << g"), vec![name("f"), op("<<"), name("g")]);
}

#[test]
fn tokenize_adjacent_separator_operators() {
    assert_eq!(kinds(",:"), vec![op(","), op(":")]);
}

#[test]
fn tokenize_lists_and_records() {
    assert_eq!(
        kinds("[1,2]"),
        vec![TokenKind::LBracket, int(1), op(","), int(2), TokenKind::RBracket]
    );
    assert_eq!(
        kinds("{ a = 4 }"),
        vec![
            TokenKind::LBrace,
            name("a"),
            op("="),
            int(4),
            TokenKind::RBrace,
        ]
    );
    assert_eq!(kinds("( )"), vec![TokenKind::LParen, TokenKind::RParen]);
}

#[test]
fn tokenize_spreads() {
    assert_eq!(
        kinds("[1,...rest]"),
        vec![
            TokenKind::LBracket,
            int(1),
            op(","),
            op("..."),
            name("rest"),
            TokenKind::RBracket,
        ]
    );
    assert_eq!(
        kinds("{x=1,...}"),
        vec![
            TokenKind::LBrace,
            name("x"),
            op("="),
            int(1),
            op(","),
            op("..."),
            TokenKind::RBrace,
        ]
    );
}

#[test]
fn tokenize_variants() {
    assert_eq!(kinds("#abc"), vec![TokenKind::Hash, name("abc")]);
    assert_eq!(kinds("# \n\r\n\t abc"), vec![TokenKind::Hash, name("abc")]);
}

#[test]
fn tokenize_match_function() {
    assert_eq!(
        kinds("g = | 1 -> 2 | 2 -> 3"),
        vec![
            name("g"),
            op("="),
            op("|"),
            int(1),
            op("->"),
            int(2),
            op("|"),
            int(2),
            op("->"),
            int(3),
        ]
    );
}

// ── Bytes literals ─────────────────────────────────────────────────────

#[test]
fn tokenize_bytes_defaults_to_base64() {
    assert_eq!(
        kinds("~~QUJD"),
        vec![TokenKind::BytesLit {
            value: "QUJD".into(),
            base: 64,
        }]
    );
    assert_eq!(
        kinds("~~"),
        vec![TokenKind::BytesLit {
            value: String::new(),
            base: 64,
        }]
    );
}

#[test]
fn tokenize_bytes_with_explicit_bases() {
    assert_eq!(
        kinds("~~85'K|(_"),
        vec![TokenKind::BytesLit {
            value: "K|(_".into(),
            base: 85,
        }]
    );
    assert_eq!(
        kinds("~~32'IFBEG==="),
        vec![TokenKind::BytesLit {
            value: "IFBEG===".into(),
            base: 32,
        }]
    );
    assert_eq!(
        kinds("~~16'414243"),
        vec![TokenKind::BytesLit {
            value: "414243".into(),
            base: 16,
        }]
    );
}

// ── Source extents ─────────────────────────────────────────────────────

#[test]
fn extents_for_names_across_lines() {
    let tokens = tokenize("aa bbbb \n ccccc ddddddd").unwrap();
    let exts: Vec<_> = tokens.iter().map(|t| t.extent).collect();

    assert_eq!((exts[0].start.line, exts[0].end.line), (1, 1));
    assert_eq!((exts[0].start.col, exts[0].end.col), (1, 2));
    assert_eq!((exts[0].start.byte, exts[0].end.byte), (0, 1));

    assert_eq!((exts[1].start.col, exts[1].end.col), (4, 7));
    assert_eq!((exts[1].start.byte, exts[1].end.byte), (3, 6));

    assert_eq!((exts[2].start.line, exts[2].end.line), (2, 2));
    assert_eq!((exts[2].start.col, exts[2].end.col), (2, 6));
    assert_eq!((exts[2].start.byte, exts[2].end.byte), (10, 14));

    assert_eq!((exts[3].start.col, exts[3].end.col), (8, 14));
    assert_eq!((exts[3].start.byte, exts[3].end.byte), (16, 22));
}

#[test]
fn extents_for_multibyte_strings() {
    // 9 characters surrounded by quotes; 25 bytes in total.
    let tokens = tokenize("\"今日は、Maxさん。\"").unwrap();
    let ext = tokens[0].extent;
    assert_eq!((ext.start.col, ext.end.col), (1, 12));
    assert_eq!((ext.start.byte, ext.end.byte), (0, 25));
}

#[test]
fn extents_for_operators() {
    let tokens = tokenize("> >>").unwrap();
    let a = tokens[0].extent;
    let b = tokens[1].extent;
    assert_eq!((a.start.col, a.end.col), (1, 1));
    assert_eq!((a.start.byte, a.end.byte), (0, 0));
    assert_eq!((b.start.col, b.end.col), (3, 4));
    assert_eq!((b.start.byte, b.end.byte), (2, 3));
}

#[test]
fn extents_for_bytes_literals() {
    let tokens = tokenize("~~QUJD ~~85'K|(_").unwrap();
    let a = tokens[0].extent;
    let b = tokens[1].extent;
    assert_eq!((a.start.col, a.end.col), (1, 6));
    assert_eq!((a.start.byte, a.end.byte), (0, 5));
    assert_eq!((b.start.col, b.end.col), (8, 16));
    assert_eq!((b.start.byte, b.end.byte), (7, 15));
}

#[test]
fn extents_for_numbers() {
    let tokens = tokenize("123 123.456").unwrap();
    let a = tokens[0].extent;
    let b = tokens[1].extent;
    assert_eq!((a.start.col, a.end.col), (1, 3));
    assert_eq!((b.start.col, b.end.col), (5, 11));
    assert_eq!((b.start.byte, b.end.byte), (4, 10));
}

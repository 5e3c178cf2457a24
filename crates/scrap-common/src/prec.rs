//! The operator precedence table.
//!
//! Every operator has a left and a right binding strength. The parser's
//! precedence-climbing loop continues while the next operator's left
//! strength is at least the ambient precedence, and parses the right-hand
//! side at the operator's right strength; the pretty printer consults the
//! same table to decide where parentheses are required. The lexer uses the
//! table for longest-match operator recognition, so `>>` wins over `>` and
//! `...` over `.`.

/// Left and right binding strengths for one operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prec {
    pub left: f64,
    pub right: f64,
}

/// Operators whose right-hand side re-grabs the same strength
/// (`a + b + c` parses as `a + (b + c)`).
const fn lp(n: f64) -> Prec {
    Prec {
        left: n,
        right: n - 0.1,
    }
}

/// Operators whose right-hand side stops at the same strength
/// (`a / b * c` parses as `(a / b) * c`).
const fn rp(n: f64) -> Prec {
    Prec {
        left: n,
        right: n + 0.1,
    }
}

/// Non-associative operators (comparisons).
const fn np(n: f64) -> Prec {
    Prec { left: n, right: n }
}

/// Separators: bind at `n` on the left but reset the right side, so list
/// and record elements parse independently.
const fn xp(n: f64) -> Prec {
    Prec { left: n, right: 0.0 }
}

/// Juxtaposition (function application). Not a token; the parser applies
/// this strength whenever two expressions are adjacent. The right side
/// binds slightly stronger so application associates left-to-right.
pub const APPLY: Prec = rp(1000.0);

/// The full operator table. `#` never reaches the parser as an operator
/// token (the lexer emits a dedicated token first) but its strength is
/// used when printing variants.
pub static TABLE: &[(&str, Prec)] = &[
    ("::", lp(2000.0)),
    ("@", rp(1001.0)),
    (">>", lp(14.0)),
    ("<<", lp(14.0)),
    ("^", rp(13.0)),
    ("*", rp(12.0)),
    ("/", rp(12.0)),
    ("//", lp(12.0)),
    ("%", lp(12.0)),
    ("+", lp(11.0)),
    ("-", lp(11.0)),
    (">*", rp(10.0)),
    ("++", rp(10.0)),
    (">+", lp(10.0)),
    ("+<", rp(10.0)),
    ("==", np(9.0)),
    ("/=", np(9.0)),
    ("<", np(9.0)),
    (">", np(9.0)),
    ("<=", np(9.0)),
    (">=", np(9.0)),
    ("&&", rp(8.0)),
    ("||", rp(7.0)),
    ("|>", rp(6.0)),
    ("<|", lp(6.0)),
    ("#", lp(5.5)),
    ("->", lp(5.0)),
    ("|", rp(4.5)),
    (":", lp(4.5)),
    ("=", rp(4.0)),
    ("!", lp(3.0)),
    (".", rp(3.0)),
    ("?", rp(3.0)),
    (",", xp(1.0)),
    ("...", xp(0.0)),
];

/// Look up an operator's binding strengths.
pub fn binding_power(op: &str) -> Option<Prec> {
    TABLE
        .iter()
        .find(|(name, _)| *name == op)
        .map(|(_, prec)| *prec)
}

/// Whether `buf` is a prefix of at least one operator. Drives the lexer's
/// longest-match loop.
pub fn starts_operator(buf: &str) -> bool {
    TABLE.iter().any(|(name, _)| name.starts_with(buf))
}

/// Whether `c` appears in any operator.
pub fn is_operator_char(c: char) -> bool {
    TABLE.iter().any(|(name, _)| name.contains(c))
}

/// The strongest binding strength in the table. Unary minus parses its
/// operand just above this, so `-a op b` is always `(-a) op b`.
pub fn highest() -> f64 {
    TABLE
        .iter()
        .fold(0.0, |acc, (_, p)| acc.max(p.left).max(p.right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_operators() {
        assert_eq!(binding_power("+"), Some(lp(11.0)));
        assert_eq!(binding_power("^"), Some(rp(13.0)));
        assert_eq!(binding_power("=="), Some(np(9.0)));
        assert_eq!(binding_power(","), Some(xp(1.0)));
        assert_eq!(binding_power("no-such"), None);
    }

    #[test]
    fn apply_binds_right_slightly_stronger() {
        assert!(APPLY.right > APPLY.left);
    }

    #[test]
    fn longest_match_prefixes() {
        assert!(starts_operator(">"));
        assert!(starts_operator(">>"));
        assert!(starts_operator(".."));
        assert!(!starts_operator(">>>"));
        assert!(!starts_operator("~"));
    }

    #[test]
    fn operator_chars() {
        for c in "+-*/^%=<>&|!.?,:@#".chars() {
            assert!(is_operator_char(c), "{c:?} should be an operator char");
        }
        assert!(!is_operator_char(' '));
        assert!(!is_operator_char('a'));
        assert!(!is_operator_char('~'));
    }

    #[test]
    fn highest_is_the_cons_strength() {
        assert_eq!(highest(), 2000.0);
    }

    #[test]
    fn arrow_right_side_regrabs_arrow() {
        // `a -> b -> c` must parse as `a -> (b -> c)`: the right strength
        // of `->` sits below its left strength.
        let arrow = binding_power("->").unwrap();
        assert!(arrow.right < arrow.left);
    }
}

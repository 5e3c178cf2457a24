//! The scrapscript expression tree.
//!
//! One enum covers every syntactic form and every runtime value: literals
//! and variables come out of the parser, while closures, native functions,
//! and environment objects are synthesized by the evaluator. Nodes are
//! immutable once built, with two deliberate exceptions behind `RefCell`:
//! list elements and closure environments, which the deserializer
//! back-patches when resolving cyclic references and which the evaluator
//! mutates once to install a closure's self-binding.

mod pretty;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use num_bigint::BigInt;
use rustc_hash::FxHashMap;
use scrap_common::error::EvalError;

pub use pretty::pretty;

/// Shared handle to an expression node. Values alias freely (a closure's
/// environment references the values it captured), so everything is
/// reference-counted.
pub type ExprRef = Rc<Expr>;

/// An evaluation environment: names to values. Extension copies the map;
/// evaluation never mutates a caller's environment.
pub type Env = FxHashMap<String, ExprRef>;

/// Host callback backing a `NativeFunction` node.
pub type NativeFn = fn(ExprRef) -> Result<ExprRef, EvalError>;

/// An expression (or value -- the two share one representation).
#[derive(Debug, PartialEq)]
pub enum Expr {
    /// Arbitrary-precision integer literal.
    Int(BigInt),
    /// 64-bit float literal.
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    /// `()`
    Hole,
    Var(String),
    /// `...` or `...name`; only meaningful in pattern position.
    Spread(Option<String>),
    /// `#tag value`. Booleans are `#true ()` and `#false ()`.
    Variant { tag: String, value: ExprRef },
    Binop {
        op: BinopKind,
        left: ExprRef,
        right: ExprRef,
    },
    List(RefCell<Vec<ExprRef>>),
    /// Field order is preserved for printing; equality ignores it.
    Record(IndexMap<String, ExprRef>),
    /// `x = e`. The left side is always a `Var`.
    Assign { name: ExprRef, value: ExprRef },
    /// `arg -> body`. In evaluated functions `arg` is always a `Var`;
    /// match-function alternatives parse through this form with an
    /// arbitrary pattern on the left before being split into cases.
    Function { arg: ExprRef, body: ExprRef },
    /// `| p1 -> b1 | p2 -> b2 ...`
    MatchFunction(Vec<MatchCase>),
    Apply { func: ExprRef, arg: ExprRef },
    /// `body . binding` -- a reversed let.
    Where { body: ExprRef, binding: ExprRef },
    /// `value ? cond`
    Assert { value: ExprRef, cond: ExprRef },
    /// `obj @ at` -- record field or list index access.
    Access { obj: ExprRef, at: ExprRef },
    /// A function value paired with its captured environment.
    Closure {
        env: RefCell<Env>,
        func: ExprRef,
    },
    NativeFunction { name: String, func: NativeFn },
    /// The result of evaluating an `Assign`; carries the extended
    /// environment.
    EnvObject(Env),
}

/// One alternative of a match function.
#[derive(Debug, PartialEq)]
pub struct MatchCase {
    pub pattern: ExprRef,
    pub body: ExprRef,
}

impl MatchCase {
    pub fn new(pattern: ExprRef, body: ExprRef) -> Self {
        MatchCase { pattern, body }
    }
}

impl Expr {
    pub fn int(value: impl Into<BigInt>) -> ExprRef {
        Rc::new(Expr::Int(value.into()))
    }

    pub fn float(value: f64) -> ExprRef {
        Rc::new(Expr::Float(value))
    }

    pub fn string(value: impl Into<String>) -> ExprRef {
        Rc::new(Expr::String(value.into()))
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> ExprRef {
        Rc::new(Expr::Bytes(value.into()))
    }

    pub fn hole() -> ExprRef {
        Rc::new(Expr::Hole)
    }

    pub fn var(name: impl Into<String>) -> ExprRef {
        Rc::new(Expr::Var(name.into()))
    }

    pub fn spread(name: Option<String>) -> ExprRef {
        Rc::new(Expr::Spread(name))
    }

    pub fn variant(tag: impl Into<String>, value: ExprRef) -> ExprRef {
        Rc::new(Expr::Variant {
            tag: tag.into(),
            value,
        })
    }

    pub fn binop(op: BinopKind, left: ExprRef, right: ExprRef) -> ExprRef {
        Rc::new(Expr::Binop { op, left, right })
    }

    pub fn list(items: Vec<ExprRef>) -> ExprRef {
        Rc::new(Expr::List(RefCell::new(items)))
    }

    pub fn record(fields: IndexMap<String, ExprRef>) -> ExprRef {
        Rc::new(Expr::Record(fields))
    }

    pub fn assign(name: ExprRef, value: ExprRef) -> ExprRef {
        Rc::new(Expr::Assign { name, value })
    }

    pub fn function(arg: ExprRef, body: ExprRef) -> ExprRef {
        Rc::new(Expr::Function { arg, body })
    }

    pub fn match_function(cases: Vec<MatchCase>) -> ExprRef {
        Rc::new(Expr::MatchFunction(cases))
    }

    pub fn apply(func: ExprRef, arg: ExprRef) -> ExprRef {
        Rc::new(Expr::Apply { func, arg })
    }

    pub fn where_expr(body: ExprRef, binding: ExprRef) -> ExprRef {
        Rc::new(Expr::Where { body, binding })
    }

    pub fn assert_expr(value: ExprRef, cond: ExprRef) -> ExprRef {
        Rc::new(Expr::Assert { value, cond })
    }

    pub fn access(obj: ExprRef, at: ExprRef) -> ExprRef {
        Rc::new(Expr::Access { obj, at })
    }

    pub fn closure(env: Env, func: ExprRef) -> ExprRef {
        Rc::new(Expr::Closure {
            env: RefCell::new(env),
            func,
        })
    }

    pub fn native(name: impl Into<String>, func: NativeFn) -> ExprRef {
        Rc::new(Expr::NativeFunction {
            name: name.into(),
            func,
        })
    }

    pub fn env_object(env: Env) -> ExprRef {
        Rc::new(Expr::EnvObject(env))
    }

    /// `#true ()` or `#false ()`.
    pub fn boolean(value: bool) -> ExprRef {
        Expr::variant(if value { "true" } else { "false" }, Expr::hole())
    }

    /// Exactly `#true ()` -- the value `?` assertions require.
    pub fn is_true(&self) -> bool {
        matches!(self, Expr::Variant { tag, value } if tag == "true" && **value == Expr::Hole)
    }

    /// The variable name, if this node is a `Var`.
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }

    /// The node's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Int(_) => "Int",
            Expr::Float(_) => "Float",
            Expr::String(_) => "String",
            Expr::Bytes(_) => "Bytes",
            Expr::Hole => "Hole",
            Expr::Var(_) => "Var",
            Expr::Spread(_) => "Spread",
            Expr::Variant { .. } => "Variant",
            Expr::Binop { .. } => "Binop",
            Expr::List(_) => "List",
            Expr::Record(_) => "Record",
            Expr::Assign { .. } => "Assign",
            Expr::Function { .. } => "Function",
            Expr::MatchFunction(_) => "MatchFunction",
            Expr::Apply { .. } => "Apply",
            Expr::Where { .. } => "Where",
            Expr::Assert { .. } => "Assert",
            Expr::Access { .. } => "Access",
            Expr::Closure { .. } => "Closure",
            Expr::NativeFunction { .. } => "NativeFunction",
            Expr::EnvObject(_) => "EnvObject",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pretty(self))
    }
}

/// The closed set of binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinopKind {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Exp,
    Mod,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    BoolAnd,
    BoolOr,
    StrConcat,
    ListCons,
    ListAppend,
    RightEval,
    HasType,
    Pipe,
    ReversePipe,
}

impl BinopKind {
    /// Resolve an operator's textual form. Returns `None` for table
    /// operators that are not binops (`::`, `>*`, separators).
    pub fn from_str(op: &str) -> Option<BinopKind> {
        Some(match op {
            "+" => BinopKind::Add,
            "-" => BinopKind::Sub,
            "*" => BinopKind::Mul,
            "/" => BinopKind::Div,
            "//" => BinopKind::FloorDiv,
            "^" => BinopKind::Exp,
            "%" => BinopKind::Mod,
            "==" => BinopKind::Equal,
            "/=" => BinopKind::NotEqual,
            "<" => BinopKind::Less,
            ">" => BinopKind::Greater,
            "<=" => BinopKind::LessEqual,
            ">=" => BinopKind::GreaterEqual,
            "&&" => BinopKind::BoolAnd,
            "||" => BinopKind::BoolOr,
            "++" => BinopKind::StrConcat,
            ">+" => BinopKind::ListCons,
            "+<" => BinopKind::ListAppend,
            "!" => BinopKind::RightEval,
            ":" => BinopKind::HasType,
            "|>" => BinopKind::Pipe,
            "<|" => BinopKind::ReversePipe,
            _ => return None,
        })
    }

    pub fn to_str(self) -> &'static str {
        match self {
            BinopKind::Add => "+",
            BinopKind::Sub => "-",
            BinopKind::Mul => "*",
            BinopKind::Div => "/",
            BinopKind::FloorDiv => "//",
            BinopKind::Exp => "^",
            BinopKind::Mod => "%",
            BinopKind::Equal => "==",
            BinopKind::NotEqual => "/=",
            BinopKind::Less => "<",
            BinopKind::Greater => ">",
            BinopKind::LessEqual => "<=",
            BinopKind::GreaterEqual => ">=",
            BinopKind::BoolAnd => "&&",
            BinopKind::BoolOr => "||",
            BinopKind::StrConcat => "++",
            BinopKind::ListCons => ">+",
            BinopKind::ListAppend => "+<",
            BinopKind::RightEval => "!",
            BinopKind::HasType => ":",
            BinopKind::Pipe => "|>",
            BinopKind::ReversePipe => "<|",
        }
    }
}

impl fmt::Display for BinopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binop_kind_round_trips_through_text() {
        let ops = [
            "+", "-", "*", "/", "//", "^", "%", "==", "/=", "<", ">", "<=", ">=", "&&", "||",
            "++", ">+", "+<", "!", ":", "|>", "<|",
        ];
        for op in ops {
            let kind = BinopKind::from_str(op).unwrap_or_else(|| panic!("{op} should resolve"));
            assert_eq!(kind.to_str(), op);
        }
        assert_eq!(BinopKind::from_str("::"), None);
        assert_eq!(BinopKind::from_str(">*"), None);
        assert_eq!(BinopKind::from_str(","), None);
    }

    #[test]
    fn boolean_values() {
        assert!(Expr::boolean(true).is_true());
        assert!(!Expr::boolean(false).is_true());
        // Only the canonical `#true ()` counts.
        assert!(!Expr::variant("true", Expr::int(1)).is_true());
    }

    #[test]
    fn record_equality_ignores_field_order() {
        let mut ab = IndexMap::new();
        ab.insert("a".to_string(), Expr::int(1));
        ab.insert("b".to_string(), Expr::int(2));
        let mut ba = IndexMap::new();
        ba.insert("b".to_string(), Expr::int(2));
        ba.insert("a".to_string(), Expr::int(1));
        assert_eq!(Expr::record(ab), Expr::record(ba));
    }

    #[test]
    fn as_var_extracts_names() {
        assert_eq!(Expr::var("x").as_var(), Some("x"));
        assert_eq!(Expr::int(1).as_var(), None);
    }
}

//! Precedence-aware pretty printer.
//!
//! Composite forms print with their operator's binding strengths from the
//! shared precedence table and parenthesize whenever the ambient
//! precedence is at least the operator's left strength, so
//! `parse(pretty(e))` reproduces the tree shape. A stack of
//! currently-printing nodes guards against cycles (self-referential
//! closures, cyclic lists) by printing `...` on re-entry.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use scrap_common::prec::{self, APPLY};

use super::Expr;

/// Render an expression at the lowest ambient precedence.
pub fn pretty(expr: &Expr) -> String {
    let mut visiting = Vec::new();
    pretty_prec(expr, 0.0, &mut visiting)
}

fn pretty_prec(expr: &Expr, ambient: f64, visiting: &mut Vec<*const Expr>) -> String {
    let ptr = expr as *const Expr;
    if visiting.contains(&ptr) {
        return "...".to_string();
    }
    visiting.push(ptr);
    let result = render(expr, ambient, visiting);
    visiting.pop();
    result
}

fn op_prec(op: &str) -> prec::Prec {
    prec::binding_power(op).expect("printer operators are in the table")
}

fn render(expr: &Expr, ambient: f64, visiting: &mut Vec<*const Expr>) -> String {
    // Atoms print without surrounding parentheses.
    let (text, left) = match expr {
        Expr::Int(value) => return value.to_string(),
        Expr::Float(value) => return format_float(*value),
        Expr::String(value) => {
            return serde_json::to_string(value).expect("strings are serializable")
        }
        Expr::Bytes(value) => return format!("~~{}", STANDARD.encode(value)),
        Expr::Hole => return "()".to_string(),
        Expr::Var(name) => return name.clone(),
        Expr::Spread(None) => return "...".to_string(),
        Expr::Spread(Some(name)) => return format!("...{name}"),
        Expr::List(items) => {
            let rendered: Vec<String> = items
                .borrow()
                .iter()
                .map(|item| pretty_prec(item, 0.0, visiting))
                .collect();
            return format!("[{}]", rendered.join(", "));
        }
        Expr::Record(fields) => {
            let rendered: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{key} = {}", pretty_prec(value, 0.0, visiting)))
                .collect();
            return format!("{{{}}}", rendered.join(", "));
        }
        Expr::Closure { env, func } => {
            // Drop the borrow before rendering `func`, which may reach
            // back into this closure's environment.
            let keys = {
                let env = env.borrow();
                let mut keys: Vec<String> = env.keys().cloned().collect();
                keys.sort();
                keys
            };
            return format!("Closure({keys:?}, {})", pretty_prec(func, 0.0, visiting));
        }
        Expr::EnvObject(env) => {
            let mut keys: Vec<&String> = env.keys().collect();
            keys.sort();
            return format!("EnvObject(keys={keys:?})");
        }
        Expr::NativeFunction { name, .. } => return format!("NativeFunction(name={name})"),

        // Composite forms carry their operator's strengths.
        Expr::Variant { tag, value } => {
            let p = op_prec("#");
            (
                format!("#{tag} {}", pretty_prec(value, p.right, visiting)),
                p.left,
            )
        }
        Expr::Assign { name, value } => {
            let p = op_prec("=");
            (
                format!(
                    "{} = {}",
                    pretty_prec(name, p.left, visiting),
                    pretty_prec(value, p.right, visiting)
                ),
                p.left,
            )
        }
        Expr::Binop { op, left, right } => {
            let p = op_prec(op.to_str());
            (
                format!(
                    "{} {} {}",
                    pretty_prec(left, p.left, visiting),
                    op,
                    pretty_prec(right, p.right, visiting)
                ),
                p.left,
            )
        }
        Expr::Function { arg, body } => {
            let p = op_prec("->");
            (
                format!(
                    "{} -> {}",
                    pretty_prec(arg, p.left, visiting),
                    pretty_prec(body, p.right, visiting)
                ),
                p.left,
            )
        }
        Expr::MatchFunction(cases) => {
            let p = op_prec("|");
            let lines: Vec<String> = cases
                .iter()
                .map(|case| {
                    format!(
                        "| {} -> {}",
                        pretty_prec(&case.pattern, p.left, visiting),
                        pretty_prec(&case.body, p.right, visiting)
                    )
                })
                .collect();
            (lines.join("\n"), p.left)
        }
        Expr::Where { body, binding } => {
            let p = op_prec(".");
            (
                format!(
                    "{} . {}",
                    pretty_prec(body, p.left, visiting),
                    pretty_prec(binding, p.right, visiting)
                ),
                p.left,
            )
        }
        Expr::Assert { value, cond } => {
            let p = op_prec("!");
            (
                format!(
                    "{} ! {}",
                    pretty_prec(value, p.left, visiting),
                    pretty_prec(cond, p.right, visiting)
                ),
                p.left,
            )
        }
        Expr::Apply { func, arg } => (
            format!(
                "{} {}",
                pretty_prec(func, APPLY.left, visiting),
                pretty_prec(arg, APPLY.right, visiting)
            ),
            APPLY.left,
        ),
        Expr::Access { obj, at } => {
            let p = op_prec("@");
            (
                format!(
                    "{} @ {}",
                    pretty_prec(obj, p.left, visiting),
                    pretty_prec(at, p.right, visiting)
                ),
                p.left,
            )
        }
    };

    if ambient >= left {
        format!("({text})")
    } else {
        text
    }
}

/// Floats always show a decimal point, so `10.0` does not print as an
/// integer literal.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::super::{BinopKind, Expr, MatchCase};
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn pretty_literals() {
        assert_eq!(pretty(&Expr::Int(1.into())), "1");
        assert_eq!(pretty(&Expr::Float(3.14)), "3.14");
        assert_eq!(pretty(&Expr::Float(10.0)), "10.0");
        assert_eq!(pretty(&Expr::String("hello".into())), "\"hello\"");
        assert_eq!(pretty(&Expr::Bytes(b"abc".to_vec())), "~~YWJj");
        assert_eq!(pretty(&Expr::Hole), "()");
        assert_eq!(pretty(&Expr::Var("ref".into())), "ref");
        assert_eq!(pretty(&Expr::Spread(None)), "...");
        assert_eq!(pretty(&Expr::Spread(Some("rest".into()))), "...rest");
    }

    #[test]
    fn pretty_binop_precedence() {
        let inner_right = Expr::binop(
            BinopKind::Add,
            Expr::int(1),
            Expr::binop(BinopKind::Mul, Expr::int(2), Expr::int(3)),
        );
        assert_eq!(pretty(&inner_right), "1 + 2 * 3");

        let inner_left = Expr::binop(
            BinopKind::Mul,
            Expr::binop(BinopKind::Add, Expr::int(1), Expr::int(2)),
            Expr::int(3),
        );
        assert_eq!(pretty(&inner_left), "(1 + 2) * 3");
    }

    #[test]
    fn pretty_lists_and_records() {
        let list = Expr::list(vec![Expr::int(1), Expr::int(2), Expr::int(3)]);
        assert_eq!(pretty(&list), "[1, 2, 3]");

        let mut fields = IndexMap::new();
        fields.insert("a".to_string(), Expr::int(1));
        fields.insert("b".to_string(), Expr::int(2));
        assert_eq!(pretty(&Expr::record(fields)), "{a = 1, b = 2}");
    }

    #[test]
    fn pretty_functions() {
        let f = Expr::function(
            Expr::var("x"),
            Expr::binop(BinopKind::Add, Expr::int(1), Expr::var("x")),
        );
        assert_eq!(pretty(&f), "x -> 1 + x");

        let nested = Expr::function(
            Expr::var("x"),
            Expr::function(
                Expr::var("y"),
                Expr::binop(BinopKind::Add, Expr::var("x"), Expr::var("y")),
            ),
        );
        assert_eq!(pretty(&nested), "x -> y -> x + y");
    }

    #[test]
    fn pretty_apply_and_where() {
        assert_eq!(pretty(&Expr::apply(Expr::var("x"), Expr::var("y"))), "x y");
        let w = Expr::where_expr(
            Expr::binop(BinopKind::Add, Expr::var("a"), Expr::var("b")),
            Expr::assign(Expr::var("a"), Expr::int(1)),
        );
        assert_eq!(pretty(&w), "a + b . a = 1");
    }

    #[test]
    fn pretty_assert_uses_bang() {
        let a = Expr::assert_expr(
            Expr::int(123),
            Expr::variant("true", Expr::string("foo")),
        );
        assert_eq!(pretty(&a), "123 ! #true \"foo\"");
    }

    #[test]
    fn pretty_variants_parenthesize_functions() {
        assert_eq!(pretty(&Expr::variant("x", Expr::int(123))), "#x 123");
        let v = Expr::variant("x", Expr::function(Expr::var("a"), Expr::var("b")));
        assert_eq!(pretty(&v), "#x (a -> b)");
    }

    #[test]
    fn pretty_match_function() {
        let m = Expr::match_function(vec![MatchCase::new(Expr::var("y"), Expr::var("x"))]);
        assert_eq!(pretty(&m), "| y -> x");

        let nested = Expr::match_function(vec![
            MatchCase::new(
                Expr::var("a"),
                Expr::match_function(vec![MatchCase::new(Expr::var("b"), Expr::var("c"))]),
            ),
            MatchCase::new(
                Expr::var("x"),
                Expr::match_function(vec![MatchCase::new(Expr::var("y"), Expr::var("z"))]),
            ),
        ]);
        assert_eq!(pretty(&nested), "| a -> (| b -> c)\n| x -> (| y -> z)");
    }

    #[test]
    fn pretty_cyclic_list_prints_ellipsis() {
        let list = Expr::list(vec![]);
        if let Expr::List(items) = &*list {
            items.borrow_mut().push(list.clone());
        }
        assert_eq!(pretty(&list), "[...]");
    }

    #[test]
    fn pretty_closure_lists_captured_names() {
        let mut env = super::super::Env::default();
        env.insert("a".to_string(), Expr::int(123));
        let c = Expr::closure(env, Expr::function(Expr::var("x"), Expr::var("x")));
        assert_eq!(pretty(&c), "Closure([\"a\"], x -> x)");
    }

    #[test]
    fn pretty_native_function() {
        let n = Expr::native("times2", |x| Ok(x));
        assert_eq!(pretty(&n), "NativeFunction(name=times2)");
    }
}

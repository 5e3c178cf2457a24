//! Free-variable analysis and closure minimization.
//!
//! When the evaluator builds a closure it captures only the environment
//! entries whose names are free in the function, so closures serialize
//! compactly and unrelated bindings do not leak through them.

use rustc_hash::FxHashSet;

use scrap_parser::ast::{Env, Expr, ExprRef};

/// The set of names free in an expression.
///
/// Patterns bind: in a match case, names free in the pattern (variables
/// and named spreads) are subtracted from the body's free set. A
/// closure's free set is that of its function -- captured environment
/// keys are deliberately not subtracted, which keeps minimization
/// idempotent across serialization round-trips.
pub fn free_in(expr: &Expr) -> FxHashSet<String> {
    let mut free = FxHashSet::default();
    match expr {
        Expr::Int(_)
        | Expr::Float(_)
        | Expr::String(_)
        | Expr::Bytes(_)
        | Expr::Hole
        | Expr::NativeFunction { .. }
        | Expr::EnvObject(_) => {}
        Expr::Var(name) => {
            free.insert(name.clone());
        }
        Expr::Spread(name) => {
            if let Some(name) = name {
                free.insert(name.clone());
            }
        }
        Expr::Variant { value, .. } => return free_in(value),
        Expr::Binop { left, right, .. } => {
            free.extend(free_in(left));
            free.extend(free_in(right));
        }
        Expr::List(items) => {
            for item in items.borrow().iter() {
                free.extend(free_in(item));
            }
        }
        Expr::Record(fields) => {
            for value in fields.values() {
                free.extend(free_in(value));
            }
        }
        Expr::Function { arg, body } => {
            free.extend(free_in(body));
            for bound in free_in(arg) {
                free.remove(&bound);
            }
        }
        Expr::MatchFunction(cases) => {
            for case in cases {
                let mut case_free = free_in(&case.body);
                for bound in free_in(&case.pattern) {
                    case_free.remove(&bound);
                }
                free.extend(case_free);
            }
        }
        Expr::Apply { func, arg } => {
            free.extend(free_in(func));
            free.extend(free_in(arg));
        }
        // For records the accessor is a field name, not a variable; for
        // lists it is an index expression. It is conservatively counted
        // as a (possibly extra) free variable.
        Expr::Access { obj, at } => {
            free.extend(free_in(obj));
            free.extend(free_in(at));
        }
        Expr::Where { body, binding } => {
            free.extend(free_in(body));
            if let Expr::Assign { name, .. } = &**binding {
                if let Some(bound) = name.as_var() {
                    free.remove(bound);
                }
            }
            free.extend(free_in(binding));
        }
        Expr::Assign { value, .. } => return free_in(value),
        Expr::Assert { value, cond } => {
            free.extend(free_in(value));
            free.extend(free_in(cond));
        }
        Expr::Closure { func, .. } => return free_in(func),
    }
    free
}

/// Build a closure over `func` capturing only the bindings free in it.
pub fn minimized_closure(env: &Env, func: &ExprRef) -> ExprRef {
    let free = free_in(func);
    let captured: Env = env
        .iter()
        .filter(|(name, _)| free.contains(*name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    Expr::closure(captured, func.clone())
}

/// Re-minimize an existing closure. Used after the letrec step installs a
/// self-binding the function may not actually need.
pub fn improve_closure(closure: &ExprRef) -> ExprRef {
    match &**closure {
        Expr::Closure { env, func } => {
            let env = env.borrow();
            minimized_closure(&env, func)
        }
        _ => closure.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrap_parser::ast::BinopKind;

    fn names(set: FxHashSet<String>) -> Vec<String> {
        let mut names: Vec<String> = set.into_iter().collect();
        names.sort();
        names
    }

    #[test]
    fn literals_have_no_free_variables() {
        assert!(free_in(&Expr::Int(1.into())).is_empty());
        assert!(free_in(&Expr::Hole).is_empty());
        assert!(free_in(&Expr::Spread(None)).is_empty());
    }

    #[test]
    fn variables_are_free() {
        assert_eq!(names(free_in(&Expr::Var("x".into()))), vec!["x"]);
        assert_eq!(names(free_in(&Expr::Spread(Some("r".into())))), vec!["r"]);
    }

    #[test]
    fn function_arguments_bind() {
        let f = scrap_parser::parse("x -> x + y").unwrap();
        assert_eq!(names(free_in(&f)), vec!["y"]);
    }

    #[test]
    fn match_patterns_bind() {
        let m = scrap_parser::parse("| [x, ...xs] -> x >+ concat xs ys").unwrap();
        assert_eq!(names(free_in(&m)), vec!["concat", "ys"]);
    }

    #[test]
    fn where_binds_its_name_in_the_body_only() {
        let w = scrap_parser::parse("a + b . a = c").unwrap();
        assert_eq!(names(free_in(&w)), vec!["b", "c"]);
    }

    #[test]
    fn minimization_keeps_only_free_names() {
        let mut env = Env::default();
        env.insert("x".to_string(), Expr::int(1));
        env.insert("unrelated".to_string(), Expr::int(2));
        let func = Expr::function(
            Expr::var("y"),
            Expr::binop(BinopKind::Add, Expr::var("x"), Expr::var("y")),
        );
        let closure = minimized_closure(&env, &func);
        match &*closure {
            Expr::Closure { env, .. } => {
                let env = env.borrow();
                assert_eq!(env.len(), 1);
                assert!(env.contains_key("x"));
            }
            other => panic!("expected closure, got {other:?}"),
        }
    }
}

//! Structural pattern matching.
//!
//! `match_pattern` compares a value against a pattern and produces the
//! bindings on success or `None` on a non-match. Matching is total except
//! for floats, which are rejected with a match error.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;

use scrap_common::error::EvalError;
use scrap_parser::ast::{Env, Expr, ExprRef};

/// Match `value` against `pattern`.
///
/// `Ok(Some(bindings))` on success, `Ok(None)` on non-match. Bindings
/// from sub-patterns merge by name; on a duplicate the later one wins.
pub fn match_pattern(value: &ExprRef, pattern: &ExprRef) -> Result<Option<Env>, EvalError> {
    match &**pattern {
        Expr::Hole => Ok(match &**value {
            Expr::Hole => Some(Env::default()),
            _ => None,
        }),
        Expr::Int(expected) => Ok(match &**value {
            Expr::Int(actual) if actual == expected => Some(Env::default()),
            _ => None,
        }),
        Expr::Float(_) => Err(EvalError::Match(
            "pattern matching is not supported for Floats".to_string(),
        )),
        Expr::String(expected) => Ok(match &**value {
            Expr::String(actual) if actual == expected => Some(Env::default()),
            _ => None,
        }),
        Expr::Var(name) => {
            let mut bindings = Env::default();
            bindings.insert(name.clone(), value.clone());
            Ok(Some(bindings))
        }
        Expr::Variant {
            tag: pattern_tag,
            value: pattern_value,
        } => match &**value {
            Expr::Variant {
                tag: value_tag,
                value: inner,
            } if value_tag == pattern_tag => match_pattern(inner, pattern_value),
            _ => Ok(None),
        },
        Expr::List(pattern_items) => match_list(value, &pattern_items.borrow()),
        Expr::Record(pattern_fields) => match_record(value, pattern_fields),
        other => Err(EvalError::Runtime(format!(
            "match not implemented for {}",
            other.kind_name()
        ))),
    }
}

fn match_list(value: &ExprRef, pattern_items: &[ExprRef]) -> Result<Option<Env>, EvalError> {
    let Expr::List(value_items) = &**value else {
        return Ok(None);
    };
    let value_items = value_items.borrow();
    let mut bindings = Env::default();
    let mut used_spread = false;
    for (i, pattern_item) in pattern_items.iter().enumerate() {
        if let Expr::Spread(name) = &**pattern_item {
            used_spread = true;
            if let Some(name) = name {
                let rest: Vec<ExprRef> = value_items[i..].to_vec();
                bindings.insert(name.clone(), Expr::list(rest));
            }
            break;
        }
        if i >= value_items.len() {
            return Ok(None);
        }
        match match_pattern(&value_items[i], pattern_item)? {
            Some(part) => bindings.extend(part),
            None => return Ok(None),
        }
    }
    if !used_spread && pattern_items.len() != value_items.len() {
        return Ok(None);
    }
    Ok(Some(bindings))
}

fn match_record(
    value: &ExprRef,
    pattern_fields: &IndexMap<String, ExprRef>,
) -> Result<Option<Env>, EvalError> {
    let Expr::Record(value_fields) = &**value else {
        return Ok(None);
    };
    let mut bindings = Env::default();
    let mut used_spread = false;
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for (key, pattern_item) in pattern_fields {
        if let Expr::Spread(name) = &**pattern_item {
            used_spread = true;
            if let Some(name) = name {
                // A named spread binds the unseen fields, keeping the
                // subject's field order.
                let rest: IndexMap<String, ExprRef> = value_fields
                    .iter()
                    .filter(|(k, _)| !seen.contains(k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                bindings.insert(name.clone(), Expr::record(rest));
            }
            break;
        }
        seen.insert(key.as_str());
        let Some(value_item) = value_fields.get(key) else {
            return Ok(None);
        };
        match match_pattern(value_item, pattern_item)? {
            Some(part) => bindings.extend(part),
            None => return Ok(None),
        }
    }
    if !used_spread && pattern_fields.len() != value_fields.len() {
        return Ok(None);
    }
    Ok(Some(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matches(value: ExprRef, pattern: ExprRef) -> Env {
        match_pattern(&value, &pattern)
            .expect("no match error")
            .unwrap_or_else(|| panic!("{value} should match {pattern}"))
    }

    fn assert_no_match(value: ExprRef, pattern: ExprRef) {
        assert_eq!(match_pattern(&value, &pattern).expect("no match error"), None);
    }

    #[test]
    fn hole_matches_only_hole() {
        assert!(assert_matches(Expr::hole(), Expr::hole()).is_empty());
        assert_no_match(Expr::int(1), Expr::hole());
    }

    #[test]
    fn int_matches_equal_int() {
        assert!(assert_matches(Expr::int(1), Expr::int(1)).is_empty());
        assert_no_match(Expr::int(2), Expr::int(1));
        assert_no_match(Expr::string("1"), Expr::int(1));
    }

    #[test]
    fn float_patterns_are_rejected() {
        let err = match_pattern(&Expr::float(1.0), &Expr::float(1.0)).unwrap_err();
        assert!(matches!(err, EvalError::Match(_)));
    }

    #[test]
    fn var_always_matches_and_binds() {
        for value in [Expr::int(7), Expr::string("s"), Expr::hole()] {
            let bindings = assert_matches(value.clone(), Expr::var("x"));
            assert_eq!(bindings.get("x"), Some(&value));
        }
    }

    #[test]
    fn variant_matches_on_tag_and_payload() {
        let value = Expr::variant("some", Expr::int(1));
        let bindings = assert_matches(value, Expr::variant("some", Expr::var("x")));
        assert_eq!(bindings.get("x"), Some(&Expr::int(1)));

        assert_no_match(
            Expr::variant("none", Expr::hole()),
            Expr::variant("some", Expr::var("x")),
        );
    }

    #[test]
    fn list_lengths_must_agree_without_spread() {
        let value = Expr::list(vec![Expr::int(1), Expr::int(2)]);
        let pattern = Expr::list(vec![Expr::var("a"), Expr::var("b")]);
        let bindings = assert_matches(value.clone(), pattern);
        assert_eq!(bindings.get("a"), Some(&Expr::int(1)));
        assert_eq!(bindings.get("b"), Some(&Expr::int(2)));

        assert_no_match(value, Expr::list(vec![Expr::var("a")]));
    }

    #[test]
    fn list_spread_consumes_the_rest() {
        let value = Expr::list(vec![Expr::int(1), Expr::int(2), Expr::int(3)]);
        let pattern = Expr::list(vec![Expr::var("x"), Expr::spread(None)]);
        assert_eq!(assert_matches(value.clone(), pattern).len(), 1);

        let named = Expr::list(vec![Expr::var("x"), Expr::spread(Some("rest".into()))]);
        let bindings = assert_matches(value, named);
        assert_eq!(
            bindings.get("rest"),
            Some(&Expr::list(vec![Expr::int(2), Expr::int(3)]))
        );
    }

    #[test]
    fn named_spread_may_bind_empty_rest() {
        let value = Expr::list(vec![Expr::int(1)]);
        let pattern = Expr::list(vec![Expr::var("x"), Expr::spread(Some("rest".into()))]);
        let bindings = assert_matches(value, pattern);
        assert_eq!(bindings.get("rest"), Some(&Expr::list(vec![])));
    }

    #[test]
    fn spread_requires_the_prefix_to_match() {
        let value = Expr::list(vec![]);
        let pattern = Expr::list(vec![Expr::var("x"), Expr::spread(Some("rest".into()))]);
        assert_no_match(value, pattern);
    }

    #[test]
    fn record_fields_must_all_match() {
        let value = scrap_parser::parse("{x = 1, y = 2}").unwrap();
        let pattern = scrap_parser::parse("{x = x, y = y}").unwrap();
        let bindings = assert_matches(value.clone(), pattern);
        assert_eq!(bindings.get("x"), Some(&Expr::int(1)));
        assert_eq!(bindings.get("y"), Some(&Expr::int(2)));

        // Exact field count is required without a spread.
        let narrow = scrap_parser::parse("{x = x}").unwrap();
        assert_no_match(value.clone(), narrow);

        // A missing key is a non-match.
        let missing = scrap_parser::parse("{x = x, z = z}").unwrap();
        assert_no_match(value, missing);
    }

    #[test]
    fn record_spread_relaxes_the_field_count() {
        let value = scrap_parser::parse("{x = 1, y = 2}").unwrap();
        let pattern = scrap_parser::parse("{x = x, ...}").unwrap();
        let bindings = assert_matches(value, pattern);
        assert_eq!(bindings.get("x"), Some(&Expr::int(1)));
    }

    #[test]
    fn named_record_spread_binds_unseen_fields() {
        let value = scrap_parser::parse("{x = 1, y = 2, z = 3}").unwrap();
        let pattern = scrap_parser::parse("{x = x, ...rest}").unwrap();
        let bindings = assert_matches(value, pattern);
        let expected = scrap_parser::parse("{y = 2, z = 3}").unwrap();
        assert_eq!(bindings.get("rest"), Some(&expected));
    }
}

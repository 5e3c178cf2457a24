//! The inference context: union-find unification with rows.
//!
//! `InferCtx` owns the `ena` unification table. Binding a type variable
//! is write-once (`unify_var_value` after an occurs check); linking two
//! unbound variables goes through `unify_var_var`. Row unification
//! flattens both sides, unifies the shared fields pointwise, and pushes
//! each side's missing fields onto the other side's tail, unifying the
//! two tails exactly once per call.

use std::collections::BTreeMap;

use ena::unify::InPlaceUnificationTable;
use rustc_hash::FxHashMap;

use crate::env::TypeEnv;
use crate::error::TypeError;
use crate::ty::{Scheme, Ty, TyVar};

pub struct InferCtx {
    table: InPlaceUnificationTable<TyVar>,
}

impl InferCtx {
    pub fn new() -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
        }
    }

    /// A fresh, unbound type variable.
    pub fn fresh_var(&mut self) -> Ty {
        Ty::Var(self.table.new_key(None))
    }

    // ── Resolution ─────────────────────────────────────────────────────

    /// Chase bindings and rebuild the type with every variable replaced
    /// by its representative (root key for unbound variables). Chained
    /// rows are merged.
    pub fn resolve(&mut self, ty: &Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.resolve(&inner),
                None => Ty::Var(self.table.find(*v)),
            },
            Ty::Con(con) => {
                let args = con.args.iter().map(|arg| self.resolve(arg)).collect();
                Ty::con(con.name.clone(), args)
            }
            Ty::EmptyRow => Ty::EmptyRow,
            Ty::Row { .. } => match self.flatten_row(ty) {
                Ok((fields, rest)) => {
                    let fields = fields
                        .iter()
                        .map(|(key, value)| (key.clone(), self.resolve(value)))
                        .collect();
                    let rest = self.resolve(&rest);
                    Ty::Row {
                        fields,
                        rest: Box::new(rest),
                    }
                }
                // A tail bound to a non-row; leave the structure as-is
                // for error rendering.
                Err(_) => ty.clone(),
            },
        }
    }

    /// Flatten a row by walking its tail chain: all fields plus the
    /// final tail (an unbound variable or the empty row).
    pub fn flatten_row(&mut self, ty: &Ty) -> Result<(BTreeMap<String, Ty>, Ty), TypeError> {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.flatten_row(&inner),
                None => Ok((BTreeMap::new(), Ty::Var(self.table.find(*v)))),
            },
            Ty::Row { fields, rest } => {
                let (mut flat, tail) = self.flatten_row(rest)?;
                for (key, value) in fields {
                    flat.insert(key.clone(), value.clone());
                }
                Ok((flat, tail))
            }
            Ty::EmptyRow => Ok((BTreeMap::new(), Ty::EmptyRow)),
            other => Err(TypeError::NotARow(other.clone())),
        }
    }

    // ── Occurs check ───────────────────────────────────────────────────

    /// Whether `var` occurs anywhere within `ty`, chasing bindings.
    pub fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        let root = self.table.find(var);
        let mut vars = Vec::new();
        self.free_vars(ty, &mut vars);
        vars.contains(&root)
    }

    /// Collect the unbound variables (as root keys) in a type, in first
    /// appearance order.
    pub fn free_vars(&mut self, ty: &Ty, out: &mut Vec<TyVar>) {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.free_vars(&inner, out),
                None => {
                    let root = self.table.find(*v);
                    if !out.contains(&root) {
                        out.push(root);
                    }
                }
            },
            Ty::Con(con) => {
                for arg in &con.args {
                    self.free_vars(arg, out);
                }
            }
            Ty::EmptyRow => {}
            Ty::Row { fields, rest } => {
                for value in fields.values() {
                    self.free_vars(value, out);
                }
                self.free_vars(rest, out);
            }
        }
    }

    // ── Unification ────────────────────────────────────────────────────

    /// Unify two types, making them equal in the forest.
    pub fn unify(&mut self, a: &Ty, b: &Ty) -> Result<(), TypeError> {
        let a = self.resolve(a);
        let b = self.resolve(b);
        match (&a, &b) {
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),
            (Ty::Var(v1), Ty::Var(v2)) => {
                self.table
                    .unify_var_var(*v1, *v2)
                    .expect("unifying two unbound variables cannot fail");
                Ok(())
            }
            (Ty::Var(v), other) | (other, Ty::Var(v)) => {
                if self.occurs_in(*v, other) {
                    return Err(TypeError::OccursCheck(Ty::Var(*v), other.clone()));
                }
                self.table
                    .unify_var_value(*v, Some(other.clone()))
                    .expect("binding an unbound variable cannot fail");
                Ok(())
            }
            (Ty::Con(c1), Ty::Con(c2)) => {
                if c1.name != c2.name || c1.args.len() != c2.args.len() {
                    return Err(TypeError::UnificationFailed(a.clone(), b.clone()));
                }
                for (x, y) in c1.args.iter().zip(&c2.args) {
                    self.unify(x, y)?;
                }
                Ok(())
            }
            (Ty::EmptyRow, Ty::EmptyRow) => Ok(()),
            (Ty::Row { .. }, Ty::Row { .. }) => self.unify_rows(&a, &b),
            (Ty::Row { .. }, Ty::EmptyRow) => Err(TypeError::RowWithEmptyRow(a.clone())),
            (Ty::EmptyRow, Ty::Row { .. }) => Err(TypeError::EmptyRowWithRow(b.clone())),
            _ => Err(TypeError::UnificationFailed(a.clone(), b.clone())),
        }
    }

    fn unify_rows(&mut self, a: &Ty, b: &Ty) -> Result<(), TypeError> {
        let (a_fields, a_rest) = self.flatten_row(a)?;
        let (b_fields, b_rest) = self.flatten_row(b)?;

        // Fields missing from each side; the shared fields unify now.
        let mut a_missing: BTreeMap<String, Ty> = BTreeMap::new();
        let mut b_missing: BTreeMap<String, Ty> = BTreeMap::new();
        let mut all_keys: Vec<&String> = a_fields.keys().chain(b_fields.keys()).collect();
        all_keys.sort();
        all_keys.dedup();
        for key in all_keys {
            match (a_fields.get(key), b_fields.get(key)) {
                (Some(x), Some(y)) => self.unify(x, y)?,
                (None, Some(y)) => {
                    a_missing.insert(key.clone(), y.clone());
                }
                (Some(x), None) => {
                    b_missing.insert(key.clone(), x.clone());
                }
                (None, None) => unreachable!("key came from one of the maps"),
            }
        }

        match (a_missing.is_empty(), b_missing.is_empty()) {
            // Same field sets: the tails unify directly.
            (true, true) => self.unify(&a_rest, &b_rest),
            // One side has extra fields: push them onto the other tail.
            (true, false) => self.unify(&b_rest, &Ty::row(b_missing, a_rest)),
            (false, true) => self.unify(&a_rest, &Ty::row(a_missing, b_rest)),
            // Both are missing fields: a fresh shared tail receives each
            // side's extras.
            (false, false) => {
                let rest = self.fresh_var();
                self.unify(&a_rest, &Ty::row(a_missing, rest.clone()))?;
                self.unify(&b_rest, &Ty::row(b_missing, rest))
            }
        }
    }

    // ── Generalization and instantiation ───────────────────────────────

    /// Quantify the variables free in `ty` but not free in the ambient
    /// context.
    pub fn generalize(&mut self, ty: &Ty, env: &TypeEnv) -> Scheme {
        let resolved = self.resolve(ty);
        let mut vars = Vec::new();
        self.free_vars(&resolved, &mut vars);

        let mut ambient = Vec::new();
        let schemes: Vec<Scheme> = env.schemes().cloned().collect();
        for scheme in &schemes {
            let mut scheme_vars = Vec::new();
            self.free_vars(&scheme.ty, &mut scheme_vars);
            let quantified: Vec<TyVar> =
                scheme.vars.iter().map(|v| self.table.find(*v)).collect();
            ambient.extend(
                scheme_vars
                    .into_iter()
                    .filter(|v| !quantified.contains(v)),
            );
        }

        vars.retain(|v| !ambient.contains(v));
        Scheme {
            vars,
            ty: resolved,
        }
    }

    /// Replace a scheme's quantified variables with fresh ones.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        if scheme.vars.is_empty() {
            return scheme.ty.clone();
        }
        let subst: FxHashMap<TyVar, Ty> = scheme
            .vars
            .iter()
            .map(|v| (self.table.find(*v), self.fresh_var()))
            .collect();
        self.substitute(&scheme.ty, &subst)
    }

    fn substitute(&mut self, ty: &Ty, subst: &FxHashMap<TyVar, Ty>) -> Ty {
        match ty {
            Ty::Var(v) => {
                let root = self.table.find(*v);
                if let Some(replacement) = subst.get(&root) {
                    return replacement.clone();
                }
                match self.table.probe_value(root) {
                    Some(inner) => self.substitute(&inner, subst),
                    None => Ty::Var(root),
                }
            }
            Ty::Con(con) => {
                let args = con
                    .args
                    .iter()
                    .map(|arg| self.substitute(arg, subst))
                    .collect();
                Ty::con(con.name.clone(), args)
            }
            Ty::EmptyRow => Ty::EmptyRow,
            Ty::Row { fields, rest } => {
                let fields = fields
                    .iter()
                    .map(|(key, value)| (key.clone(), self.substitute(value, subst)))
                    .collect();
                let rest = self.substitute(rest, subst);
                Ty::Row {
                    fields,
                    rest: Box::new(rest),
                }
            }
        }
    }

    // ── Rendering ──────────────────────────────────────────────────────

    /// Resolve and render a type with its free variables renamed to
    /// `'a, 'b, ...` in order of first appearance.
    pub fn render(&mut self, ty: &Ty) -> String {
        let resolved = self.resolve(ty);
        let mut vars = Vec::new();
        self.free_vars(&resolved, &mut vars);
        let names: FxHashMap<TyVar, String> = vars
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, display_name(i)))
            .collect();
        render_ty(&resolved, &names)
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

fn display_name(index: usize) -> String {
    if index < 26 {
        ((b'a' + index as u8) as char).to_string()
    } else {
        format!("t{index}")
    }
}

fn render_ty(ty: &Ty, names: &FxHashMap<TyVar, String>) -> String {
    match ty {
        Ty::Var(v) => match names.get(v) {
            Some(name) => format!("'{name}"),
            None => format!("'t{}", v.0),
        },
        Ty::Con(con) => match con.args.len() {
            0 => con.name.clone(),
            1 => format!("({} {})", render_ty(&con.args[0], names), con.name),
            _ => {
                let args: Vec<String> =
                    con.args.iter().map(|arg| render_ty(arg, names)).collect();
                format!("({})", args.join(&con.name))
            }
        },
        Ty::EmptyRow => "{}".to_string(),
        Ty::Row { fields, rest } => {
            let mut parts: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{key}={}", render_ty(value, names)))
                .collect();
            match &**rest {
                Ty::EmptyRow => {}
                other => parts.push(format!("...{}", render_ty(other, names))),
            }
            format!("{{{}}}", parts.join(", "))
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(pairs: &[(&str, Ty)], rest: Ty) -> Ty {
        let fields: BTreeMap<String, Ty> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Ty::row(fields, rest)
    }

    #[test]
    fn unify_two_fresh_vars() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        ctx.unify(&a, &b).unwrap();
        ctx.unify(&a, &Ty::int()).unwrap();
        assert_eq!(ctx.resolve(&a), Ty::int());
        assert_eq!(ctx.resolve(&b), Ty::int());
    }

    #[test]
    fn unify_var_with_concrete() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        ctx.unify(&a, &Ty::int()).unwrap();
        assert_eq!(ctx.resolve(&a), Ty::int());
    }

    #[test]
    fn unify_mismatched_constructors() {
        let mut ctx = InferCtx::new();
        let err = ctx.unify(&Ty::int(), &Ty::string()).unwrap_err();
        assert_eq!(err, TypeError::UnificationFailed(Ty::int(), Ty::string()));
    }

    #[test]
    fn unify_constructor_arity_mismatch() {
        let mut ctx = InferCtx::new();
        let one = Ty::con("x", vec![Ty::int()]);
        let none = Ty::con("x", vec![]);
        assert!(ctx.unify(&one, &none).is_err());
    }

    #[test]
    fn unify_function_types_unifies_arguments() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        let c = ctx.fresh_var();
        let d = ctx.fresh_var();
        ctx.unify(
            &Ty::func(a.clone(), b.clone()),
            &Ty::func(c.clone(), d.clone()),
        )
        .unwrap();
        ctx.unify(&a, &Ty::int()).unwrap();
        ctx.unify(&d, &Ty::string()).unwrap();
        assert_eq!(ctx.resolve(&c), Ty::int());
        assert_eq!(ctx.resolve(&b), Ty::string());
    }

    #[test]
    fn occurs_check_rejects_infinite_types() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let list_a = Ty::list(a.clone());
        let err = ctx.unify(&a, &list_a).unwrap_err();
        assert!(matches!(err, TypeError::OccursCheck(..)));
    }

    #[test]
    fn unify_empty_rows() {
        let mut ctx = InferCtx::new();
        ctx.unify(&Ty::EmptyRow, &Ty::EmptyRow).unwrap();
    }

    #[test]
    fn unify_open_empty_rows_links_tails() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        let left = row(&[], a.clone());
        let right = row(&[], b.clone());
        ctx.unify(&left, &right).unwrap();
        assert_eq!(ctx.resolve(&a), ctx.resolve(&b));
    }

    #[test]
    fn unify_rows_unifies_shared_fields() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        ctx.unify(
            &row(&[("x", a.clone())], Ty::EmptyRow),
            &row(&[("x", b.clone())], Ty::EmptyRow),
        )
        .unwrap();
        ctx.unify(&a, &Ty::int()).unwrap();
        assert_eq!(ctx.resolve(&b), Ty::int());
    }

    #[test]
    fn closed_row_against_empty_row_fails() {
        let mut ctx = InferCtx::new();
        let left = row(&[("x", Ty::int())], Ty::EmptyRow);
        let err = ctx.unify(&left, &Ty::EmptyRow).unwrap_err();
        assert!(matches!(err, TypeError::RowWithEmptyRow(_)));
    }

    #[test]
    fn disjoint_closed_rows_fail() {
        let mut ctx = InferCtx::new();
        let left = row(&[("x", Ty::int())], Ty::EmptyRow);
        let right = row(&[("y", Ty::int())], Ty::EmptyRow);
        assert!(ctx.unify(&left, &right).is_err());
    }

    #[test]
    fn open_row_absorbs_missing_fields() {
        let mut ctx = InferCtx::new();
        let rest = ctx.fresh_var();
        let left = row(&[("x", Ty::int()), ("y", Ty::string())], Ty::EmptyRow);
        let right = row(&[("x", Ty::int())], rest.clone());
        ctx.unify(&left, &right).unwrap();
        assert_eq!(
            ctx.resolve(&rest),
            row(&[("y", Ty::string())], Ty::EmptyRow)
        );
    }

    #[test]
    fn open_row_with_equal_fields_closes_the_tail() {
        let mut ctx = InferCtx::new();
        let rest = ctx.fresh_var();
        let left = row(&[("x", Ty::int())], Ty::EmptyRow);
        let right = row(&[("x", Ty::int())], rest.clone());
        ctx.unify(&left, &right).unwrap();
        assert_eq!(ctx.resolve(&rest), Ty::EmptyRow);
    }

    #[test]
    fn open_row_missing_more_than_the_closed_side_fails() {
        let mut ctx = InferCtx::new();
        let rest = ctx.fresh_var();
        let left = row(&[("x", Ty::int())], Ty::EmptyRow);
        let right = row(&[("x", Ty::int()), ("y", Ty::string())], rest);
        assert!(ctx.unify(&left, &right).is_err());
    }

    #[test]
    fn both_rows_open_with_disjoint_extras_share_a_tail() {
        let mut ctx = InferCtx::new();
        let r0 = ctx.fresh_var();
        let r1 = ctx.fresh_var();
        let left = row(&[("x", Ty::int())], r0.clone());
        let right = row(&[("y", Ty::int())], r1.clone());
        ctx.unify(&left, &right).unwrap();

        // Each tail picked up the other side's field, sharing a rest.
        let (left_fields, left_tail) = ctx.flatten_row(&r0).unwrap();
        let (right_fields, right_tail) = ctx.flatten_row(&r1).unwrap();
        assert!(left_fields.contains_key("y"));
        assert!(right_fields.contains_key("x"));
        assert_eq!(ctx.resolve(&left_tail), ctx.resolve(&right_tail));
    }

    #[test]
    fn generalize_and_instantiate() {
        let mut ctx = InferCtx::new();
        let env = TypeEnv::new();
        let a = ctx.fresh_var();
        let identity = Ty::func(a.clone(), a);
        let scheme = ctx.generalize(&identity, &env);
        assert_eq!(scheme.vars.len(), 1);

        let first = ctx.instantiate(&scheme);
        let second = ctx.instantiate(&scheme);
        ctx.unify(&first, &Ty::func(Ty::int(), Ty::int())).unwrap();
        // The second instantiation is unconstrained by the first.
        ctx.unify(&second, &Ty::func(Ty::string(), Ty::string()))
            .unwrap();
    }

    #[test]
    fn generalize_skips_context_variables() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let mut env = TypeEnv::new();
        env.insert("x", Scheme::mono(a.clone()));
        let scheme = ctx.generalize(&Ty::func(a.clone(), a), &env);
        assert!(scheme.vars.is_empty(), "ambient variables stay free");
    }

    #[test]
    fn render_names_variables_in_order() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();
        let ty = Ty::func(a.clone(), Ty::func(b, a));
        assert_eq!(ctx.render(&ty), "('a->('b->'a))");
    }
}

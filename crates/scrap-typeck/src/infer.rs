//! Expression and pattern inference.
//!
//! Algorithm-W-shaped: literals take ground types, variables instantiate
//! their schemes, functions introduce a fresh argument variable, and
//! `where` bindings generalize over the variables not free in the outer
//! context. A binding whose value is a function (or match function) is
//! inferred letrec-style, with its own name in scope at a fresh
//! monomorphic type. Binary operators are typed as applications of the
//! operator's scheme from the context.

use scrap_parser::ast::{Expr, ExprRef};

use crate::env::TypeEnv;
use crate::error::TypeError;
use crate::ty::{Scheme, Ty};
use crate::unify::InferCtx;

/// The base typing context: arithmetic and list operators plus
/// `$$listlength`. Everything else (comparisons, booleans, the remaining
/// natives) is deliberately untyped and fails inference when used.
pub fn base_context(ctx: &mut InferCtx) -> TypeEnv {
    let mut env = TypeEnv::new();

    let int_binop = Scheme::mono(Ty::func(Ty::int(), Ty::func(Ty::int(), Ty::int())));
    env.insert("+", int_binop.clone());
    env.insert("-", int_binop.clone());
    env.insert("*", int_binop);
    env.insert(
        "/",
        Scheme::mono(Ty::func(Ty::int(), Ty::func(Ty::int(), Ty::float()))),
    );
    env.insert(
        "++",
        Scheme::mono(Ty::func(
            Ty::string(),
            Ty::func(Ty::string(), Ty::string()),
        )),
    );

    // `>+` : forall a. a -> a list -> a list
    let a = ctx.fresh_var();
    let cons = Ty::func(a.clone(), Ty::func(Ty::list(a.clone()), Ty::list(a.clone())));
    env.insert(">+", scheme_over(ctx, &a, cons));

    // `+<` : forall a. a list -> a -> a list
    let a = ctx.fresh_var();
    let append = Ty::func(Ty::list(a.clone()), Ty::func(a.clone(), Ty::list(a.clone())));
    env.insert("+<", scheme_over(ctx, &a, append));

    // `$$listlength` : forall a. a list -> int
    let a = ctx.fresh_var();
    let length = Ty::func(Ty::list(a.clone()), Ty::int());
    env.insert("$$listlength", scheme_over(ctx, &a, length));

    env
}

fn scheme_over(ctx: &mut InferCtx, var: &Ty, ty: Ty) -> Scheme {
    let mut vars = Vec::new();
    ctx.free_vars(var, &mut vars);
    Scheme { vars, ty }
}

/// Infer a whole program in the base context and render its type.
pub fn infer_program(expr: &ExprRef) -> Result<String, TypeError> {
    let mut ctx = InferCtx::new();
    let env = base_context(&mut ctx);
    let ty = infer(&mut ctx, &env, expr)?;
    Ok(ctx.render(&ty))
}

/// Infer the type of an expression in a context.
pub fn infer(ctx: &mut InferCtx, env: &TypeEnv, expr: &ExprRef) -> Result<Ty, TypeError> {
    match &**expr {
        Expr::Int(_) => Ok(Ty::int()),
        Expr::Float(_) => Ok(Ty::float()),
        Expr::String(_) => Ok(Ty::string()),
        Expr::Bytes(_) => Ok(Ty::bytes()),
        Expr::Hole => Ok(Ty::hole()),

        Expr::Var(name) => {
            let scheme = env
                .lookup(name)
                .cloned()
                .ok_or_else(|| TypeError::UnboundVariable(name.clone()))?;
            Ok(ctx.instantiate(&scheme))
        }

        Expr::Function { arg, body } => {
            let Some(name) = arg.as_var() else {
                return Err(TypeError::NotInferable("function with a pattern argument"));
            };
            let arg_ty = ctx.fresh_var();
            let body_env = env.extended(name, Scheme::mono(arg_ty.clone()));
            let body_ty = infer(ctx, &body_env, body)?;
            Ok(Ty::func(arg_ty, body_ty))
        }

        // An operator types as the application of its scheme.
        Expr::Binop { op, left, right } => {
            let scheme = env
                .lookup(op.to_str())
                .cloned()
                .ok_or_else(|| TypeError::UnboundVariable(op.to_str().to_string()))?;
            let op_ty = ctx.instantiate(&scheme);
            let left_ty = infer(ctx, env, left)?;
            let right_ty = infer(ctx, env, right)?;
            let result = ctx.fresh_var();
            ctx.unify(
                &op_ty,
                &Ty::func(left_ty, Ty::func(right_ty, result.clone())),
            )?;
            Ok(result)
        }

        Expr::Where { body, binding } => {
            let Expr::Assign { name, value } = &**binding else {
                return Err(TypeError::WhereWithoutAssignment);
            };
            let Some(name) = name.as_var() else {
                return Err(TypeError::WhereWithoutAssignment);
            };
            let value_ty = if matches!(&**value, Expr::Function { .. } | Expr::MatchFunction(_)) {
                // Letrec: the binding sees itself monomorphically.
                let self_ty = ctx.fresh_var();
                let rec_env = env.extended(name, Scheme::mono(self_ty));
                infer(ctx, &rec_env, value)?
            } else {
                infer(ctx, env, value)?
            };
            let scheme = ctx.generalize(&value_ty, env);
            let body_env = env.extended(name, scheme);
            infer(ctx, &body_env, body)
        }

        Expr::List(items) => {
            let item_ty = ctx.fresh_var();
            for item in items.borrow().iter() {
                if matches!(&**item, Expr::Spread(_)) {
                    return Err(TypeError::SpreadOutsideMatch("list"));
                }
                let ty = infer(ctx, env, item)?;
                ctx.unify(&item_ty, &ty)?;
            }
            Ok(Ty::list(item_ty))
        }

        Expr::Record(fields) => {
            let mut field_tys = std::collections::BTreeMap::new();
            for (key, value) in fields {
                if matches!(&**value, Expr::Spread(_)) {
                    return Err(TypeError::SpreadOutsideMatch("record"));
                }
                field_tys.insert(key.clone(), infer(ctx, env, value)?);
            }
            if field_tys.is_empty() {
                return Err(TypeError::EmptyRow);
            }
            Ok(Ty::row(field_tys, Ty::EmptyRow))
        }

        Expr::MatchFunction(cases) => {
            let result = ctx.fresh_var();
            for case in cases {
                let mut pattern_env = TypeEnv::new();
                let pattern_ty = infer_pattern(ctx, &mut pattern_env, &case.pattern)?;
                let mut body_env = env.clone();
                for (name, scheme) in pattern_env.into_bindings() {
                    body_env.insert(name, scheme);
                }
                let body_ty = infer(ctx, &body_env, &case.body)?;
                ctx.unify(&result, &Ty::func(pattern_ty, body_ty))?;
            }
            Ok(result)
        }

        Expr::Apply { func, arg } => {
            let func_ty = infer(ctx, env, func)?;
            let arg_ty = infer(ctx, env, arg)?;
            let result = ctx.fresh_var();
            ctx.unify(&func_ty, &Ty::func(arg_ty, result.clone()))?;
            Ok(result)
        }

        // A "has field" constraint: the object unifies with an open row
        // containing the accessed field. List indexing is not modeled.
        Expr::Access { obj, at } => {
            let obj_ty = infer(ctx, env, obj)?;
            let Some(field) = at.as_var() else {
                return Err(TypeError::AccessorNotAField);
            };
            let value_ty = ctx.fresh_var();
            let rest = ctx.fresh_var();
            let mut fields = std::collections::BTreeMap::new();
            fields.insert(field.to_string(), value_ty.clone());
            ctx.unify(&obj_ty, &Ty::row(fields, rest))?;
            Ok(value_ty)
        }

        other => Err(TypeError::NotInferable(other.kind_name())),
    }
}

/// Infer a pattern's type, adding its bound names to `bindings`.
fn infer_pattern(
    ctx: &mut InferCtx,
    bindings: &mut TypeEnv,
    pattern: &ExprRef,
) -> Result<Ty, TypeError> {
    match &**pattern {
        Expr::Int(_) => Ok(Ty::int()),
        Expr::Float(_) => Ok(Ty::float()),
        Expr::String(_) => Ok(Ty::string()),
        Expr::Bytes(_) => Ok(Ty::bytes()),
        Expr::Hole => Ok(Ty::hole()),

        Expr::Var(name) => {
            let ty = ctx.fresh_var();
            bindings.insert(name, Scheme::mono(ty.clone()));
            Ok(ty)
        }

        Expr::List(items) => {
            let item_ty = ctx.fresh_var();
            let result = Ty::list(item_ty.clone());
            for item in items.borrow().iter() {
                if let Expr::Spread(name) = &**item {
                    if let Some(name) = name {
                        bindings.insert(name, Scheme::mono(result.clone()));
                    }
                    break;
                }
                let ty = infer_pattern(ctx, bindings, item)?;
                ctx.unify(&item_ty, &ty)?;
            }
            Ok(result)
        }

        Expr::Record(fields) => {
            let mut field_tys = std::collections::BTreeMap::new();
            let mut rest = Ty::EmptyRow;
            for (key, value) in fields {
                if let Expr::Spread(name) = &**value {
                    // A spread opens the row; a named spread binds the
                    // tail variable itself.
                    rest = ctx.fresh_var();
                    if let Some(name) = name {
                        bindings.insert(name, Scheme::mono(rest.clone()));
                    }
                    break;
                }
                field_tys.insert(key.clone(), infer_pattern(ctx, bindings, value)?);
            }
            if field_tys.is_empty() && rest == Ty::EmptyRow {
                return Err(TypeError::EmptyRow);
            }
            Ok(Ty::row(field_tys, rest))
        }

        other => Err(TypeError::NotAPattern(other.kind_name())),
    }
}

//! The tree-walking evaluator.
//!
//! `eval` takes an environment and an expression and produces a value,
//! which is itself an expression node. Extension is copy-on-extend; the
//! letrec step in assignment is the only mutation of an existing
//! environment, and it targets the freshly built closure's own capture.

use indexmap::IndexMap;
use num_bigint::{BigInt, Sign};
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use scrap_common::error::EvalError;
use scrap_parser::ast::{BinopKind, Env, Expr, ExprRef};

use crate::closure::{improve_closure, minimized_closure};
use crate::pattern::match_pattern;

/// Evaluate an expression in an environment.
pub fn eval(env: &Env, expr: &ExprRef) -> Result<ExprRef, EvalError> {
    match &**expr {
        Expr::Int(_)
        | Expr::Float(_)
        | Expr::String(_)
        | Expr::Bytes(_)
        | Expr::Hole
        | Expr::Closure { .. }
        | Expr::NativeFunction { .. } => Ok(expr.clone()),

        Expr::Variant { tag, value } => Ok(Expr::variant(tag.clone(), eval(env, value)?)),

        Expr::Var(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::Name(format!("name '{name}' is not defined"))),

        Expr::Binop { op, left, right } => eval_binop(env, *op, left, right),

        Expr::List(items) => {
            let mut evaluated = Vec::with_capacity(items.borrow().len());
            for item in items.borrow().iter() {
                evaluated.push(eval(env, item)?);
            }
            Ok(Expr::list(evaluated))
        }

        Expr::Record(fields) => {
            let mut evaluated = IndexMap::with_capacity(fields.len());
            for (key, value) in fields {
                evaluated.insert(key.clone(), eval(env, value)?);
            }
            Ok(Expr::record(evaluated))
        }

        Expr::Assign { name, value } => {
            let Some(name) = name.as_var() else {
                return Err(EvalError::Runtime(
                    "expected variable in assignment".to_string(),
                ));
            };
            let mut result = eval(env, value)?;
            if matches!(&*result, Expr::Closure { .. }) {
                // The letrec step: functions see themselves in their own
                // environment. Re-minimize afterwards since the closure
                // might not actually be recursive.
                if let Expr::Closure { env: captured, .. } = &*result {
                    captured.borrow_mut().insert(name.to_string(), result.clone());
                }
                result = improve_closure(&result);
            }
            let mut extended = env.clone();
            extended.insert(name.to_string(), result);
            Ok(Expr::env_object(extended))
        }

        Expr::Where { body, binding } => {
            let bound = eval(env, binding)?;
            let Expr::EnvObject(extra) = &*bound else {
                return Err(EvalError::Runtime(format!(
                    "expected binding in where expression, got {}",
                    bound.kind_name()
                )));
            };
            let mut extended = env.clone();
            for (key, value) in extra {
                extended.insert(key.clone(), value.clone());
            }
            eval(&extended, body)
        }

        Expr::Assert { value, cond } => {
            let cond_value = eval(env, cond)?;
            if !cond_value.is_true() {
                return Err(EvalError::Assertion(format!("condition {cond} failed")));
            }
            eval(env, value)
        }

        Expr::Function { arg, .. } => {
            if arg.as_var().is_none() {
                return Err(EvalError::Runtime(format!(
                    "expected variable in function definition {arg}"
                )));
            }
            Ok(minimized_closure(env, expr))
        }

        Expr::MatchFunction(_) => Ok(minimized_closure(env, expr)),

        Expr::Apply { func, arg } => {
            // `$$quote` is a special form: its argument is returned
            // unevaluated.
            if func.as_var() == Some("$$quote") {
                return Ok(arg.clone());
            }
            let callee = eval(env, func)?;
            let arg_value = eval(env, arg)?;
            apply(&callee, arg_value)
        }

        Expr::Access { obj, at } => eval_access(env, obj, at),

        Expr::Spread(_) => Err(EvalError::Runtime("cannot evaluate a spread".to_string())),

        other => Err(EvalError::Runtime(format!(
            "cannot evaluate {}",
            other.kind_name()
        ))),
    }
}

fn apply(callee: &ExprRef, arg: ExprRef) -> Result<ExprRef, EvalError> {
    match &**callee {
        Expr::NativeFunction { func, .. } => func(arg),
        Expr::Closure {
            env: captured,
            func,
        } => match &**func {
            Expr::Function { arg: param, body } => {
                let Some(param) = param.as_var() else {
                    return Err(EvalError::Runtime(
                        "expected variable in function definition".to_string(),
                    ));
                };
                let mut call_env = captured.borrow().clone();
                call_env.insert(param.to_string(), arg);
                eval(&call_env, body)
            }
            Expr::MatchFunction(cases) => {
                for case in cases {
                    if let Some(bindings) = match_pattern(&arg, &case.pattern)? {
                        let mut call_env = captured.borrow().clone();
                        call_env.extend(bindings);
                        return eval(&call_env, &case.body);
                    }
                }
                Err(EvalError::Match("no matching cases".to_string()))
            }
            other => Err(EvalError::Type(format!(
                "attempted to apply a non-function of type {}",
                other.kind_name()
            ))),
        },
        other => Err(EvalError::Type(format!(
            "attempted to apply a non-closure of type {}",
            other.kind_name()
        ))),
    }
}

fn eval_access(env: &Env, obj: &ExprRef, at: &ExprRef) -> Result<ExprRef, EvalError> {
    let obj_value = eval(env, obj)?;
    match &*obj_value {
        Expr::Record(fields) => {
            let Some(field) = at.as_var() else {
                return Err(EvalError::Type(format!(
                    "cannot access record field using {}, expected a field name",
                    at.kind_name()
                )));
            };
            fields
                .get(field)
                .cloned()
                .ok_or_else(|| EvalError::Name(format!("no assignment to {field} found in record")))
        }
        Expr::List(items) => {
            let index_value = eval(env, at)?;
            let Expr::Int(index) = &*index_value else {
                return Err(EvalError::Type(format!(
                    "cannot index into list using type {}, expected integer",
                    index_value.kind_name()
                )));
            };
            let items = items.borrow();
            match index.to_usize() {
                Some(i) if i < items.len() => Ok(items[i].clone()),
                _ => Err(EvalError::Value(format!(
                    "index {index} out of bounds for list"
                ))),
            }
        }
        other => Err(EvalError::Type(format!(
            "attempted to access from type {}",
            other.kind_name()
        ))),
    }
}

// ── Binary operators ───────────────────────────────────────────────────

/// A number out of the tree: integer or float.
enum Num {
    Int(BigInt),
    Float(f64),
}

impl Num {
    fn to_f64(&self) -> f64 {
        match self {
            Num::Int(v) => v.to_f64().unwrap_or(f64::NAN),
            Num::Float(v) => *v,
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Num::Int(v) => v.is_zero(),
            Num::Float(v) => *v == 0.0,
        }
    }
}

fn eval_number(env: &Env, expr: &ExprRef) -> Result<Num, EvalError> {
    match &*eval(env, expr)? {
        Expr::Int(v) => Ok(Num::Int(v.clone())),
        Expr::Float(v) => Ok(Num::Float(*v)),
        other => Err(EvalError::Type(format!(
            "expected Int or Float, got {}",
            other.kind_name()
        ))),
    }
}

fn eval_str(env: &Env, expr: &ExprRef) -> Result<String, EvalError> {
    match &*eval(env, expr)? {
        Expr::String(v) => Ok(v.clone()),
        other => Err(EvalError::Type(format!(
            "expected String, got {}",
            other.kind_name()
        ))),
    }
}

fn eval_bool(env: &Env, expr: &ExprRef) -> Result<bool, EvalError> {
    let value = eval(env, expr)?;
    match &*value {
        Expr::Variant { tag, .. } if tag == "true" => Ok(true),
        Expr::Variant { tag, .. } if tag == "false" => Ok(false),
        other => Err(EvalError::Type(format!(
            "expected #true or #false, got {}",
            other.kind_name()
        ))),
    }
}

fn eval_list(env: &Env, expr: &ExprRef) -> Result<Vec<ExprRef>, EvalError> {
    match &*eval(env, expr)? {
        Expr::List(items) => Ok(items.borrow().clone()),
        other => Err(EvalError::Type(format!(
            "expected List, got {}",
            other.kind_name()
        ))),
    }
}

fn eval_binop(
    env: &Env,
    op: BinopKind,
    left: &ExprRef,
    right: &ExprRef,
) -> Result<ExprRef, EvalError> {
    match op {
        BinopKind::Add
        | BinopKind::Sub
        | BinopKind::Mul
        | BinopKind::Div
        | BinopKind::FloorDiv
        | BinopKind::Mod
        | BinopKind::Exp => {
            let x = eval_number(env, left)?;
            let y = eval_number(env, right)?;
            arith(op, x, y)
        }
        BinopKind::Less
        | BinopKind::Greater
        | BinopKind::LessEqual
        | BinopKind::GreaterEqual => {
            let x = eval_number(env, left)?;
            let y = eval_number(env, right)?;
            Ok(Expr::boolean(compare(op, x, y)))
        }
        BinopKind::Equal => Ok(Expr::boolean(eval(env, left)? == eval(env, right)?)),
        BinopKind::NotEqual => Ok(Expr::boolean(eval(env, left)? != eval(env, right)?)),
        BinopKind::BoolAnd => {
            if !eval_bool(env, left)? {
                return Ok(Expr::boolean(false));
            }
            Ok(Expr::boolean(eval_bool(env, right)?))
        }
        BinopKind::BoolOr => {
            if eval_bool(env, left)? {
                return Ok(Expr::boolean(true));
            }
            Ok(Expr::boolean(eval_bool(env, right)?))
        }
        BinopKind::StrConcat => {
            let mut combined = eval_str(env, left)?;
            combined.push_str(&eval_str(env, right)?);
            Ok(Expr::string(combined))
        }
        BinopKind::ListCons => {
            let head = eval(env, left)?;
            let tail = eval_list(env, right)?;
            let mut items = Vec::with_capacity(tail.len() + 1);
            items.push(head);
            items.extend(tail);
            Ok(Expr::list(items))
        }
        BinopKind::ListAppend => {
            let mut items = eval_list(env, left)?;
            items.push(eval(env, right)?);
            Ok(Expr::list(items))
        }
        // The left operand is discarded without being evaluated.
        BinopKind::RightEval => eval(env, right),
        BinopKind::HasType | BinopKind::Pipe | BinopKind::ReversePipe => Err(EvalError::Runtime(
            format!("no runtime handler for operator {op}"),
        )),
    }
}

/// Numeric-tower arithmetic: integer results when both operands are
/// integers (except `/`, which always produces a float), float results
/// otherwise. Division, floor division, and modulo by zero are errors.
fn arith(op: BinopKind, x: Num, y: Num) -> Result<ExprRef, EvalError> {
    if matches!(
        op,
        BinopKind::Div | BinopKind::FloorDiv | BinopKind::Mod
    ) && y.is_zero()
    {
        return Err(EvalError::Value("division by zero".to_string()));
    }

    if let (Num::Int(a), Num::Int(b)) = (&x, &y) {
        match op {
            BinopKind::Add => return Ok(Expr::int(a + b)),
            BinopKind::Sub => return Ok(Expr::int(a - b)),
            BinopKind::Mul => return Ok(Expr::int(a * b)),
            BinopKind::FloorDiv => return Ok(Expr::int(a.div_floor(b))),
            BinopKind::Mod => return Ok(Expr::int(a.mod_floor(b))),
            BinopKind::Exp if b.sign() != Sign::Minus => {
                let exponent = b.to_u32().ok_or_else(|| {
                    EvalError::Value(format!("exponent {b} too large"))
                })?;
                return Ok(Expr::int(num_traits::pow(a.clone(), exponent as usize)));
            }
            // `/` on integers and negative integer exponents fall through
            // to float arithmetic.
            _ => {}
        }
    }

    let a = x.to_f64();
    let b = y.to_f64();
    Ok(Expr::float(match op {
        BinopKind::Add => a + b,
        BinopKind::Sub => a - b,
        BinopKind::Mul => a * b,
        BinopKind::Div => a / b,
        BinopKind::FloorDiv => (a / b).floor(),
        BinopKind::Mod => a - b * (a / b).floor(),
        BinopKind::Exp => a.powf(b),
        _ => unreachable!("arith only receives arithmetic operators"),
    }))
}

fn compare(op: BinopKind, x: Num, y: Num) -> bool {
    let ordering = match (&x, &y) {
        (Num::Int(a), Num::Int(b)) => a.partial_cmp(b),
        _ => x.to_f64().partial_cmp(&y.to_f64()),
    };
    match ordering {
        None => false,
        Some(ordering) => match op {
            BinopKind::Less => ordering.is_lt(),
            BinopKind::Greater => ordering.is_gt(),
            BinopKind::LessEqual => ordering.is_le(),
            BinopKind::GreaterEqual => ordering.is_ge(),
            _ => unreachable!("compare only receives comparison operators"),
        },
    }
}

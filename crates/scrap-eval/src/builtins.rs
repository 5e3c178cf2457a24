//! Built-in natives and the textual prelude.
//!
//! The `$$`-prefixed bindings form the boot environment: a small set of
//! host functions (network fetch, JSON decoding, serialization, list
//! length) plus `$$add`, which is an ordinary closure. The prelude is
//! scrapscript source evaluated once against those bindings; the
//! resulting environment is the default for programs and the REPL.

use scrap_common::error::EvalError;
use scrap_parser::ast::{BinopKind, Env, Expr, ExprRef};

use crate::eval::eval;

/// The standard prelude, as scrapscript source. A chain of `where`
/// bindings: later definitions in the file are evaluated first, so each
/// function's closure captures the ones below it.
pub const PRELUDE: &str = "
id = x -> x

. quicksort =
  | [] -> []
  | [p, ...xs] -> (concat ((quicksort (ltp xs p)) +< p) (quicksort (gtp xs p))
    . gtp = xs -> p -> filter (x -> x >= p) xs
    . ltp = xs -> p -> filter (x -> x < p) xs)

. filter = f ->
  | [] -> []
  | [x, ...xs] -> f x |> | #true () -> x >+ filter f xs
                         | #false () -> filter f xs

. concat = xs ->
  | [] -> xs
  | [y, ...ys] -> concat (xs +< y) ys

. map = f ->
  | [] -> []
  | [x, ...xs] -> f x >+ map f xs

. range =
  | 0 -> []
  | i -> range (i - 1) +< (i - 1)

. foldr = f -> a ->
  | [] -> a
  | [x, ...xs] -> f x (foldr f a xs)

. take =
  | 0 -> xs -> []
  | n ->
    | [] -> []
    | [x, ...xs] -> x >+ take (n - 1) xs

. all = f ->
  | [] -> #true ()
  | [x, ...xs] -> f x && all f xs

. any = f ->
  | [] -> #false ()
  | [x, ...xs] -> f x || any f xs
";

/// The boot bindings available before the prelude.
pub fn stdlib() -> Env {
    let mut env = Env::default();
    env.insert(
        "$$add".to_string(),
        Expr::closure(
            Env::default(),
            Expr::function(
                Expr::var("x"),
                Expr::function(
                    Expr::var("y"),
                    Expr::binop(BinopKind::Add, Expr::var("x"), Expr::var("y")),
                ),
            ),
        ),
    );
    env.insert("$$fetch".to_string(), Expr::native("$$fetch", fetch));
    env.insert(
        "$$jsondecode".to_string(),
        Expr::native("$$jsondecode", jsondecode),
    );
    env.insert(
        "$$serialize".to_string(),
        Expr::native("$$serialize", serialize),
    );
    env.insert(
        "$$deserialize".to_string(),
        Expr::native("$$deserialize", deserialize),
    );
    env.insert(
        "$$listlength".to_string(),
        Expr::native("$$listlength", listlength),
    );
    env
}

/// The default environment: the prelude evaluated over [`stdlib`].
pub fn boot_env() -> Env {
    let prelude = scrap_parser::parse(PRELUDE).expect("the prelude parses");
    let result = eval(&stdlib(), &prelude).expect("the prelude evaluates");
    match &*result {
        Expr::EnvObject(env) => env.clone(),
        other => unreachable!("the prelude is a chain of bindings, got {}", other.kind_name()),
    }
}

// ── Natives ────────────────────────────────────────────────────────────

fn fetch(url: ExprRef) -> Result<ExprRef, EvalError> {
    let Expr::String(url) = &*url else {
        return Err(EvalError::Type(format!(
            "fetch expected String, but got {}",
            url.kind_name()
        )));
    };
    let body = ureq::get(url)
        .call()
        .map_err(|e| EvalError::Runtime(format!("fetch failed: {e}")))?
        .into_string()
        .map_err(|e| EvalError::Runtime(format!("fetch failed: {e}")))?;
    Ok(Expr::string(body))
}

fn jsondecode(text: ExprRef) -> Result<ExprRef, EvalError> {
    let Expr::String(text) = &*text else {
        return Err(EvalError::Type(format!(
            "jsondecode expected String, but got {}",
            text.kind_name()
        )));
    };
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| EvalError::Runtime(format!("jsondecode failed: {e}")))?;
    json_to_expr(&value)
}

fn json_to_expr(value: &serde_json::Value) -> Result<ExprRef, EvalError> {
    match value {
        serde_json::Value::Null => Err(EvalError::Runtime(
            "jsondecode cannot decode null".to_string(),
        )),
        serde_json::Value::Bool(b) => Ok(Expr::int(i64::from(*b))),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Expr::int(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Expr::int(u))
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| EvalError::Runtime("jsondecode failed: bad number".into()))?;
                Ok(Expr::float(f))
            }
        }
        serde_json::Value::String(s) => Ok(Expr::string(s.clone())),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(json_to_expr(item)?);
            }
            Ok(Expr::list(out))
        }
        serde_json::Value::Object(fields) => {
            let mut out = indexmap::IndexMap::with_capacity(fields.len());
            for (key, value) in fields {
                out.insert(key.clone(), json_to_expr(value)?);
            }
            Ok(Expr::record(out))
        }
    }
}

fn serialize(obj: ExprRef) -> Result<ExprRef, EvalError> {
    scrap_wire::serialize(&obj)
        .map(Expr::bytes)
        .map_err(|e| EvalError::Runtime(format!("serialize failed: {e}")))
}

fn deserialize(obj: ExprRef) -> Result<ExprRef, EvalError> {
    let Expr::Bytes(data) = &*obj else {
        return Err(EvalError::Type(format!(
            "deserialize expected Bytes, but got {}",
            obj.kind_name()
        )));
    };
    scrap_wire::deserialize(data).map_err(|e| EvalError::Runtime(format!("deserialize failed: {e}")))
}

fn listlength(obj: ExprRef) -> Result<ExprRef, EvalError> {
    let Expr::List(items) = &*obj else {
        return Err(EvalError::Type(format!(
            "listlength expected List, but got {}",
            obj.kind_name()
        )));
    };
    let len = items.borrow().len();
    Ok(Expr::int(len as i64))
}

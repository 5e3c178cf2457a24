//! The scrapscript evaluator.
//!
//! A strict, call-by-value, environment-threading interpreter over the
//! shared expression tree. Environments are persistent: evaluation never
//! mutates a caller's environment, extending by copy instead. The one
//! sanctioned mutation is the letrec step, which installs a just-bound
//! closure into its own captured environment so functions can recurse
//! without a fixpoint combinator.
//!
//! - [`eval`]: the evaluator itself
//! - [`pattern`]: structural matching of values against patterns
//! - [`closure`]: free-variable analysis and closure minimization
//! - [`builtins`]: the `$$`-natives and the textual prelude

pub mod builtins;
pub mod closure;
pub mod eval;
pub mod pattern;

pub use builtins::{boot_env, stdlib, PRELUDE};
pub use closure::{free_in, improve_closure, minimized_closure};
pub use eval::eval;
pub use pattern::match_pattern;

//! Row-polymorphic Hindley-Milner type inference for scrapscript.
//!
//! - [`ty`]: type representation (`Ty`, `TyCon`, `TyVar`, `Scheme`)
//! - [`unify`]: the inference context -- union-find unification with
//!   rows, occurs check, generalization, instantiation, rendering
//! - [`env`]: the typing context
//! - [`infer`]: expression and pattern inference, the operator context
//! - [`error`]: inference failures

pub mod env;
pub mod error;
pub mod infer;
pub mod ty;
pub mod unify;

pub use env::TypeEnv;
pub use error::TypeError;
pub use infer::{base_context, infer, infer_program};
pub use ty::{Scheme, Ty, TyCon, TyVar};
pub use unify::InferCtx;

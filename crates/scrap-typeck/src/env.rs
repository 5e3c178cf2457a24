//! The typing context: names to type schemes.
//!
//! Inference threads immutable contexts, so extension clones the map.
//! Contexts are small (operators plus in-scope bindings), and immutable
//! extension keeps the letrec and generalization rules straightforward:
//! generalizing a binding consults the *outer* context, never the
//! extension under construction.

use rustc_hash::FxHashMap;

use crate::ty::Scheme;

/// A typing context mapping names (including operator spellings) to
/// schemes.
#[derive(Clone, Debug, Default)]
pub struct TypeEnv {
    bindings: FxHashMap<String, Scheme>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, scheme: Scheme) {
        self.bindings.insert(name.into(), scheme);
    }

    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.bindings.get(name)
    }

    /// A copy of this context with one extra binding.
    pub fn extended(&self, name: impl Into<String>, scheme: Scheme) -> TypeEnv {
        let mut extended = self.clone();
        extended.insert(name, scheme);
        extended
    }

    /// All schemes in scope, for computing the context's free variables.
    pub fn schemes(&self) -> impl Iterator<Item = &Scheme> {
        self.bindings.values()
    }

    /// Consume the context, yielding its bindings. Used to merge the
    /// names a pattern binds into a case body's context.
    pub fn into_bindings(self) -> impl Iterator<Item = (String, Scheme)> {
        self.bindings.into_iter()
    }
}

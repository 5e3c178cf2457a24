//! Type representation: type variables, constructors, rows, and schemes.
//!
//! Types form a union-find forest. A `TyVar` is a key into the inference
//! context's unification table; binding a variable is a write-once
//! forwarding step handled by `ena`. Rows represent record types: a
//! sorted field map plus a tail that is either another row fragment, an
//! unbound variable (open row), or the empty row (closed row).

use std::collections::BTreeMap;
use std::fmt;

/// A type variable, identified by its index in the unification table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TyVar(pub u32);

/// A named type constructor with ordered arguments. Ground types are
/// nullary (`int`, `string`, ...); `->` has two arguments and `list` one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyCon {
    pub name: String,
    pub args: Vec<Ty>,
}

/// A scrapscript type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    Var(TyVar),
    Con(TyCon),
    /// The closed row terminator.
    EmptyRow,
    /// A record row: fields plus a tail. An empty field map with an
    /// empty-row tail is forbidden; constructors enforce it at the call
    /// sites that build rows.
    Row {
        fields: BTreeMap<String, Ty>,
        rest: Box<Ty>,
    },
}

impl Ty {
    pub fn con(name: impl Into<String>, args: Vec<Ty>) -> Ty {
        Ty::Con(TyCon {
            name: name.into(),
            args,
        })
    }

    pub fn int() -> Ty {
        Ty::con("int", vec![])
    }

    pub fn float() -> Ty {
        Ty::con("float", vec![])
    }

    pub fn string() -> Ty {
        Ty::con("string", vec![])
    }

    pub fn bytes() -> Ty {
        Ty::con("bytes", vec![])
    }

    pub fn hole() -> Ty {
        Ty::con("hole", vec![])
    }

    /// `arg -> ret`
    pub fn func(arg: Ty, ret: Ty) -> Ty {
        Ty::con("->", vec![arg, ret])
    }

    /// `item list`
    pub fn list(item: Ty) -> Ty {
        Ty::con("list", vec![item])
    }

    pub fn row(fields: BTreeMap<String, Ty>, rest: Ty) -> Ty {
        Ty::Row {
            fields,
            rest: Box::new(rest),
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "'t{}", v.0),
            Ty::Con(con) => write!(f, "{con}"),
            Ty::EmptyRow => write!(f, "{{}}"),
            Ty::Row { .. } => {
                // Merge structurally chained rows for display.
                let mut flat: BTreeMap<String, &Ty> = BTreeMap::new();
                let mut tail: &Ty = self;
                while let Ty::Row { fields, rest } = tail {
                    for (key, value) in fields {
                        flat.entry(key.clone()).or_insert(value);
                    }
                    tail = &**rest;
                }
                let mut parts: Vec<String> =
                    flat.iter().map(|(k, v)| format!("{k}={v}")).collect();
                match tail {
                    Ty::EmptyRow => {}
                    other => parts.push(format!("...{other}")),
                }
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.args.len() {
            0 => write!(f, "{}", self.name),
            1 => write!(f, "({} {})", self.args[0], self.name),
            _ => {
                let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
                write!(f, "({})", args.join(&self.name))
            }
        }
    }
}

/// A polymorphic type scheme: a type with universally quantified
/// variables. `x -> x` generalizes to `forall a. a -> a`.
#[derive(Clone, Debug, PartialEq)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub ty: Ty,
}

impl Scheme {
    /// A monomorphic scheme (no quantified variables).
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}

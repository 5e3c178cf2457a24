use std::fmt;

use crate::ty::Ty;

/// An inference failure. Types embedded in errors are rendered raw
/// (variables as `'tN`); they may still contain unresolved variables.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeError {
    /// Two types with no unifier.
    UnificationFailed(Ty, Ty),
    /// A variable would occur inside its own binding (infinite type).
    OccursCheck(Ty, Ty),
    /// A row with fields against the closed empty row.
    RowWithEmptyRow(Ty),
    EmptyRowWithRow(Ty),
    /// A row type with no fields and a closed tail.
    EmptyRow,
    /// A row tail resolved to something that is not a row.
    NotARow(Ty),
    /// A variable (or operator) with no scheme in the context.
    UnboundVariable(String),
    /// A node kind the inferencer does not assign a type to.
    NotInferable(&'static str),
    /// A node kind that cannot appear in a pattern.
    NotAPattern(&'static str),
    /// A spread in expression (non-pattern) position.
    SpreadOutsideMatch(&'static str),
    /// Record access whose accessor is not a field name.
    AccessorNotAField,
    /// A `where` whose binding is not an assignment.
    WhereWithoutAssignment,
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::UnificationFailed(a, b) => {
                write!(f, "unification failed for {a} and {b}")
            }
            TypeError::OccursCheck(var, ty) => {
                write!(f, "occurs check failed for {var} and {ty}")
            }
            TypeError::RowWithEmptyRow(row) => {
                write!(f, "unifying row {row} with empty row")
            }
            TypeError::EmptyRowWithRow(row) => {
                write!(f, "unifying empty row with row {row}")
            }
            TypeError::EmptyRow => write!(f, "empty row must have a rest type"),
            TypeError::NotARow(ty) => write!(f, "expected record type, got {ty}"),
            TypeError::UnboundVariable(name) => write!(f, "unbound variable {name}"),
            TypeError::NotInferable(kind) => write!(f, "{kind} cannot be inferred"),
            TypeError::NotAPattern(kind) => {
                write!(f, "{kind} isn't allowed in a pattern")
            }
            TypeError::SpreadOutsideMatch(container) => {
                write!(f, "spread can only occur in a {container} match")
            }
            TypeError::AccessorNotAField => {
                write!(f, "record access requires a field name")
            }
            TypeError::WhereWithoutAssignment => {
                write!(f, "where binding must be an assignment")
            }
        }
    }
}

impl std::error::Error for TypeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TypeError::UnificationFailed(Ty::int(), Ty::string()).to_string(),
            "unification failed for int and string"
        );
        assert_eq!(
            TypeError::UnboundVariable("x".into()).to_string(),
            "unbound variable x"
        );
        assert_eq!(
            TypeError::EmptyRow.to_string(),
            "empty row must have a rest type"
        );
    }
}

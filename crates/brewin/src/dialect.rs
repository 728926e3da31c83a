use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// The four progressive Brewin dialects.
///
/// One evaluator serves all four; each variant switches on the semantics that
/// dialect introduced. The dialects are cumulative for the core language
/// (variables, expressions, control flow, functions), but the v3 type system
/// is its own branch: v4 drops declared types again in exchange for laziness
/// and exceptions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, IntoStaticStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Dialect {
    /// Integers, strings, variables, `print`/`inputi`; a single `main`.
    V1,
    /// Booleans, `if`/`for`, user-defined functions with lexical scoping.
    V2,
    /// Nominal structs, declared types, defaults, Int→Bool coercion.
    V3,
    /// Call-by-need, `try`/`catch`/`raise`, short-circuit `&&`/`||`.
    #[default]
    V4,
}

impl Dialect {
    /// `main` must be the first declared function (v1's loader rule). v1 also
    /// loads no other functions, which is what makes user calls undefined.
    pub(crate) fn main_must_be_first(self) -> bool {
        self == Self::V1
    }

    /// `if` and `for` statements; v1 programs are straight-line.
    pub(crate) fn has_control_flow(self) -> bool {
        self != Self::V1
    }

    /// Boolean literals and the boolean-flavored operators (`!`, `&&`/`||`,
    /// ordered comparisons). v1 keeps only `==`/`!=` out of the
    /// bool-producing set.
    pub(crate) fn has_booleans(self) -> bool {
        self != Self::V1
    }

    /// `*` and `/`; v1 arithmetic stops at `+`/`-`.
    pub(crate) fn has_extended_arithmetic(self) -> bool {
        self != Self::V1
    }

    /// Declared types, structs, dotted field paths, `new`, void returns.
    pub(crate) fn is_typed(self) -> bool {
        self == Self::V3
    }

    /// Int→Bool coercion in conditions, logic, equality and assignment.
    pub(crate) fn coerces_int_to_bool(self) -> bool {
        self == Self::V3
    }

    /// Assignments, arguments and returns are deferred into memoizing thunks.
    pub(crate) fn is_lazy(self) -> bool {
        self == Self::V4
    }

    /// `&&`/`||` stop after the left operand decides the result.
    pub(crate) fn short_circuits(self) -> bool {
        self == Self::V4
    }

    /// `try`/`catch`/`raise` and the `"div0"` builtin exception.
    pub(crate) fn has_exceptions(self) -> bool {
        self == Self::V4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lowercase_names() {
        assert_eq!("v1".parse::<Dialect>().unwrap(), Dialect::V1);
        assert_eq!("v4".parse::<Dialect>().unwrap(), Dialect::V4);
        assert!("v5".parse::<Dialect>().is_err());
    }
}

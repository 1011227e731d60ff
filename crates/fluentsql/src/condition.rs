//! Comparison operators accepted by the filtering methods.
//!
//! Operators arrive as strings (`"="`, `"<="`, `"<=>"`, ...) and are checked
//! against a fixed whitelist before any SQL is written. The null-safe
//! equality operator is rendered by the active dialect.
//!
//! # Example
//! ```ignore
//! use fluentsql::Op;
//!
//! assert_eq!("<=".parse::<Op>()?, Op::Lte);
//! assert!("LIKE".parse::<Op>().is_err());
//! # Ok::<(), fluentsql::QueryError>(())
//! ```

use crate::error::QueryError;
use std::fmt;
use std::str::FromStr;

/// Whitelisted comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// Null-safe equality (`<=>` / `IS NOT DISTINCT FROM`)
    NullSafeEq,
    /// `>`
    Gt,
    /// `>=`
    Gte,
}

impl Op {
    /// Every accepted operator.
    pub const ALL: [Op; 7] = [
        Op::Eq,
        Op::Ne,
        Op::Lt,
        Op::Lte,
        Op::NullSafeEq,
        Op::Gt,
        Op::Gte,
    ];

    /// The operator as written by callers.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::NullSafeEq => "<=>",
            Op::Gt => ">",
            Op::Gte => ">=",
        }
    }

    /// Validate a caller-supplied operator string.
    pub fn parse(op: &str) -> Result<Self, QueryError> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == op)
            .ok_or_else(|| QueryError::InvalidOperator(op.to_string()))
    }
}

impl FromStr for Op {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Op::parse(s)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

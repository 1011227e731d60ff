//! Dialect strategies.
//!
//! A [`Dialect`] renders every dialect-sensitive fragment (date casts, LIKE
//! concatenation, JSON access, null-safe equality, upsert tails). The
//! statement builder owns the clause machinery and delegates to the dialect
//! for everything else, so a dialect never sees the surrounding statement.
//!
//! Two implementations ship with the crate:
//!
//! - [`DefaultDialect`]: MySQL-flavored (`DATE()`, `CONCAT()`, `JSON_*()`,
//!   `ON DUPLICATE KEY UPDATE`).
//! - [`PostgresDialect`]: `CAST(.. AS DATE)`, `||`, `jsonb` operators and
//!   `ON CONFLICT .. DO UPDATE`.

mod mysql;
mod postgres;


pub use mysql::DefaultDialect;
pub use postgres::PostgresDialect;

use crate::condition::Op;
use crate::error::{QueryError, QueryResult};
use crate::ident::IdentStyle;
use crate::script::Syntax;
use crate::tables::TableRegistry;
use crate::upsert::UpsertSpec;
use serde_json::Value;
use std::fmt;

/// A rendered SQL fragment and the parameters its placeholders bind, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A fragment without parameters.
    pub fn sql(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Which side of a LIKE pattern is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeMatch {
    /// `%value%`
    Contains,
    /// `value%`
    StartsWith,
    /// `%value`
    EndsWith,
}

impl LikeMatch {
    /// Pattern pieces in concatenation order.
    pub(crate) fn pieces(self, value: &str) -> Vec<Value> {
        let v = Value::String(value.to_string());
        let pct = || Value::String("%".to_string());
        match self {
            LikeMatch::Contains => vec![pct(), v, pct()],
            LikeMatch::StartsWith => vec![v, pct()],
            LikeMatch::EndsWith => vec![pct(), v],
        }
    }
}

/// How a dialect returns the rows produced by an INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returning {
    /// `INSERT .. RETURNING cols`
    Native,
    /// Insert inside a transaction, then read the rows back.
    Emulated,
}

/// Ordered JSON path/value pairs for set-style JSON operations.
///
/// # Example
/// ```ignore
/// use fluentsql::JsonPairs;
/// use serde_json::json;
///
/// let pairs = JsonPairs::new().pair("author", "Bob").pair("meta.views", 10);
/// assert_eq!(pairs.len(), 2);
///
/// // Flat lists must have an even length.
/// assert!(JsonPairs::from_flat(vec![json!("author")]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonPairs(Vec<(String, Value)>);

impl JsonPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a path/value pair.
    pub fn pair(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.push((path.into(), value.into()));
        self
    }

    /// Build pairs from an alternating `path, value, path, value, ...` list.
    ///
    /// Fails on an odd-length list or a non-string path.
    pub fn from_flat(items: Vec<Value>) -> QueryResult<Self> {
        if items.len() % 2 != 0 {
            return Err(QueryError::configuration(format!(
                "JSON path/value list must have an even length, got {}",
                items.len()
            )));
        }
        let mut pairs = Vec::with_capacity(items.len() / 2);
        let mut it = items.into_iter();
        while let (Some(path), Some(value)) = (it.next(), it.next()) {
            let Value::String(path) = path else {
                return Err(QueryError::configuration(format!(
                    "JSON path must be a string, got {path}"
                )));
            };
            pairs.push((path, value));
        }
        Ok(Self(pairs))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(p, v)| (p.as_str(), v))
    }
}

impl<P: Into<String>, V: Into<Value>> FromIterator<(P, V)> for JsonPairs {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(p, v)| (p.into(), v.into())).collect())
    }
}

impl<P: Into<String>, V: Into<Value>> From<Vec<(P, V)>> for JsonPairs {
    fn from(pairs: Vec<(P, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<P: Into<String>, V: Into<Value>, const N: usize> From<[(P, V); N]> for JsonPairs {
    fn from(pairs: [(P, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Dialect-specific rendering.
///
/// Implementations are stateless; one instance is shared by every statement
/// built against it. Column and document arguments are SQL expressions and are
/// embedded verbatim; everything else is bound as a parameter.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Short name used in errors and log events.
    fn name(&self) -> &'static str;

    /// Identifier quoting style.
    fn ident_style(&self) -> IdentStyle;

    /// Lexical rules for literals, used when scanning raw SQL for placeholders.
    fn syntax(&self) -> Syntax;

    /// Rendering of the null-safe equality operator.
    fn null_safe_eq(&self) -> &'static str;

    /// Rendering of a whitelisted comparison operator.
    fn operator(&self, op: Op) -> &'static str {
        match op {
            Op::NullSafeEq => self.null_safe_eq(),
            other => other.as_str(),
        }
    }

    /// Expression comparing the date part of `column`.
    fn date_filter(&self, column: &str) -> String;

    /// Expression comparing the time part of `column`.
    fn time_filter(&self, column: &str) -> String;

    /// Format `date` using MySQL-style `%` tokens.
    fn date_format(&self, date: &str, format: &str) -> Fragment;

    /// Right-hand side of `col LIKE ...` for `value`.
    fn like(&self, value: &str, matching: LikeMatch) -> Fragment;

    /// Normalize a dotted (optionally `$.`-prefixed) path into the bound path parameter.
    fn json_path(&self, path: &str) -> String;

    fn json_extract(&self, doc: &str, path: &str) -> Fragment;

    /// Set each path of `doc` to its value. Empty `pairs` is a configuration error.
    fn json_set(&self, doc: &str, pairs: &JsonPairs) -> QueryResult<Fragment>;

    fn json_remove(&self, doc: &str, paths: &[&str]) -> QueryResult<Fragment>;

    fn json_exists(&self, doc: &str, path: &str) -> Fragment;

    /// Whether the value at `path` in `doc` contains `value`.
    fn json_contains(&self, doc: &str, path: &str, value: &Value) -> Fragment;

    /// Merge `patch` into `doc`, later keys winning.
    fn json_merge_patch(&self, doc: &str, patch: &Value) -> Fragment;

    fn json_array_append(&self, doc: &str, pairs: &JsonPairs) -> QueryResult<Fragment>;

    fn json_unquote(&self, value: &Value) -> Fragment;

    fn json_compact(&self, value: &Value) -> Fragment;

    /// Tail appended to `INSERT .. VALUES ..` to turn it into an upsert.
    ///
    /// `columns` are the inserted columns, used to infer a conflict target.
    fn upsert_clause(&self, spec: &UpsertSpec, columns: &[String]) -> QueryResult<String>;

    /// How INSERT .. RETURNING is achieved.
    fn returning(&self) -> Returning;

    /// An empty table registry quoting identifiers the way this dialect does.
    fn table_registry(&self) -> TableRegistry {
        TableRegistry::new(self.ident_style())
    }
}

/// `n` comma-separated placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    let mut out = String::with_capacity(n * 2);
    for i in 0..n {
        if i > 0 {
            out.push(',');
        }
        out.push('?');
    }
    out
}

/// Quote `set` columns into `col = <proposed value>` pairs.
pub(crate) fn set_list(
    style: IdentStyle,
    set: &[String],
    proposed: impl Fn(&str) -> String,
) -> String {
    set.iter()
        .map(|col| {
            let quoted = style.quote_column(col);
            let value = proposed(&quoted);
            format!("{quoted} = {value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

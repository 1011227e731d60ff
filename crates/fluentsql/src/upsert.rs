//! Upsert (insert-or-update) configuration.
//!
//! # Example
//! ```ignore
//! use fluentsql::UpsertSpec;
//!
//! // Update email/logins when `username` collides.
//! let spec = UpsertSpec::set(["email", "logins"]).conflict(["username"]);
//!
//! // Or target a named constraint.
//! let spec = UpsertSpec::set(["email"]).constraint("users_username_key");
//! ```

use crate::error::{QueryError, QueryResult};
use serde_json::Value;

/// Where the database detects a collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictTarget {
    /// One or more unique columns.
    Columns(Vec<String>),
    /// A named unique/primary key constraint.
    Constraint(String),
}

/// Columns to update on conflict, plus an optional conflict target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertSpec {
    pub set: Vec<String>,
    pub target: Option<ConflictTarget>,
}

impl UpsertSpec {
    /// Update `columns` with the proposed row's values on conflict.
    pub fn set<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            set: columns.into_iter().map(Into::into).collect(),
            target: None,
        }
    }

    /// Detect conflicts on `columns`.
    pub fn conflict<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = Some(ConflictTarget::Columns(
            columns.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Detect conflicts through a named constraint.
    pub fn constraint(mut self, name: impl Into<String>) -> Self {
        self.target = Some(ConflictTarget::Constraint(name.into()));
        self
    }

    /// Parse a dynamic configuration.
    ///
    /// Accepts either a plain list of columns to set, or an object with
    /// `set` (or `columns`), and optionally `conflict` (string or list) or
    /// `constraint`.
    pub fn from_value(value: &Value) -> QueryResult<Self> {
        match value {
            Value::Array(items) => Ok(Self {
                set: string_list("set", items)?,
                target: None,
            }),
            Value::Object(map) => {
                let set = match map.get("set").or_else(|| map.get("columns")) {
                    Some(Value::Array(items)) => string_list("set", items)?,
                    Some(other) => {
                        return Err(QueryError::usage(format!(
                            "upsert `set` should be an array, got {other}"
                        )));
                    }
                    None => Vec::new(),
                };

                let target = if let Some(constraint) = map.get("constraint") {
                    let Value::String(name) = constraint else {
                        return Err(QueryError::usage("upsert `constraint` should be a string"));
                    };
                    Some(ConflictTarget::Constraint(name.clone()))
                } else {
                    match map.get("conflict") {
                        Some(Value::String(col)) => Some(ConflictTarget::Columns(vec![col.clone()])),
                        Some(Value::Array(items)) => {
                            Some(ConflictTarget::Columns(string_list("conflict", items)?))
                        }
                        Some(other) => {
                            return Err(QueryError::usage(format!(
                                "upsert `conflict` should be a string or an array, got {other}"
                            )));
                        }
                        None => None,
                    }
                };

                Ok(Self { set, target })
            }
            other => Err(QueryError::usage(format!(
                "upsert configuration should be an array or an object, got {other}"
            ))),
        }
    }
}

fn string_list(field: &str, items: &[Value]) -> QueryResult<Vec<String>> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(QueryError::usage(format!(
                "upsert `{field}` entries should be strings, got {other}"
            ))),
        })
        .collect()
}

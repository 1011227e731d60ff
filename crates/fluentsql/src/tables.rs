//! Table registry: known tables, their columns, and column-list rendering.
//!
//! # Example
//! ```ignore
//! use fluentsql::{IdentStyle, TableRegistry};
//!
//! let mut tables = TableRegistry::new(IdentStyle::DoubleQuote);
//! tables
//!     .add_table("users", ["id", "username", "email"])
//!     .add_table("posts", ["id", "user_id", "title"]);
//!
//! assert_eq!(tables.table("users")?, "users");
//! assert_eq!(
//!     tables.pick([("users", ["id", "username"])])?,
//!     r#""users"."id", "users"."username""#
//! );
//! # Ok::<(), fluentsql::QueryError>(())
//! ```

use crate::error::{QueryError, QueryResult};
use crate::ident::IdentStyle;
use serde_json::Value;

#[derive(Debug, Clone)]
struct TableEntry {
    name: String,
    columns: Vec<String>,
}

impl TableEntry {
    fn has(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Registered tables, their columns and the active table prefix.
#[derive(Debug, Clone)]
pub struct TableRegistry {
    style: IdentStyle,
    prefix: String,
    tables: Vec<TableEntry>,
}

impl TableRegistry {
    /// Create an empty registry using the given quoting style.
    pub fn new(style: IdentStyle) -> Self {
        Self {
            style,
            prefix: String::new(),
            tables: Vec::new(),
        }
    }

    /// Create an empty registry with a table prefix.
    pub fn with_prefix(style: IdentStyle, prefix: impl Into<String>) -> Self {
        Self {
            style,
            prefix: prefix.into(),
            tables: Vec::new(),
        }
    }

    /// Quoting style used for rendered columns.
    pub fn style(&self) -> IdentStyle {
        self.style
    }

    /// Change the quoting style. Only names resolved afterwards are affected.
    pub fn set_style(&mut self, style: IdentStyle) -> &mut Self {
        self.style = style;
        self
    }

    /// Current table prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Change the table prefix. Only names resolved afterwards are affected.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = prefix.into();
        self
    }

    /// Register (or replace) a table and its columns.
    ///
    /// Duplicate column names are collapsed; first occurrence wins the
    /// enumeration position.
    pub fn add_table<I, S>(&mut self, name: impl Into<String>, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let mut cols: Vec<String> = Vec::new();
        for col in columns {
            let col = col.into();
            if !cols.contains(&col) {
                cols.push(col);
            }
        }

        match self.tables.iter_mut().find(|t| t.name == name) {
            Some(entry) => entry.columns = cols,
            None => self.tables.push(TableEntry {
                name,
                columns: cols,
            }),
        }
        self
    }

    fn entry(&self, name: &str) -> Option<&TableEntry> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Whether `name` is a registered table.
    pub fn is_table(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Whether `table` is registered and has `column`.
    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.entry(table).is_some_and(|t| t.has(column))
    }

    /// Registered columns of `table`, in insertion order.
    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.entry(table).map(|t| t.columns.as_slice())
    }

    /// Registered table names, in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Resolve a registered table to its prefixed name.
    pub fn table(&self, name: &str) -> QueryResult<String> {
        if self.is_table(name) {
            Ok(format!("{}{}", self.prefix, name))
        } else {
            Err(QueryError::UnknownTable(name.to_string()))
        }
    }

    /// Quote `column`, qualified by `table` when it is non-empty.
    pub fn transform_table_column(&self, table: &str, column: &str) -> String {
        self.style.quote_table_column(table, column)
    }

    /// Render the requested columns of each table.
    ///
    /// Columns that are not registered for their table are skipped.
    pub fn pick<T, C, S>(&self, table_to_columns: impl IntoIterator<Item = (T, C)>) -> QueryResult<String>
    where
        T: AsRef<str>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = String::new();
        for (table, columns) in table_to_columns {
            let table = table.as_ref();
            let prefixed = self.table(table)?;
            let entry = self.entry(table);
            for col in columns {
                let col = col.as_ref();
                if entry.is_some_and(|t| t.has(col)) {
                    self.push_column(&mut out, &prefixed, col);
                }
            }
        }
        Ok(out)
    }

    /// Render every registered column of each table except the listed ones.
    pub fn except<T, C, S>(&self, table_to_columns: impl IntoIterator<Item = (T, C)>) -> QueryResult<String>
    where
        T: AsRef<str>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = String::new();
        for (table, columns) in table_to_columns {
            let table = table.as_ref();
            let prefixed = self.table(table)?;
            let excluded: Vec<S> = columns.into_iter().collect();
            if let Some(entry) = self.entry(table) {
                for col in &entry.columns {
                    if excluded.iter().any(|e| e.as_ref() == col) {
                        continue;
                    }
                    self.push_column(&mut out, &prefixed, col);
                }
            }
        }
        Ok(out)
    }

    /// [`pick`](Self::pick) for a single table.
    pub fn pick_table<C, S>(&self, table: &str, columns: C) -> QueryResult<String>
    where
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.pick([(table, columns)])
    }

    /// [`except`](Self::except) for a single table.
    pub fn except_table<C, S>(&self, table: &str, columns: C) -> QueryResult<String>
    where
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.except([(table, columns)])
    }

    /// A single quoted column of a registered table (empty if unregistered column).
    pub fn column(&self, table: &str, column: &str) -> QueryResult<String> {
        self.pick([(table, [column])])
    }

    /// Every column of every registered table.
    pub fn all_columns(&self) -> String {
        let mut out = String::new();
        for entry in &self.tables {
            let prefixed = format!("{}{}", self.prefix, entry.name);
            for col in &entry.columns {
                self.push_column(&mut out, &prefixed, col);
            }
        }
        out
    }

    /// [`pick`](Self::pick) driven by a JSON object such as `{"users": ["id", "email"]}`.
    pub fn pick_value(&self, table_to_columns: &Value) -> QueryResult<String> {
        self.pick(json_column_map(table_to_columns)?)
    }

    /// [`except`](Self::except) driven by a JSON object such as `{"users": ["password"]}`.
    pub fn except_value(&self, table_to_columns: &Value) -> QueryResult<String> {
        self.except(json_column_map(table_to_columns)?)
    }

    fn push_column(&self, out: &mut String, table: &str, column: &str) {
        if !out.is_empty() {
            out.push_str(", ");
        }
        self.style.write_table_column(out, table, column);
    }
}

fn json_column_map(value: &Value) -> QueryResult<Vec<(&str, Vec<&str>)>> {
    let Value::Object(map) = value else {
        return Err(QueryError::usage("table-to-columns mapping should be an object"));
    };

    let mut out = Vec::with_capacity(map.len());
    for (table, columns) in map {
        let Value::Array(columns) = columns else {
            return Err(QueryError::usage(format!(
                "Column to pick for `{table}` should be an array"
            )));
        };
        let mut names = Vec::with_capacity(columns.len());
        for col in columns {
            match col {
                Value::String(s) => names.push(s.as_str()),
                other => {
                    return Err(QueryError::usage(format!(
                        "Column names for `{table}` should be strings, got {other}"
                    )));
                }
            }
        }
        out.push((table.as_str(), names));
    }
    Ok(out)
}

//! Fluent statement builder.
//!
//! A [`Query`] accumulates SQL text and an ordered parameter list. Every
//! fluent call appends one fragment (joined to the previous one by a single
//! space) and records the emitted [`Clause`], which decides the connector of
//! the next call (`WHERE` then `AND`, `ORDER BY` then `,`, ...).
//!
//! Values are always bound: each `?` in the text has exactly one entry in
//! [`Query::params`], in order of appearance. Subqueries are spliced in
//! together with their parameters at the point their SQL is embedded.
//!
//! # Example
//! ```ignore
//! use fluentsql::{DefaultDialect, StatementFactory};
//!
//! let factory = StatementFactory::new(driver, DefaultDialect, tables);
//!
//! let mut q = factory.query();
//! q.select("id, username")
//!     .from("users")
//!     .and_where("logins", ">", 3)?
//!     .where_not_null("email")
//!     .order_by_desc("id")
//!     .limit(10);
//!
//! assert_eq!(
//!     q.sql(),
//!     "SELECT id, username FROM users WHERE logins > ? AND email IS NOT NULL ORDER BY id DESC LIMIT ?"
//! );
//! let rows = q.fetch_result().await?;
//! ```

mod exec;
mod filter;
mod json;
mod mutation;
mod select;


pub use mutation::IntoRows;

use crate::clause::{Clause, Conj, Connector};
use crate::client::{Driver, FetchShape};
use crate::condition::Op;
use crate::config::BuilderConfig;
use crate::dialect::{Dialect, Fragment};
use crate::error::{QueryError, QueryResult};
use crate::script;
use crate::tables::TableRegistry;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for statement identities.
static QUERY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a statement. Clones share it; fresh statements never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId(u64);

impl QueryId {
    fn next() -> Self {
        Self(QUERY_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A statement under construction.
///
/// Obtained from [`StatementFactory::query`](crate::StatementFactory::query)
/// or [`Query::q`]. Fluent methods take `&mut self` and return `&mut Self`
/// (or `QueryResult<&mut Self>` when the call validates its input); a failed
/// call leaves the accumulated text untouched.
pub struct Query<C> {
    id: QueryId,
    driver: Arc<C>,
    dialect: Arc<dyn Dialect>,
    tables: Arc<TableRegistry>,
    config: Arc<BuilderConfig>,
    sql: String,
    params: Vec<Value>,
    last: Clause,
    row_count: Option<u64>,
    fetch_shape: FetchShape,
    chunk_size: usize,
    /// Offset of the open `WITH` keyword.
    cte_start: usize,
}

impl<C> Clone for Query<C> {
    /// The clone is the same statement: it keeps the identity, so it cannot
    /// be embedded into the original.
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            driver: Arc::clone(&self.driver),
            dialect: Arc::clone(&self.dialect),
            tables: Arc::clone(&self.tables),
            config: Arc::clone(&self.config),
            sql: self.sql.clone(),
            params: self.params.clone(),
            last: self.last,
            row_count: self.row_count,
            fetch_shape: self.fetch_shape,
            chunk_size: self.chunk_size,
            cte_start: self.cte_start,
        }
    }
}

impl<C> fmt::Debug for Query<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("id", &self.id)
            .field("dialect", &self.dialect.name())
            .field("sql", &self.sql)
            .field("params", &self.params)
            .field("last", &self.last)
            .field("row_count", &self.row_count)
            .finish()
    }
}

impl<C: Driver> Query<C> {
    pub(crate) fn new(
        driver: Arc<C>,
        dialect: Arc<dyn Dialect>,
        tables: Arc<TableRegistry>,
        config: Arc<BuilderConfig>,
    ) -> Self {
        Self {
            id: QueryId::next(),
            driver,
            dialect,
            tables,
            fetch_shape: config.fetch_shape,
            chunk_size: config.chunk_size,
            config,
            sql: String::new(),
            params: Vec::new(),
            last: Clause::None,
            row_count: None,
            cte_start: 0,
        }
    }

    /// A fresh, empty statement sharing this one's driver, dialect and tables.
    pub fn q(&self) -> Self {
        Self::new(
            Arc::clone(&self.driver),
            Arc::clone(&self.dialect),
            Arc::clone(&self.tables),
            Arc::clone(&self.config),
        )
    }
}

impl<C> Query<C> {
    // ==================== Accessors ====================

    pub fn id(&self) -> QueryId {
        self.id
    }

    /// The accumulated SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters, in placeholder order.
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// The clause emitted by the most recent fluent call.
    pub fn last_clause(&self) -> Clause {
        self.last
    }

    /// Rows affected or returned by the most recent execution.
    pub fn row_count(&self) -> Option<u64> {
        self.row_count
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn tables(&self) -> &TableRegistry {
        &self.tables
    }

    pub fn driver(&self) -> &C {
        &self.driver
    }

    pub fn get_fetch_shape(&self) -> FetchShape {
        self.fetch_shape
    }

    /// Set how rows are materialized by the next fetch.
    pub fn fetch_shape(&mut self, shape: FetchShape) -> &mut Self {
        self.fetch_shape = shape;
        self
    }

    /// Set the batch insert chunk size for this statement. Zero is treated as one.
    pub fn chunk_size(&mut self, size: usize) -> &mut Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Drop the accumulated text, parameters, clause state and row count.
    pub fn reset(&mut self) -> &mut Self {
        self.sql.clear();
        self.params.clear();
        self.last = Clause::None;
        self.row_count = None;
        self.cte_start = 0;
        self
    }

    /// The accumulated SQL and parameters as a fragment.
    pub fn to_fragment(&self) -> Fragment {
        Fragment::new(self.sql.clone(), self.params.clone())
    }

    /// Check that every placeholder has exactly one bound parameter.
    pub fn validate(&self) -> QueryResult<()> {
        let placeholders = script::count_placeholders(self.dialect.syntax(), &self.sql);
        if placeholders != self.params.len() {
            return Err(QueryError::ParamMismatch {
                placeholders,
                params: self.params.len(),
            });
        }
        Ok(())
    }

    // ==================== Escape hatches ====================

    /// Append raw SQL text.
    pub fn raw(&mut self, sql: &str) -> &mut Self {
        self.resume();
        self.push(sql);
        self.last = Clause::Raw;
        self
    }

    /// Append raw SQL text with the parameters its placeholders bind.
    pub fn raw_bind<I, V>(&mut self, sql: &str, params: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let params: Vec<Value> = params.into_iter().map(Into::into).collect();
        let placeholders = script::count_placeholders(self.dialect.syntax(), sql);
        if placeholders != params.len() {
            return Err(QueryError::ParamMismatch {
                placeholders,
                params: params.len(),
            });
        }
        self.resume();
        self.push(sql);
        self.params.extend(params);
        self.last = Clause::Raw;
        Ok(self)
    }

    /// Apply `f` only when `condition` holds.
    pub fn when(&mut self, condition: bool, f: impl FnOnce(&mut Self)) -> &mut Self {
        if condition {
            f(self);
        }
        self
    }

    /// Apply `then` when `condition` holds, `otherwise` when it does not.
    pub fn when_else(
        &mut self,
        condition: bool,
        then: impl FnOnce(&mut Self),
        otherwise: impl FnOnce(&mut Self),
    ) -> &mut Self {
        if condition {
            then(self);
        } else {
            otherwise(self);
        }
        self
    }

    // ==================== Internals ====================

    /// Leave the executed state before a new fluent call.
    fn resume(&mut self) {
        if self.last == Clause::Done {
            tracing::warn!(
                target: "fluentsql::sql",
                query = self.id.0,
                "fluent call on an executed statement; continuing from an empty clause state"
            );
            self.last = Clause::None;
        }
    }

    /// Append `fragment`, separated from the previous one by a single space.
    fn push(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        if !self.sql.is_empty() && !self.sql.ends_with(' ') {
            self.sql.push(' ');
        }
        self.sql.push_str(fragment);
    }

    /// Emit the connector for `next` and record it as the last clause.
    fn open(&mut self, next: Clause, conj: Conj) {
        self.resume();
        match self.last.connector(next, conj) {
            Connector::Keyword(keyword) => self.push(keyword),
            Connector::Comma => self.sql.push(','),
            Connector::Empty => {}
        }
        self.last = next;
    }

    /// Append a rendered fragment and its parameters.
    fn push_fragment(&mut self, fragment: Fragment) {
        self.push(&fragment.sql);
        self.params.extend(fragment.params);
    }

    /// Validate and render a comparison operator.
    fn operator(&self, op: &str) -> QueryResult<&'static str> {
        let op = Op::parse(op)?;
        Ok(self.dialect.operator(op))
    }

    /// Reject embedding a statement into itself.
    fn guard(&self, other: &Query<C>) -> QueryResult<()> {
        if other.id == self.id {
            return Err(QueryError::SelfReference);
        }
        Ok(())
    }

    /// `( child )` with the child's parameters appended.
    fn push_wrapped(&mut self, prefix: &str, child: &Query<C>, suffix: &str) {
        let mut sql = String::with_capacity(prefix.len() + child.sql.len() + suffix.len() + 6);
        if !prefix.is_empty() {
            sql.push_str(prefix);
            sql.push(' ');
        }
        sql.push_str("( ");
        sql.push_str(&child.sql);
        sql.push_str(" )");
        if !suffix.is_empty() {
            sql.push(' ');
            sql.push_str(suffix);
        }
        self.push(&sql);
        self.params.extend(child.params.iter().cloned());
    }

    fn quote_column(&self, column: &str) -> String {
        self.tables.style().quote_column(column)
    }
}

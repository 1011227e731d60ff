//! # fluentsql
//!
//! A fluent SQL statement builder that assembles parameterized SQL
//! incrementally and runs it through a pluggable [`Driver`].
//!
//! ## Features
//!
//! - **Bound values only**: every value becomes a `?` placeholder with a matching parameter
//! - **Dialects**: one fluent vocabulary rendered for a MySQL-flavored default or PostgreSQL
//! - **Clause state machine**: `WHERE`/`AND`/`OR`, `ORDER BY ... , ...` and friends are connected automatically
//! - **Composable**: subqueries, CTEs and set operations splice in their parameters
//! - **Batch inserts and upserts**: chunked multi-row `INSERT`, `ON DUPLICATE KEY` / `ON CONFLICT`
//! - **Pagination**: page arithmetic and link windows over an explicit request context
//!
//! ## Example
//!
//! ```ignore
//! use fluentsql::prelude::*;
//!
//! let mut tables = TableRegistry::new(IdentStyle::DoubleQuote);
//! tables.add_table("users", ["id", "username", "email", "settings"]);
//! let factory = StatementFactory::new(client, PostgresDialect, tables);
//!
//! // SELECT
//! let rows = factory
//!     .query()
//!     .select("id, username")
//!     .from("users")
//!     .where_like("username", "ali")
//!     .order_by_asc("id")
//!     .limit(10)
//!     .fetch_result()
//!     .await?;
//!
//! // UPDATE with a JSON expression
//! let mut settings = factory.query();
//! settings.json_set("settings", [("theme", json!("dark"))])?;
//! factory
//!     .query()
//!     .update("users")
//!     .set_query("settings", &settings)?
//!     .and_where("id", "=", 1)?
//!     .exec()
//!     .await?;
//!
//! // INSERT
//! factory
//!     .query()
//!     .insert("users", json!([{"username": "bob"}, {"username": "carol"}]))
//!     .await?;
//! ```

pub mod clause;
pub mod client;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod factory;
pub mod ident;
pub mod pagination;
pub mod prelude;
pub mod query;
pub mod row;
pub mod script;
pub mod tables;
pub mod transaction;
pub mod upsert;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(test)]
mod testing;

pub use clause::{Clause, Conj, JoinKind, JsonOp, SetOp};
pub use client::{Driver, FetchShape};
pub use condition::Op;
pub use config::BuilderConfig;
pub use dialect::{DefaultDialect, Dialect, Fragment, JsonPairs, LikeMatch, PostgresDialect, Returning};
pub use error::{BoxError, ErrorKind, QueryError, QueryResult};
pub use factory::StatementFactory;
pub use ident::IdentStyle;
pub use pagination::{Page, PageContext, PageLink, Paginator};
pub use query::{IntoRows, Query, QueryId};
pub use row::Row;
pub use script::Syntax;
pub use tables::TableRegistry;
pub use upsert::{ConflictTarget, UpsertSpec};

#[cfg(feature = "pool")]
pub use postgres::{create_pool, create_pool_with_size};

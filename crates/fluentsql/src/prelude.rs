//! Convenient imports for typical `fluentsql` usage.
//!
//! ```ignore
//! use fluentsql::prelude::*;
//! ```

pub use crate::{
    BuilderConfig, DefaultDialect, Dialect, Driver, FetchShape, IdentStyle, PageContext, PostgresDialect, Query,
    QueryError, QueryResult, Row, StatementFactory, TableRegistry, UpsertSpec,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_size};

pub use serde_json::json;

//! Driver trait: the boundary between statement assembly and the database.

use crate::error::QueryResult;
use crate::row::Row;
use serde_json::Value;
use std::sync::Arc;

/// How result rows are materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchShape {
    /// Positional values only.
    Row,
    /// Column names paired with values.
    #[default]
    Object,
}

/// A database connection able to run `?`-placeholder statements.
///
/// The builder hands over the SQL text and the ordered parameter list; the
/// driver binds them positionally, runs the statement and reports rows or an
/// affected-row count. Drivers are shared by reference between every statement
/// produced by one [`StatementFactory`](crate::StatementFactory).
pub trait Driver: Send + Sync {
    /// Execute a query and return all rows shaped per `shape`.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
        shape: FetchShape,
    ) -> impl std::future::Future<Output = QueryResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QueryResult<u64>> + Send;

    /// Identifier generated by the most recent insert on this connection.
    ///
    /// The default implementation returns `None`.
    fn last_insert_id(&self) -> impl std::future::Future<Output = QueryResult<Option<Value>>> + Send {
        async { Ok(None) }
    }

    /// Start a transaction. The default implementation issues `BEGIN`.
    fn begin(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        async move { self.execute("BEGIN", &[]).await.map(|_| ()) }
    }

    /// Commit the current transaction. The default implementation issues `COMMIT`.
    fn commit(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        async move { self.execute("COMMIT", &[]).await.map(|_| ()) }
    }

    /// Roll back the current transaction. The default implementation issues `ROLLBACK`.
    fn rollback(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        async move { self.execute("ROLLBACK", &[]).await.map(|_| ()) }
    }
}

// ===== Reference implementations =====

impl<C: Driver> Driver for &C {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
        shape: FetchShape,
    ) -> impl std::future::Future<Output = QueryResult<Vec<Row>>> + Send {
        (*self).query(sql, params, shape)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QueryResult<u64>> + Send {
        (*self).execute(sql, params)
    }

    fn last_insert_id(&self) -> impl std::future::Future<Output = QueryResult<Option<Value>>> + Send {
        (*self).last_insert_id()
    }

    fn begin(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        (*self).begin()
    }

    fn commit(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        (*self).commit()
    }

    fn rollback(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        (*self).rollback()
    }
}

impl<C: Driver> Driver for Arc<C> {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
        shape: FetchShape,
    ) -> impl std::future::Future<Output = QueryResult<Vec<Row>>> + Send {
        self.as_ref().query(sql, params, shape)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = QueryResult<u64>> + Send {
        self.as_ref().execute(sql, params)
    }

    fn last_insert_id(&self) -> impl std::future::Future<Output = QueryResult<Option<Value>>> + Send {
        self.as_ref().last_insert_id()
    }

    fn begin(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        self.as_ref().begin()
    }

    fn commit(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        self.as_ref().commit()
    }

    fn rollback(&self) -> impl std::future::Future<Output = QueryResult<()>> + Send {
        self.as_ref().rollback()
    }
}

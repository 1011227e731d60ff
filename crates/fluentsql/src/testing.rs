//! In-crate recording driver for unit tests.

use crate::client::{Driver, FetchShape};
use crate::error::{QueryError, QueryResult};
use crate::row::Row;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Captures every `(sql, params)` pair and replays scripted results.
///
/// `query` pops the next scripted row set (empty when none is left);
/// `execute` pops the next scripted affected count (1 when none is left).
#[derive(Debug, Default)]
pub(crate) struct RecordingDriver {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    affected: Mutex<VecDeque<u64>>,
    last_insert_id: Option<Value>,
    fail_on: Option<String>,
}

impl RecordingDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_rows(self, rows: Vec<Row>) -> Self {
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    pub(crate) fn with_affected(self, count: u64) -> Self {
        self.affected.lock().unwrap().push_back(count);
        self
    }

    pub(crate) fn with_last_insert_id(mut self, id: impl Into<Value>) -> Self {
        self.last_insert_id = Some(id.into());
        self
    }

    /// Fail every statement starting with `prefix`.
    pub(crate) fn fail_on(mut self, prefix: &str) -> Self {
        self.fail_on = Some(prefix.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.calls().into_iter().map(|(sql, _)| sql).collect()
    }

    fn record(&self, sql: &str, params: &[Value]) -> QueryResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        match &self.fail_on {
            Some(prefix) if sql.starts_with(prefix.as_str()) => {
                Err(QueryError::driver(format!("scripted failure for `{sql}`")))
            }
            _ => Ok(()),
        }
    }
}

impl Driver for RecordingDriver {
    async fn query(&self, sql: &str, params: &[Value], shape: FetchShape) -> QueryResult<Vec<Row>> {
        self.record(sql, params)?;
        let rows = self.rows.lock().unwrap().pop_front().unwrap_or_default();
        Ok(rows.into_iter().map(|row| row.into_shape(shape)).collect())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> QueryResult<u64> {
        self.record(sql, params)?;
        Ok(self.affected.lock().unwrap().pop_front().unwrap_or(1))
    }

    async fn last_insert_id(&self) -> QueryResult<Option<Value>> {
        Ok(self.last_insert_id.clone())
    }
}

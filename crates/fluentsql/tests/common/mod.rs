#![allow(dead_code)]

use fluentsql::{Driver, FetchShape, QueryError, QueryResult, Row};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-memory driver: records statements and replays scripted row sets.
///
/// `execute` consumes the next scripted row set too and reports its length
/// as the affected-row count.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    log: Mutex<Vec<(String, Vec<Value>)>>,
    results: Mutex<VecDeque<QueryResult<Vec<Row>>>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(self, rows: Vec<Row>) -> Self {
        self.results.lock().unwrap().push_back(Ok(rows));
        self
    }

    pub fn failing(self, message: &str) -> Self {
        self.results
            .lock()
            .unwrap()
            .push_back(Err(QueryError::driver(message.to_string())));
        self
    }

    pub fn log(&self) -> Vec<(String, Vec<Value>)> {
        self.log.lock().unwrap().clone()
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.log().into_iter().map(|(sql, _)| sql).collect()
    }
}

impl Driver for ScriptedDriver {
    async fn query(&self, sql: &str, params: &[Value], shape: FetchShape) -> QueryResult<Vec<Row>> {
        self.log.lock().unwrap().push((sql.to_string(), params.to_vec()));
        let next = self.results.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()));
        next.map(|rows| rows.into_iter().map(|row| row.into_shape(shape)).collect())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> QueryResult<u64> {
        self.log.lock().unwrap().push((sql.to_string(), params.to_vec()));
        let next = self.results.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()));
        next.map(|rows| rows.len() as u64)
    }
}

/// Object-shaped row from a JSON object literal.
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => Row::from_object(map),
        other => panic!("expected a JSON object, got {other}"),
    }
}

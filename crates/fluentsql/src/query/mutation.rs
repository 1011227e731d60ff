//! UPDATE / DELETE clauses and batch INSERT execution.

use super::Query;
use crate::clause::{Clause, Conj};
use crate::client::Driver;
use crate::dialect::{Returning, placeholders};
use crate::error::{QueryError, QueryResult};
use crate::row::Row;
use crate::upsert::UpsertSpec;
use serde::Serialize;
use serde_json::{Map, Value};

/// Input accepted by the batch insert methods: one row-map or many.
pub trait IntoRows {
    fn into_rows(self) -> QueryResult<Vec<Map<String, Value>>>;
}

impl IntoRows for Map<String, Value> {
    fn into_rows(self) -> QueryResult<Vec<Map<String, Value>>> {
        Ok(vec![self])
    }
}

impl IntoRows for Vec<Map<String, Value>> {
    fn into_rows(self) -> QueryResult<Vec<Map<String, Value>>> {
        Ok(self)
    }
}

/// A JSON object is one row; an array of objects is a batch.
impl IntoRows for Value {
    fn into_rows(self) -> QueryResult<Vec<Map<String, Value>>> {
        match self {
            Value::Object(row) => Ok(vec![row]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(QueryError::usage(format!(
                        "insert rows should be objects, got {other}"
                    ))),
                })
                .collect(),
            other => Err(QueryError::usage(format!(
                "insert data should be an object or an array of objects, got {other}"
            ))),
        }
    }
}

/// Any slice of serializable records (structs serialize to objects).
impl<T: Serialize> IntoRows for &[T] {
    fn into_rows(self) -> QueryResult<Vec<Map<String, Value>>> {
        let value = serde_json::to_value(self)
            .map_err(|e| QueryError::usage(format!("insert rows could not be serialized: {e}")))?;
        value.into_rows()
    }
}

/// Rows normalized to the first row's column set.
struct Batch {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Batch {
    fn new(rows: Vec<Map<String, Value>>) -> Option<Self> {
        let columns: Vec<String> = rows.first()?.keys().cloned().collect();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|col| row.remove(col).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Some(Self { columns, rows })
    }

    /// `INSERT INTO table (cols) VALUES (?,..),(?,..)` for `chunk`, plus its flattened params.
    fn statement(&self, head: &str, chunk: &[Vec<Value>], tail: Option<&str>) -> (String, Vec<Value>) {
        let group = format!("({})", placeholders(self.columns.len()));
        let groups = vec![group; chunk.len()].join(",");
        let mut sql = format!("{head} VALUES {groups}");
        if let Some(tail) = tail {
            sql.push(' ');
            sql.push_str(tail);
        }
        let params = chunk.iter().flatten().cloned().collect();
        (sql, params)
    }
}

impl<C> Query<C> {
    // ==================== UPDATE / DELETE ====================

    /// `UPDATE table`
    pub fn update(&mut self, table: &str) -> &mut Self {
        self.resume();
        self.push(&format!("UPDATE {table}"));
        self.last = Clause::Update;
        self
    }

    /// `SET col = ?`, or `, col = ?` for further assignments.
    pub fn set(&mut self, col: &str, value: impl Into<Value>) -> &mut Self {
        self.open(Clause::Set, Conj::And);
        self.push(&format!("{col} = ?"));
        self.params.push(value.into());
        self
    }

    /// `SET col = ( expr )` where `expr` is another statement's text and parameters.
    pub fn set_query(&mut self, col: &str, expr: &Query<C>) -> QueryResult<&mut Self> {
        self.guard(expr)?;
        self.open(Clause::Set, Conj::And);
        self.push_wrapped(&format!("{col} ="), expr, "");
        Ok(self)
    }

    /// `DELETE`; follow with [`from`](Self::from).
    pub fn delete(&mut self) -> &mut Self {
        self.resume();
        self.push("DELETE");
        self.last = Clause::Delete;
        self
    }

    /// `DELETE FROM table`
    pub fn delete_from(&mut self, table: &str) -> &mut Self {
        self.delete();
        self.push(&format!("FROM {table}"));
        self.last = Clause::From;
        self
    }

    /// `INSERT INTO table (cols) <select>` using `select`'s text and parameters.
    pub fn insert_select(&mut self, table: &str, columns: &[&str], select: &Query<C>) -> QueryResult<&mut Self> {
        if table.trim().is_empty() {
            return Err(QueryError::usage("insert requires a table name"));
        }
        self.guard(select)?;
        self.resume();
        let cols: Vec<String> = columns.iter().map(|c| self.quote_column(c)).collect();
        self.push(&format!("INSERT INTO {table} ({}) {}", cols.join(","), select.sql.trim()));
        self.params.extend(select.params.iter().cloned());
        self.last = Clause::Insert;
        Ok(self)
    }

    fn insert_head(&self, table: &str, columns: &[String]) -> String {
        let cols: Vec<String> = columns.iter().map(|c| self.quote_column(c)).collect();
        format!("INSERT INTO {table} ({})", cols.join(","))
    }

    fn returning_list(&self, returning: &[&str]) -> String {
        returning
            .iter()
            .map(|c| if *c == "*" { "*".to_string() } else { self.quote_column(c) })
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn require_table(table: &str) -> QueryResult<()> {
    if table.trim().is_empty() {
        return Err(QueryError::usage("insert requires a table name"));
    }
    Ok(())
}

impl<C: Driver> Query<C> {
    // ==================== Batch INSERT ====================

    /// Insert one row or many, `chunk_size` rows per statement.
    ///
    /// Columns come from the first row; keys missing from later rows bind
    /// `NULL`. Returns the summed affected-row count. Empty input issues no
    /// statement.
    pub async fn insert(&mut self, table: &str, rows: impl IntoRows) -> QueryResult<u64> {
        require_table(table)?;
        let rows = rows.into_rows()?;
        self.insert_chunks(table, rows, None).await
    }

    /// Insert-or-update: rows colliding on the conflict target get `spec.set` updated.
    pub async fn insert_on_duplicate(
        &mut self,
        table: &str,
        rows: impl IntoRows,
        spec: &UpsertSpec,
    ) -> QueryResult<u64> {
        require_table(table)?;
        let rows = rows.into_rows()?;
        self.insert_chunks(table, rows, Some(spec)).await
    }

    async fn insert_chunks(
        &mut self,
        table: &str,
        rows: Vec<Map<String, Value>>,
        upsert: Option<&UpsertSpec>,
    ) -> QueryResult<u64> {
        let Some(batch) = Batch::new(rows) else {
            self.row_count = Some(0);
            return Ok(0);
        };
        let tail = match upsert {
            Some(spec) => Some(self.dialect.upsert_clause(spec, &batch.columns)?),
            None => None,
        };
        let head = self.insert_head(table, &batch.columns);

        let mut total = 0u64;
        let chunks = batch.rows.chunks(self.chunk_size);
        let chunk_count = chunks.len();
        for (index, chunk) in chunks.enumerate() {
            let (sql, params) = batch.statement(&head, chunk, tail.as_deref());
            self.log_chunk(&sql, params.len(), index, chunk_count);
            total += self.driver.execute(&sql, &params).await?;
        }

        self.row_count = Some(total);
        self.last = Clause::Done;
        Ok(total)
    }

    /// Insert rows and return `returning` columns of the inserted rows.
    ///
    /// Dialects with native `RETURNING` use it directly. Otherwise the insert
    /// runs in a transaction and the rows are read back by `primary_key`
    /// (from the driver's last insert id) or, without an id, by matching the
    /// inserted values. Any failure rolls the transaction back before the
    /// error is returned.
    pub async fn insert_returning(
        &mut self,
        table: &str,
        rows: impl IntoRows,
        returning: &[&str],
        primary_key: &str,
    ) -> QueryResult<Vec<Row>> {
        require_table(table)?;
        let Some(batch) = Batch::new(rows.into_rows()?) else {
            self.row_count = Some(0);
            return Ok(Vec::new());
        };

        let result = match self.dialect.returning() {
            Returning::Native => self.insert_returning_native(table, &batch, returning).await,
            Returning::Emulated => {
                self.driver.begin().await?;
                match self.insert_returning_emulated(table, &batch, returning, primary_key).await {
                    Ok(rows) => {
                        self.driver.commit().await?;
                        Ok(rows)
                    }
                    Err(error) => {
                        tracing::warn!(
                            target: "fluentsql::sql",
                            dialect = self.dialect.name(),
                            table,
                            error = %error,
                            "insert returning failed; rolling back"
                        );
                        match self.driver.rollback().await {
                            Ok(()) => Err(error),
                            Err(rollback) => Err(QueryError::RollbackFailed {
                                error: Box::new(error),
                                rollback: Box::new(rollback),
                            }),
                        }
                    }
                }
            }
        };

        let rows = result?;
        self.last = Clause::Done;
        Ok(rows)
    }

    async fn insert_returning_native(
        &mut self,
        table: &str,
        batch: &Batch,
        returning: &[&str],
    ) -> QueryResult<Vec<Row>> {
        let head = self.insert_head(table, &batch.columns);
        let tail = format!("RETURNING {}", self.returning_list(returning));
        let mut out = Vec::with_capacity(batch.rows.len());
        let chunks = batch.rows.chunks(self.chunk_size);
        let chunk_count = chunks.len();
        for (index, chunk) in chunks.enumerate() {
            let (sql, params) = batch.statement(&head, chunk, Some(&tail));
            self.log_chunk(&sql, params.len(), index, chunk_count);
            out.extend(self.driver.query(&sql, &params, self.fetch_shape).await?);
        }
        self.row_count = Some(out.len() as u64);
        Ok(out)
    }

    async fn insert_returning_emulated(
        &mut self,
        table: &str,
        batch: &Batch,
        returning: &[&str],
        primary_key: &str,
    ) -> QueryResult<Vec<Row>> {
        let head = self.insert_head(table, &batch.columns);
        let select = format!("SELECT {} FROM {table}", self.returning_list(returning));
        let pk = self.quote_column(primary_key);

        let mut inserted = 0u64;
        let mut out = Vec::with_capacity(batch.rows.len());
        let chunks = batch.rows.chunks(self.chunk_size);
        let chunk_count = chunks.len();
        for (index, chunk) in chunks.enumerate() {
            let (sql, params) = batch.statement(&head, chunk, None);
            self.log_chunk(&sql, params.len(), index, chunk_count);
            let count = self.driver.execute(&sql, &params).await?;
            inserted += count;

            let (sql, params) = match self.driver.last_insert_id().await? {
                Some(id) => (
                    format!("{select} WHERE {pk} >= ? ORDER BY {pk} LIMIT ?"),
                    vec![id, Value::from(count)],
                ),
                None => self.exact_match(&select, batch, chunk),
            };
            self.log_statement(&sql, params.len());
            out.extend(self.driver.query(&sql, &params, self.fetch_shape).await?);
        }
        self.row_count = Some(inserted);
        Ok(out)
    }

    /// `WHERE (c1 <=> ? AND c2 <=> ?) OR (...)` over the inserted values.
    fn exact_match(&self, select: &str, batch: &Batch, chunk: &[Vec<Value>]) -> (String, Vec<Value>) {
        let eq = self.dialect.null_safe_eq();
        let row_match = batch
            .columns
            .iter()
            .map(|c| format!("{} {eq} ?", self.quote_column(c)))
            .collect::<Vec<_>>()
            .join(" AND ");
        let groups = vec![format!("({row_match})"); chunk.len()].join(" OR ");
        let params = chunk.iter().flatten().cloned().collect();
        (format!("{select} WHERE {groups}"), params)
    }
}

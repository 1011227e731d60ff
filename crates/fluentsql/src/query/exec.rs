//! Execution: fetches, mutations, raw passthrough and pagination.
//!
//! Every path checks the placeholder/parameter invariant before the driver
//! sees the statement, logs it on the `fluentsql::sql` target and leaves the
//! builder in the [`Clause::Done`] state.

use super::Query;
use crate::clause::Clause;
use crate::client::{Driver, FetchShape};
use crate::config::truncate_sql;
use crate::error::{QueryError, QueryResult};
use crate::pagination::{Page, PageContext, Paginator};
use crate::row::Row;
use crate::script::{self, Syntax};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;

impl<C> Query<C> {
    pub(super) fn log_statement(&self, sql: &str, param_count: usize) {
        tracing::debug!(
            target: "fluentsql::sql",
            dialect = self.dialect.name(),
            query = self.id.0,
            param_count,
            shape = ?self.fetch_shape,
            sql = %truncate_sql(sql, self.config.max_logged_sql),
        );
    }

    pub(super) fn log_chunk(&self, sql: &str, param_count: usize, index: usize, chunks: usize) {
        tracing::debug!(
            target: "fluentsql::sql",
            dialect = self.dialect.name(),
            query = self.id.0,
            chunk = index + 1,
            chunks,
            param_count,
            sql = %truncate_sql(sql, self.config.max_logged_sql),
        );
    }
}

fn check_params(syntax: Syntax, sql: &str, params: &[Value]) -> QueryResult<()> {
    let placeholders = script::count_placeholders(syntax, sql);
    if placeholders != params.len() {
        return Err(QueryError::ParamMismatch {
            placeholders,
            params: params.len(),
        });
    }
    Ok(())
}

/// Read a `COUNT(*)` cell, which drivers may report as a number or as text.
fn count_value(value: Option<&Value>) -> QueryResult<u64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| QueryError::decode("total", format!("expected a row count, got {value:?}")))
}

impl<C: Driver> Query<C> {
    // ==================== Fetch / exec ====================

    /// Run the statement and return every row.
    pub async fn fetch_result(&mut self) -> QueryResult<Vec<Row>> {
        self.validate()?;
        self.log_statement(&self.sql, self.params.len());
        let rows = self
            .driver
            .query(&self.sql, &self.params, self.fetch_shape)
            .await?;
        self.row_count = Some(rows.len() as u64);
        self.last = Clause::Done;
        Ok(rows)
    }

    /// Run the statement and deserialize every row into `T`.
    pub async fn fetch_result_as<T: DeserializeOwned>(&mut self) -> QueryResult<Vec<T>> {
        self.fetch_result().await?.iter().map(Row::deserialize).collect()
    }

    /// Run the statement and return its first row, or `None` when it returns nothing.
    pub async fn fetch_first(&mut self) -> QueryResult<Option<Row>> {
        Ok(self.fetch_result().await?.into_iter().next())
    }

    pub async fn fetch_first_as<T: DeserializeOwned>(&mut self) -> QueryResult<Option<T>> {
        self.fetch_first()
            .await?
            .map(|row| row.deserialize())
            .transpose()
    }

    /// Run the statement as a mutation and return the affected-row count.
    pub async fn exec(&mut self) -> QueryResult<u64> {
        self.validate()?;
        self.log_statement(&self.sql, self.params.len());
        let affected = self.driver.execute(&self.sql, &self.params).await?;
        self.row_count = Some(affected);
        self.last = Clause::Done;
        Ok(affected)
    }

    // ==================== Raw passthrough ====================

    /// Run `?`-placeholder SQL directly, ignoring the accumulated statement.
    pub async fn run<I, V>(&mut self, sql: &str, params: I) -> QueryResult<Vec<Row>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let params: Vec<Value> = params.into_iter().map(Into::into).collect();
        self.run_values(sql, &params).await
    }

    /// Like [`run`](Self::run), returning the first row.
    pub async fn row<I, V>(&mut self, sql: &str, params: I) -> QueryResult<Option<Row>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Ok(self.run(sql, params).await?.into_iter().next())
    }

    /// Run SQL written with `$1`, `$2`, ... markers.
    ///
    /// Markers may repeat or appear out of order; parameters are rearranged
    /// to follow them.
    pub async fn run_pg<I, V>(&mut self, sql: &str, params: I) -> QueryResult<Vec<Row>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let params: Vec<Value> = params.into_iter().map(Into::into).collect();
        let (sql, params) = script::dollar_to_qmark(self.dialect.syntax(), sql, &params)?;
        self.run_values(&sql, &params).await
    }

    /// Like [`run_pg`](Self::run_pg), returning the first row.
    pub async fn row_pg<I, V>(&mut self, sql: &str, params: I) -> QueryResult<Option<Row>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Ok(self.run_pg(sql, params).await?.into_iter().next())
    }

    async fn run_values(&mut self, sql: &str, params: &[Value]) -> QueryResult<Vec<Row>> {
        check_params(self.dialect.syntax(), sql, params)?;
        self.log_statement(sql, params.len());
        let rows = self.driver.query(sql, params, self.fetch_shape).await?;
        self.row_count = Some(rows.len() as u64);
        Ok(rows)
    }

    /// Execute a multi-statement script (schema files, fixtures).
    ///
    /// Comments are stripped, statements are split on `;` outside string
    /// literals and run in order. Returns the summed affected-row count.
    pub async fn exec_raw(&mut self, sql: &str) -> QueryResult<u64> {
        let syntax = self.dialect.syntax();
        let statements = script::split_statements(syntax, &script::strip_comments(syntax, sql));
        let mut total = 0u64;
        for statement in &statements {
            self.log_statement(statement, 0);
            total += self.driver.execute(statement, &[]).await?;
        }
        self.row_count = Some(total);
        Ok(total)
    }

    // ==================== Pagination ====================

    /// Describe one page of `total_rows` rows.
    ///
    /// The current page comes from `page_name` in `ctx`. `fetch` receives
    /// `(limit, offset)` and returns that page's rows. A page with no rows
    /// still yields a descriptor.
    pub async fn paginate<F, Fut>(
        &self,
        total_rows: u64,
        per_page: u64,
        ctx: &PageContext,
        page_name: &str,
        fetch: F,
    ) -> QueryResult<Page>
    where
        F: FnOnce(u64, u64) -> Fut,
        Fut: Future<Output = QueryResult<Vec<Row>>>,
    {
        let paginator = Paginator::new(total_rows, per_page, ctx.current_page(page_name))?
            .radius(self.config.link_radius);
        let data = fetch(paginator.per_page(), paginator.offset()).await?;
        Ok(paginator.page(ctx, page_name, data))
    }

    /// Paginate the accumulated statement.
    ///
    /// Counts its rows with `SELECT COUNT(*) ... FROM ( statement )`, then
    /// fetches the current page with `LIMIT ? OFFSET ?` appended.
    pub async fn simple_paginate(
        &mut self,
        per_page: u64,
        ctx: &PageContext,
        page_name: &str,
    ) -> QueryResult<Page> {
        self.validate()?;
        if per_page == 0 {
            return Err(QueryError::usage("per_page must be at least 1"));
        }
        let base = self.sql.trim().to_string();

        let count_sql = format!("SELECT COUNT(*) AS total FROM ( {base} ) AS paginate_count");
        self.log_statement(&count_sql, self.params.len());
        let counted = self
            .driver
            .query(&count_sql, &self.params, FetchShape::Row)
            .await?;
        let total_rows = count_value(counted.first().and_then(|row| row.get_index(0)))?;

        let paginator = Paginator::new(total_rows, per_page, ctx.current_page(page_name))?
            .radius(self.config.link_radius);
        let page_sql = format!("{base} LIMIT ? OFFSET ?");
        let mut params = self.params.clone();
        params.push(Value::from(paginator.per_page()));
        params.push(Value::from(paginator.offset()));
        self.log_statement(&page_sql, params.len());
        let data = self
            .driver
            .query(&page_sql, &params, self.fetch_shape)
            .await?;

        self.row_count = Some(data.len() as u64);
        self.last = Clause::Done;
        Ok(paginator.page(ctx, page_name, data))
    }
}

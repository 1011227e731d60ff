//! WHERE-family methods.
//!
//! The first condition opens the clause with `WHERE`; later ones continue it
//! with `AND`, or `OR` for the `or_` variants.

use super::Query;
use crate::clause::{Clause, Conj};
use crate::dialect::{LikeMatch, placeholders};
use crate::error::{QueryError, QueryResult};
use serde_json::Value;

impl<C> Query<C> {
    /// Emit the WHERE connector followed by `condition`.
    fn condition(&mut self, conj: Conj, condition: &str) -> &mut Self {
        self.open(Clause::Where, conj);
        self.push(condition);
        self
    }

    fn compare(&mut self, conj: Conj, col: &str, op: &str, value: Value) -> QueryResult<&mut Self> {
        let op = self.operator(op)?;
        self.condition(conj, &format!("{col} {op} ?"));
        self.params.push(value);
        Ok(self)
    }

    fn compare_query(&mut self, conj: Conj, col: &str, op: &str, sub: &Query<C>) -> QueryResult<&mut Self> {
        let op = self.operator(op)?;
        self.guard(sub)?;
        self.open(Clause::Where, conj);
        self.push_wrapped(&format!("{col} {op}"), sub, "");
        Ok(self)
    }

    // ==================== Comparison ====================

    /// `WHERE col op ?` / `AND col op ?`
    ///
    /// `op` must be one of `=`, `!=`, `<`, `<=`, `<=>`, `>`, `>=`.
    pub fn and_where(&mut self, col: &str, op: &str, value: impl Into<Value>) -> QueryResult<&mut Self> {
        self.compare(Conj::And, col, op, value.into())
    }

    /// `WHERE col op ?` / `OR col op ?`
    pub fn or_where(&mut self, col: &str, op: &str, value: impl Into<Value>) -> QueryResult<&mut Self> {
        self.compare(Conj::Or, col, op, value.into())
    }

    /// `WHERE col op ( sub )`
    pub fn where_query(&mut self, col: &str, op: &str, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.compare_query(Conj::And, col, op, sub)
    }

    /// `OR col op ( sub )`
    pub fn or_where_query(&mut self, col: &str, op: &str, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.compare_query(Conj::Or, col, op, sub)
    }

    /// Raw condition with its own parameters.
    pub fn where_raw<I, V>(&mut self, condition: &str, params: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let params: Vec<Value> = params.into_iter().map(Into::into).collect();
        let placeholders = crate::script::count_placeholders(self.dialect.syntax(), condition);
        if placeholders != params.len() {
            return Err(QueryError::ParamMismatch {
                placeholders,
                params: params.len(),
            });
        }
        self.condition(Conj::And, condition);
        self.params.extend(params);
        Ok(self)
    }

    // ==================== Date / time ====================

    fn compare_date(&mut self, conj: Conj, time: bool, col: &str, op: &str, value: &str) -> QueryResult<&mut Self> {
        let op = self.operator(op)?;
        let expr = if time {
            self.dialect.time_filter(col)
        } else {
            self.dialect.date_filter(col)
        };
        self.condition(conj, &format!("{expr} {op} ?"));
        self.params.push(Value::String(value.to_string()));
        Ok(self)
    }

    /// Compare the date part of `col` (`DATE(col)` / `CAST(col AS DATE)`).
    pub fn where_date(&mut self, col: &str, op: &str, value: &str) -> QueryResult<&mut Self> {
        self.compare_date(Conj::And, false, col, op, value)
    }

    pub fn or_where_date(&mut self, col: &str, op: &str, value: &str) -> QueryResult<&mut Self> {
        self.compare_date(Conj::Or, false, col, op, value)
    }

    /// Compare the time part of `col` (`TIME(col)` / `CAST(col AS TIME)`).
    pub fn where_time(&mut self, col: &str, op: &str, value: &str) -> QueryResult<&mut Self> {
        self.compare_date(Conj::And, true, col, op, value)
    }

    pub fn or_where_time(&mut self, col: &str, op: &str, value: &str) -> QueryResult<&mut Self> {
        self.compare_date(Conj::Or, true, col, op, value)
    }

    // ==================== NULL / boolean ====================

    pub fn where_null(&mut self, col: &str) -> &mut Self {
        self.condition(Conj::And, &format!("{col} IS NULL"))
    }

    pub fn or_where_null(&mut self, col: &str) -> &mut Self {
        self.condition(Conj::Or, &format!("{col} IS NULL"))
    }

    pub fn where_not_null(&mut self, col: &str) -> &mut Self {
        self.condition(Conj::And, &format!("{col} IS NOT NULL"))
    }

    pub fn or_where_not_null(&mut self, col: &str) -> &mut Self {
        self.condition(Conj::Or, &format!("{col} IS NOT NULL"))
    }

    pub fn where_true(&mut self, col: &str) -> &mut Self {
        self.condition(Conj::And, &format!("{col} = TRUE"))
    }

    pub fn or_where_true(&mut self, col: &str) -> &mut Self {
        self.condition(Conj::Or, &format!("{col} = TRUE"))
    }

    pub fn where_false(&mut self, col: &str) -> &mut Self {
        self.condition(Conj::And, &format!("{col} = FALSE"))
    }

    pub fn or_where_false(&mut self, col: &str) -> &mut Self {
        self.condition(Conj::Or, &format!("{col} = FALSE"))
    }

    // ==================== IN / BETWEEN ====================

    fn in_list<I, V>(&mut self, conj: Conj, col: &str, keyword: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            let always = if keyword == "IN" {
                format!("{col} IN (NULL)")
            } else {
                format!("({col} IS NULL OR {col} IS NOT NULL)")
            };
            self.condition(conj, &always);
        } else {
            self.condition(conj, &format!("{col} {keyword} ({})", placeholders(values.len())));
            self.params.extend(values);
        }
        self
    }

    fn in_query(&mut self, conj: Conj, col: &str, keyword: &str, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.guard(sub)?;
        self.open(Clause::Where, conj);
        self.push_wrapped(&format!("{col} {keyword}"), sub, "");
        Ok(self)
    }

    /// `col IN (?,?,..)`. An empty list matches no rows.
    pub fn where_in<I, V>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_list(Conj::And, col, "IN", values)
    }

    pub fn or_where_in<I, V>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_list(Conj::Or, col, "IN", values)
    }

    /// `col NOT IN (?,?,..)`. An empty list matches every row.
    pub fn where_not_in<I, V>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_list(Conj::And, col, "NOT IN", values)
    }

    pub fn or_where_not_in<I, V>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.in_list(Conj::Or, col, "NOT IN", values)
    }

    /// `col IN ( sub )`
    pub fn where_in_query(&mut self, col: &str, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.in_query(Conj::And, col, "IN", sub)
    }

    /// `col NOT IN ( sub )`
    pub fn where_not_in_query(&mut self, col: &str, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.in_query(Conj::And, col, "NOT IN", sub)
    }

    fn between(&mut self, conj: Conj, col: &str, low: Value, high: Value) -> &mut Self {
        self.condition(conj, &format!("{col} BETWEEN ? AND ?"));
        self.params.push(low);
        self.params.push(high);
        self
    }

    /// `col BETWEEN ? AND ?`
    pub fn where_between(&mut self, col: &str, low: impl Into<Value>, high: impl Into<Value>) -> &mut Self {
        self.between(Conj::And, col, low.into(), high.into())
    }

    pub fn or_where_between(&mut self, col: &str, low: impl Into<Value>, high: impl Into<Value>) -> &mut Self {
        self.between(Conj::Or, col, low.into(), high.into())
    }

    // ==================== LIKE ====================

    fn like(&mut self, conj: Conj, col: &str, value: &str, matching: LikeMatch) -> &mut Self {
        let pattern = self.dialect.like(value, matching);
        self.condition(conj, &format!("{col} LIKE {}", pattern.sql));
        self.params.extend(pattern.params);
        self
    }

    /// `col` contains `value`.
    pub fn where_like(&mut self, col: &str, value: &str) -> &mut Self {
        self.like(Conj::And, col, value, LikeMatch::Contains)
    }

    pub fn or_where_like(&mut self, col: &str, value: &str) -> &mut Self {
        self.like(Conj::Or, col, value, LikeMatch::Contains)
    }

    /// `col` starts with `value`.
    pub fn where_starts(&mut self, col: &str, value: &str) -> &mut Self {
        self.like(Conj::And, col, value, LikeMatch::StartsWith)
    }

    pub fn or_where_starts(&mut self, col: &str, value: &str) -> &mut Self {
        self.like(Conj::Or, col, value, LikeMatch::StartsWith)
    }

    /// `col` ends with `value`.
    pub fn where_ends(&mut self, col: &str, value: &str) -> &mut Self {
        self.like(Conj::And, col, value, LikeMatch::EndsWith)
    }

    pub fn or_where_ends(&mut self, col: &str, value: &str) -> &mut Self {
        self.like(Conj::Or, col, value, LikeMatch::EndsWith)
    }

    // ==================== JSON ====================

    fn json_contains_condition(&mut self, conj: Conj, doc: &str, path: &str, value: &Value) -> &mut Self {
        let fragment = self.dialect.json_contains(doc, path, value);
        self.open(Clause::Where, conj);
        self.push_fragment(fragment);
        self
    }

    /// Filter on the value at `path` in `doc` containing `value`.
    pub fn where_json_contains(&mut self, doc: &str, path: &str, value: &Value) -> &mut Self {
        self.json_contains_condition(Conj::And, doc, path, value)
    }

    pub fn or_where_json_contains(&mut self, doc: &str, path: &str, value: &Value) -> &mut Self {
        self.json_contains_condition(Conj::Or, doc, path, value)
    }
}

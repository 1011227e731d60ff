//! JSON and date-format expression helpers.
//!
//! Each helper emits one expression. Emitted right after `SELECT` (or another
//! select-list item) it joins the select list; anywhere else it stands on its
//! own, e.g. inside a [`q()`](Query::q) fragment later passed to
//! [`set_query`](Query::set_query).

use super::Query;
use crate::clause::{Clause, JsonOp};
use crate::dialect::{Fragment, JsonPairs};
use crate::error::QueryResult;
use serde_json::Value;

impl<C> Query<C> {
    fn expression(&mut self, fragment: Fragment, clause: Clause) -> &mut Self {
        self.resume();
        if self.last.in_select_list() {
            if self.last == Clause::Select {
                self.sql.push(',');
            }
            self.push_fragment(fragment);
            self.last = Clause::Select;
        } else {
            self.push_fragment(fragment);
            self.last = clause;
        }
        self
    }

    /// Value at `path` in `doc`.
    pub fn json_extract(&mut self, doc: &str, path: &str) -> &mut Self {
        let fragment = self.dialect.json_extract(doc, path);
        self.expression(fragment, Clause::Json(JsonOp::Extract))
    }

    /// `doc` with every path set to its value.
    pub fn json_set(&mut self, doc: &str, pairs: impl Into<JsonPairs>) -> QueryResult<&mut Self> {
        let fragment = self.dialect.json_set(doc, &pairs.into())?;
        Ok(self.expression(fragment, Clause::Json(JsonOp::Set)))
    }

    /// `doc` without the given paths.
    pub fn json_remove(&mut self, doc: &str, paths: &[&str]) -> QueryResult<&mut Self> {
        let fragment = self.dialect.json_remove(doc, paths)?;
        Ok(self.expression(fragment, Clause::Json(JsonOp::Remove)))
    }

    /// Whether `path` exists in `doc`.
    pub fn json_exist(&mut self, doc: &str, path: &str) -> &mut Self {
        let fragment = self.dialect.json_exists(doc, path);
        self.expression(fragment, Clause::Json(JsonOp::Exists))
    }

    /// Whether the value at `path` in `doc` contains `value`.
    pub fn json_contain(&mut self, doc: &str, path: &str, value: &Value) -> &mut Self {
        let fragment = self.dialect.json_contains(doc, path, value);
        self.expression(fragment, Clause::Json(JsonOp::Contains))
    }

    /// `doc` merged with `patch`.
    pub fn json_merge_patch(&mut self, doc: &str, patch: &Value) -> &mut Self {
        let fragment = self.dialect.json_merge_patch(doc, patch);
        self.expression(fragment, Clause::Json(JsonOp::MergePatch))
    }

    /// Append values to the arrays at each path. Not every dialect supports it.
    pub fn json_array_append(&mut self, doc: &str, pairs: impl Into<JsonPairs>) -> QueryResult<&mut Self> {
        let fragment = self.dialect.json_array_append(doc, &pairs.into())?;
        Ok(self.expression(fragment, Clause::Json(JsonOp::ArrayAppend)))
    }

    pub fn json_unquote(&mut self, value: impl Into<Value>) -> &mut Self {
        let fragment = self.dialect.json_unquote(&value.into());
        self.expression(fragment, Clause::Json(JsonOp::Unquote))
    }

    pub fn json_compact(&mut self, value: impl Into<Value>) -> &mut Self {
        let fragment = self.dialect.json_compact(&value.into());
        self.expression(fragment, Clause::Json(JsonOp::Compact))
    }

    /// Format `date` with MySQL-style `%` tokens.
    pub fn date_format(&mut self, date: &str, format: &str) -> &mut Self {
        let fragment = self.dialect.date_format(date, format);
        self.expression(fragment, Clause::DateFormat)
    }
}

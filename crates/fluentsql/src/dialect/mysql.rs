use super::{Dialect, Fragment, JsonPairs, LikeMatch, Returning, placeholders, set_list};
use crate::error::{QueryError, QueryResult};
use crate::ident::IdentStyle;
use crate::script::Syntax;
use crate::upsert::UpsertSpec;
use serde_json::Value;

/// MySQL-flavored dialect.
///
/// JSON values are bound as JSON text and parsed server side through
/// `JSON_EXTRACT(?, '$')`, so strings, numbers and documents keep their type.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDialect;

impl DefaultDialect {
    pub fn new() -> Self {
        Self
    }

    fn path_value_list(&self, pairs: &JsonPairs) -> Fragment {
        let mut sql = String::new();
        let mut params = Vec::with_capacity(pairs.len() * 2);
        for (path, value) in pairs.iter() {
            sql.push_str(", ?, JSON_EXTRACT(?, '$')");
            params.push(Value::String(self.json_path(path)));
            params.push(json_text(value));
        }
        Fragment::new(sql, params)
    }
}

fn json_text(value: &Value) -> Value {
    Value::String(value.to_string())
}

impl Dialect for DefaultDialect {
    fn name(&self) -> &'static str {
        "default"
    }

    fn ident_style(&self) -> IdentStyle {
        IdentStyle::Backtick
    }

    fn syntax(&self) -> Syntax {
        Syntax::MySql
    }

    fn null_safe_eq(&self) -> &'static str {
        "<=>"
    }

    fn date_filter(&self, column: &str) -> String {
        format!("DATE({column})")
    }

    fn time_filter(&self, column: &str) -> String {
        format!("TIME({column})")
    }

    fn date_format(&self, date: &str, format: &str) -> Fragment {
        Fragment::new(
            "DATE_FORMAT(?, ?)",
            vec![Value::String(date.to_string()), Value::String(format.to_string())],
        )
    }

    fn like(&self, value: &str, matching: LikeMatch) -> Fragment {
        let params = matching.pieces(value);
        Fragment::new(format!("CONCAT({})", placeholders(params.len())), params)
    }

    fn json_path(&self, path: &str) -> String {
        if path.starts_with('$') {
            path.to_string()
        } else {
            format!("$.{path}")
        }
    }

    fn json_extract(&self, doc: &str, path: &str) -> Fragment {
        Fragment::new(
            format!("JSON_EXTRACT({doc}, ?)"),
            vec![Value::String(self.json_path(path))],
        )
    }

    fn json_set(&self, doc: &str, pairs: &JsonPairs) -> QueryResult<Fragment> {
        if pairs.is_empty() {
            return Err(QueryError::configuration("JsonSet requires path/value pairs"));
        }
        let list = self.path_value_list(pairs);
        Ok(Fragment::new(format!("JSON_SET({doc}{})", list.sql), list.params))
    }

    fn json_remove(&self, doc: &str, paths: &[&str]) -> QueryResult<Fragment> {
        if paths.is_empty() {
            return Err(QueryError::configuration("JsonRemove requires at least one path"));
        }
        let params = paths
            .iter()
            .map(|p| Value::String(self.json_path(p)))
            .collect::<Vec<_>>();
        Ok(Fragment::new(
            format!("JSON_REMOVE({doc}, {})", placeholders(params.len())),
            params,
        ))
    }

    fn json_exists(&self, doc: &str, path: &str) -> Fragment {
        Fragment::new(
            format!("JSON_CONTAINS_PATH({doc}, 'one', ?)"),
            vec![Value::String(self.json_path(path))],
        )
    }

    fn json_contains(&self, doc: &str, path: &str, value: &Value) -> Fragment {
        Fragment::new(
            format!("JSON_CONTAINS({doc}, ?, ?)"),
            vec![json_text(value), Value::String(self.json_path(path))],
        )
    }

    fn json_merge_patch(&self, doc: &str, patch: &Value) -> Fragment {
        Fragment::new(format!("JSON_MERGE_PATCH({doc}, ?)"), vec![json_text(patch)])
    }

    fn json_array_append(&self, doc: &str, pairs: &JsonPairs) -> QueryResult<Fragment> {
        if pairs.is_empty() {
            return Err(QueryError::configuration(
                "JsonArrayAppend requires path/value pairs",
            ));
        }
        let list = self.path_value_list(pairs);
        Ok(Fragment::new(
            format!("JSON_ARRAY_APPEND({doc}{})", list.sql),
            list.params,
        ))
    }

    fn json_unquote(&self, value: &Value) -> Fragment {
        Fragment::new("JSON_UNQUOTE(?)", vec![value.clone()])
    }

    fn json_compact(&self, value: &Value) -> Fragment {
        Fragment::new("JSON_COMPACT(?)", vec![json_text(value)])
    }

    fn upsert_clause(&self, spec: &UpsertSpec, _columns: &[String]) -> QueryResult<String> {
        if spec.set.is_empty() {
            return Err(QueryError::configuration(
                "InsertOnDuplicate requires at least one column to update",
            ));
        }
        let list = set_list(self.ident_style(), &spec.set, |quoted| {
            format!("VALUES({quoted})")
        });
        Ok(format!("ON DUPLICATE KEY UPDATE {list}"))
    }

    fn returning(&self) -> Returning {
        Returning::Emulated
    }
}

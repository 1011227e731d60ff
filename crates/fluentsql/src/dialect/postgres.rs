use super::{Dialect, Fragment, JsonPairs, LikeMatch, Returning, set_list};
use crate::error::{QueryError, QueryResult};
use crate::ident::IdentStyle;
use crate::script::Syntax;
use crate::upsert::{ConflictTarget, UpsertSpec};
use serde_json::Value;

/// PostgreSQL dialect.
///
/// JSON documents are cast to `jsonb`; paths are bound as `text[]` literals
/// (`{a,b}`) and values as JSON text cast through `text` to `jsonb`, so a
/// JSON `null` operand stays a JSON value instead of a SQL `NULL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }
}

/// MySQL `%` date tokens and their `TO_CHAR` equivalents.
const DATE_TOKENS: [(char, &str); 14] = [
    ('Y', "YYYY"),
    ('y', "YY"),
    ('m', "MM"),
    ('c', "MM"),
    ('d', "DD"),
    ('e', "DD"),
    ('H', "HH24"),
    ('h', "HH12"),
    ('I', "HH12"),
    ('i', "MI"),
    ('s', "SS"),
    ('S', "SS"),
    ('M', "Mon"),
    ('b', "Mon"),
];

/// Translate a MySQL `DATE_FORMAT` pattern for `TO_CHAR`. Unknown tokens pass through.
pub(crate) fn translate_date_format(format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut chars = format.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '%' {
            if let Some(&next) = chars.peek() {
                if let Some((_, pg)) = DATE_TOKENS.iter().find(|(tok, _)| *tok == next) {
                    out.push_str(pg);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

fn path_param(path: String) -> Value {
    Value::String(path)
}

/// A JSON operand as the text of its serialization, for `?::text::jsonb`.
fn json_operand(value: &Value) -> Value {
    Value::String(value.to_string())
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn ident_style(&self) -> IdentStyle {
        IdentStyle::DoubleQuote
    }

    fn syntax(&self) -> Syntax {
        Syntax::Postgres
    }

    fn null_safe_eq(&self) -> &'static str {
        "IS NOT DISTINCT FROM"
    }

    fn date_filter(&self, column: &str) -> String {
        format!("CAST({column} AS DATE)")
    }

    fn time_filter(&self, column: &str) -> String {
        format!("CAST({column} AS TIME)")
    }

    fn date_format(&self, date: &str, format: &str) -> Fragment {
        Fragment::new(
            format!("TO_CHAR({date}, ?)"),
            vec![Value::String(translate_date_format(format))],
        )
    }

    fn like(&self, value: &str, matching: LikeMatch) -> Fragment {
        let params = matching.pieces(value);
        let sql = match params.len() {
            3 => "(? || ? || ?)",
            _ => "(? || ?)",
        };
        Fragment::new(sql, params)
    }

    /// `$.a.b` / `a.b` / `.a..b` all become `{a,b}`.
    fn json_path(&self, path: &str) -> String {
        let trimmed = path.trim_start_matches(['$', '.']);
        let segments: Vec<&str> = trimmed.split('.').filter(|s| !s.is_empty()).collect();
        format!("{{{}}}", segments.join(","))
    }

    fn json_extract(&self, doc: &str, path: &str) -> Fragment {
        Fragment::new(
            format!("({doc})::jsonb #>> (?::text[])"),
            vec![path_param(self.json_path(path))],
        )
    }

    fn json_set(&self, doc: &str, pairs: &JsonPairs) -> QueryResult<Fragment> {
        if pairs.is_empty() {
            return Err(QueryError::configuration("JsonSet requires path/value pairs"));
        }
        let mut expr = format!("({doc})::jsonb");
        let mut params = Vec::with_capacity(pairs.len() * 2);
        for (path, value) in pairs.iter() {
            expr = format!("jsonb_set({expr}, ?::text[], (?::text::jsonb), true)");
            params.push(path_param(self.json_path(path)));
            params.push(json_operand(value));
        }
        Ok(Fragment::new(expr, params))
    }

    fn json_remove(&self, doc: &str, paths: &[&str]) -> QueryResult<Fragment> {
        if paths.is_empty() {
            return Err(QueryError::configuration("JsonRemove requires at least one path"));
        }
        let mut expr = format!("({doc})::jsonb");
        let mut params = Vec::with_capacity(paths.len());
        for path in paths {
            expr.push_str(" #- (?::text[])");
            params.push(path_param(self.json_path(path)));
        }
        Ok(Fragment::new(expr, params))
    }

    fn json_exists(&self, doc: &str, path: &str) -> Fragment {
        Fragment::new(
            format!("(({doc})::jsonb #> (?::text[])) IS NOT NULL"),
            vec![path_param(self.json_path(path))],
        )
    }

    fn json_contains(&self, doc: &str, path: &str, value: &Value) -> Fragment {
        Fragment::new(
            format!("(({doc})::jsonb #> (?::text[])) @> (?::text::jsonb)"),
            vec![path_param(self.json_path(path)), json_operand(value)],
        )
    }

    fn json_merge_patch(&self, doc: &str, patch: &Value) -> Fragment {
        Fragment::new(format!("(({doc})::jsonb || (?::text::jsonb))"), vec![json_operand(patch)])
    }

    fn json_array_append(&self, _doc: &str, _pairs: &JsonPairs) -> QueryResult<Fragment> {
        Err(QueryError::Unsupported {
            dialect: self.name(),
            operation: "JsonArrayAppend",
            hint: "build explicit jsonb_set/jsonb_insert manually",
        })
    }

    fn json_unquote(&self, value: &Value) -> Fragment {
        Fragment::new("(?::text)", vec![value.clone()])
    }

    fn json_compact(&self, value: &Value) -> Fragment {
        Fragment::new("(?::text::jsonb)", vec![json_operand(value)])
    }

    fn upsert_clause(&self, spec: &UpsertSpec, columns: &[String]) -> QueryResult<String> {
        if spec.set.is_empty() {
            return Err(QueryError::configuration(
                "InsertOnDuplicate requires columns to SET",
            ));
        }

        let style = self.ident_style();
        let conflict = match &spec.target {
            Some(ConflictTarget::Constraint(name)) => format!("ON CONFLICT ON CONSTRAINT {name}"),
            Some(ConflictTarget::Columns(cols)) if !cols.is_empty() => {
                let quoted: Vec<String> = cols.iter().map(|c| style.quote_column(c)).collect();
                format!("ON CONFLICT ({})", quoted.join(","))
            }
            _ if columns.iter().any(|c| c == "id") => {
                format!("ON CONFLICT ({})", style.quote_column("id"))
            }
            _ => {
                return Err(QueryError::configuration(
                    "Postgres upsert requires a conflict target: pass conflict columns or a constraint, or include an `id` column to infer",
                ));
            }
        };

        let list = set_list(style, &spec.set, |quoted| format!("EXCLUDED.{quoted}"));
        Ok(format!("{conflict} DO UPDATE SET {list}"))
    }

    fn returning(&self) -> Returning {
        Returning::Native
    }
}

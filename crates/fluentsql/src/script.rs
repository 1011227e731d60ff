//! Lightweight SQL text scanning.
//!
//! This is not a parser: it only tells code apart from string literals,
//! quoted identifiers and comments, which is enough to count and rewrite
//! placeholders and to split scripts into statements.

use crate::error::{QueryError, QueryResult};
use serde_json::Value;

/// Lexical conventions of the target database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Syntax {
    /// Backslash escapes inside `'..'` and `".."` strings.
    #[default]
    MySql,
    /// Standard-conforming strings: a backslash escapes only inside `E'..'`,
    /// and `$$ .. $$` / `$tag$ .. $tag$` bodies are literals.
    Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Code,
    Quoted,
    Comment,
}

fn flush<'a>(out: &mut Vec<(Kind, &'a str)>, kind: Kind, src: &'a str, from: usize, to: usize) {
    if to > from {
        out.push((kind, &src[from..to]));
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Whether a backslash escapes the next byte in the literal opened at `open`.
fn backslash_escapes(syntax: Syntax, bytes: &[u8], open: usize) -> bool {
    match (syntax, bytes[open]) {
        (Syntax::MySql, b'\'' | b'"') => true,
        (Syntax::Postgres, b'\'') => {
            open > 0
                && matches!(bytes[open - 1], b'E' | b'e')
                && (open < 2 || !is_ident_byte(bytes[open - 2]))
        }
        _ => false,
    }
}

/// Index just past the literal opened by `bytes[open]`.
fn literal_end(bytes: &[u8], open: usize, backslash: bool) -> usize {
    let quote = bytes[open];
    let mut j = open + 1;
    while j < bytes.len() {
        if backslash && bytes[j] == b'\\' {
            j += 2;
            continue;
        }
        if bytes[j] == quote {
            // Doubled quote is an escape.
            if bytes.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return j + 1;
        }
        j += 1;
    }
    bytes.len()
}

/// Index just past the dollar-quoted body opened at `open`, or `None` when
/// the `$` does not open one (`$1`, `a$b`, a lone `$`).
fn dollar_quote_end(sql: &str, open: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    if open > 0 && is_ident_byte(bytes[open - 1]) {
        return None;
    }
    let mut j = open + 1;
    while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
        j += 1;
    }
    if bytes.get(j) != Some(&b'$') || bytes.get(open + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let tag = &sql[open..=j];
    let body = j + 1;
    Some(match sql[body..].find(tag) {
        Some(pos) => body + pos + tag.len(),
        None => bytes.len(),
    })
}

/// Split `sql` into contiguous code / quoted / comment runs.
fn segments(syntax: Syntax, sql: &str) -> Vec<(Kind, &str)> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let (kind, end) = match bytes[i] {
            b'\'' | b'"' | b'`' => (
                Kind::Quoted,
                literal_end(bytes, i, backslash_escapes(syntax, bytes, i)),
            ),
            b'$' if syntax == Syntax::Postgres => match dollar_quote_end(sql, i) {
                Some(end) => (Kind::Quoted, end),
                None => {
                    i += 1;
                    continue;
                }
            },
            b'-' if bytes.get(i + 1) == Some(&b'-') => (
                Kind::Comment,
                match sql[i..].find('\n') {
                    Some(pos) => i + pos,
                    None => bytes.len(),
                },
            ),
            b'/' if bytes.get(i + 1) == Some(&b'*') => (
                Kind::Comment,
                match sql[i + 2..].find("*/") {
                    Some(pos) => i + 2 + pos + 2,
                    None => bytes.len(),
                },
            ),
            _ => {
                i += 1;
                continue;
            }
        };

        flush(&mut out, Kind::Code, sql, start, i);
        flush(&mut out, kind, sql, i, end);
        start = end;
        i = end;
    }
    flush(&mut out, Kind::Code, sql, start, bytes.len());
    out
}

/// Number of `?` placeholders outside literals and comments.
pub fn count_placeholders(syntax: Syntax, sql: &str) -> usize {
    segments(syntax, sql)
        .into_iter()
        .filter(|(kind, _)| *kind == Kind::Code)
        .map(|(_, s)| s.matches('?').count())
        .sum()
}

/// Rewrite `?` placeholders into `$1, $2, ...`.
pub fn qmark_to_dollar(syntax: Syntax, sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0usize;
    for (kind, s) in segments(syntax, sql) {
        if kind != Kind::Code {
            out.push_str(s);
            continue;
        }
        for ch in s.chars() {
            if ch == '?' {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            } else {
                out.push(ch);
            }
        }
    }
    out
}

/// Rewrite `$n` markers into `?`, ordering (and repeating) `params` to follow
/// the markers as they appear.
pub fn dollar_to_qmark(syntax: Syntax, sql: &str, params: &[Value]) -> QueryResult<(String, Vec<Value>)> {
    let mut out = String::with_capacity(sql.len());
    let mut bound = Vec::new();
    for (kind, s) in segments(syntax, sql) {
        if kind != Kind::Code {
            out.push_str(s);
            continue;
        }
        let mut chars = s.char_indices().peekable();
        while let Some((idx, ch)) = chars.next() {
            if ch != '$' {
                out.push(ch);
                continue;
            }
            let digits_start = idx + 1;
            let mut digits_end = digits_start;
            while let Some(&(j, d)) = chars.peek() {
                if d.is_ascii_digit() {
                    digits_end = j + 1;
                    chars.next();
                } else {
                    break;
                }
            }
            if digits_end == digits_start {
                out.push('$');
                continue;
            }
            let index: usize = s[digits_start..digits_end]
                .parse()
                .map_err(|_| QueryError::usage(format!("invalid placeholder ${}", &s[digits_start..digits_end])))?;
            let value = index
                .checked_sub(1)
                .and_then(|i| params.get(i))
                .ok_or_else(|| {
                    QueryError::usage(format!(
                        "placeholder ${index} has no matching parameter ({} supplied)",
                        params.len()
                    ))
                })?;
            out.push('?');
            bound.push(value.clone());
        }
    }
    Ok((out, bound))
}

/// Remove `--` and `/* */` comments outside literals.
pub fn strip_comments(syntax: Syntax, sql: &str) -> String {
    segments(syntax, sql)
        .into_iter()
        .filter(|(kind, _)| *kind != Kind::Comment)
        .map(|(_, s)| s)
        .collect()
}

/// Split a script on `;` outside literals and comments. Blank statements are dropped.
pub fn split_statements(syntax: Syntax, sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    for (kind, s) in segments(syntax, sql) {
        if kind != Kind::Code {
            current.push_str(s);
            continue;
        }
        let mut rest = s;
        while let Some(pos) = rest.find(';') {
            current.push_str(&rest[..pos]);
            push_statement(&mut statements, &mut current);
            rest = &rest[pos + 1..];
        }
        current.push_str(rest);
    }
    push_statement(&mut statements, &mut current);
    statements
}

fn push_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_only_code_placeholders() {
        assert_eq!(count_placeholders(Syntax::MySql, "SELECT * FROM t WHERE a = ? AND b = ?"), 2);
        assert_eq!(count_placeholders(Syntax::MySql, "SELECT '?' , \"?\", `?` FROM t WHERE a = ?"), 1);
        assert_eq!(count_placeholders(Syntax::MySql, "SELECT 1 -- why?\nWHERE a = ?"), 1);
        assert_eq!(count_placeholders(Syntax::MySql, "SELECT /* ? */ ?"), 1);
        assert_eq!(count_placeholders(Syntax::MySql, "SELECT 'it''s ?' , ?"), 1);
        assert_eq!(count_placeholders(Syntax::MySql, "SELECT 'it\\'s ?' , ?"), 1);
    }

    #[test]
    fn rewrites_to_dollar() {
        assert_eq!(
            qmark_to_dollar(Syntax::Postgres, "SELECT * FROM t WHERE a = ? AND b LIKE '?' AND c = ?"),
            "SELECT * FROM t WHERE a = $1 AND b LIKE '?' AND c = $2"
        );
    }

    #[test]
    fn rewrites_dollar_markers_in_order() {
        let (sql, params) = dollar_to_qmark(
            Syntax::Postgres,
            "SELECT * FROM t WHERE b = $2 AND a = $1 OR a = $1",
            &[json!(1), json!("two")],
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE b = ? AND a = ? OR a = ?");
        assert_eq!(params, vec![json!("two"), json!(1), json!(1)]);
    }

    #[test]
    fn dollar_markers_inside_literals_are_kept() {
        let (sql, params) = dollar_to_qmark(
            Syntax::Postgres,
            "SELECT '$1', $$ $2 $$, $body$ $3 $body$ FROM t WHERE a = $1",
            &[json!(5)],
        )
        .unwrap();
        assert_eq!(sql, "SELECT '$1', $$ $2 $$, $body$ $3 $body$ FROM t WHERE a = ?");
        assert_eq!(params, vec![json!(5)]);
    }

    #[test]
    fn dollar_marker_past_params_fails() {
        let err = dollar_to_qmark(Syntax::Postgres, "SELECT $2", &[json!(1)]).unwrap_err();
        assert!(err.is_usage());
        let err = dollar_to_qmark(Syntax::Postgres, "SELECT $0", &[json!(1)]).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn strips_comments_outside_literals() {
        assert_eq!(
            strip_comments(Syntax::MySql, "SELECT 1 -- trailing\n, '--kept' /* block */ FROM t"),
            "SELECT 1 \n, '--kept'  FROM t"
        );
    }

    #[test]
    fn splits_scripts() {
        let script = "
            -- schema
            CREATE TABLE a (id INT);
            INSERT INTO a VALUES (1); /* ; */
            INSERT INTO b (s) VALUES ('x;y');
            ;
        ";
        let stmts = split_statements(Syntax::MySql, &strip_comments(Syntax::MySql, script));
        assert_eq!(
            stmts,
            vec![
                "CREATE TABLE a (id INT)",
                "INSERT INTO a VALUES (1)",
                "INSERT INTO b (s) VALUES ('x;y')",
            ]
        );
    }

    #[test]
    fn postgres_backslash_is_literal_outside_escape_strings() {
        assert_eq!(count_placeholders(Syntax::Postgres, r"path = 'C:\' AND id = ?"), 1);
        assert_eq!(count_placeholders(Syntax::MySql, r"path = 'C:\' AND id = ?"), 0);
        assert_eq!(count_placeholders(Syntax::Postgres, r"SELECT E'it\'s ?', e'\\', ?"), 1);
        assert_eq!(count_placeholders(Syntax::Postgres, r"SELECT name'\', ?"), 1);
        assert_eq!(count_placeholders(Syntax::Postgres, r#"SELECT "a\", ?"#), 1);
    }

    #[test]
    fn postgres_dollar_quoted_bodies_are_literals() {
        let script = "CREATE FUNCTION f() RETURNS int AS $$ BEGIN RETURN 1; END; $$ LANGUAGE plpgsql; SELECT 1";
        assert_eq!(
            split_statements(Syntax::Postgres, script),
            vec![
                "CREATE FUNCTION f() RETURNS int AS $$ BEGIN RETURN 1; END; $$ LANGUAGE plpgsql",
                "SELECT 1",
            ]
        );

        let tagged = "DO $fn$ BEGIN PERFORM '$$;'; END $fn$; SELECT ?";
        let stmts = split_statements(Syntax::Postgres, tagged);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "DO $fn$ BEGIN PERFORM '$$;'; END $fn$");
        assert_eq!(count_placeholders(Syntax::Postgres, tagged), 1);

        assert_eq!(count_placeholders(Syntax::Postgres, "SELECT $$ unterminated ?; ?"), 0);
        assert_eq!(count_placeholders(Syntax::Postgres, "SELECT a$b$ FROM t WHERE x = ?"), 1);
    }
}

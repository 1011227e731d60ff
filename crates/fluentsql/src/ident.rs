//! Identifier quoting.
//!
//! Two styles are supported:
//!
//! - [`IdentStyle::Backtick`]: only the column is quoted, the table segment is
//!   emitted verbatim (`users.`name``).
//! - [`IdentStyle::DoubleQuote`]: every dotted segment is quoted on its own,
//!   embedded `"` are doubled and empty segments are dropped
//!   (`"public"."users"."name"`).
//!
//! # Example
//! ```ignore
//! use fluentsql::IdentStyle;
//!
//! assert_eq!(IdentStyle::Backtick.quote_table_column("users", "id"), "users.`id`");
//! assert_eq!(IdentStyle::DoubleQuote.quote_table_column("public.users", "id"), r#""public"."users"."id""#);
//! ```

/// How a dialect quotes `table.column` identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentStyle {
    /// MySQL-flavored backtick quoting of the column segment only.
    Backtick,
    /// Standard SQL double-quote quoting of every segment.
    DoubleQuote,
}

impl IdentStyle {
    /// Quote a column, optionally qualified by a (possibly dotted) table name.
    pub fn quote_table_column(self, table: &str, column: &str) -> String {
        let mut out = String::with_capacity(table.len() + column.len() + 6);
        self.write_table_column(&mut out, table, column);
        out
    }

    /// Quote a single bare column.
    pub fn quote_column(self, column: &str) -> String {
        self.quote_table_column("", column)
    }

    pub(crate) fn write_table_column(self, out: &mut String, table: &str, column: &str) {
        match self {
            IdentStyle::Backtick => {
                if !table.is_empty() {
                    out.push_str(table);
                    out.push('.');
                }
                out.push('`');
                out.push_str(column);
                out.push('`');
            }
            IdentStyle::DoubleQuote => {
                for part in table.split('.').filter(|p| !p.is_empty()) {
                    write_double_quoted(out, part);
                    out.push('.');
                }
                write_double_quoted(out, column);
            }
        }
    }
}

fn write_double_quoted(out: &mut String, ident: &str) {
    out.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

/// Reverse [`IdentStyle::DoubleQuote`] quoting of a single segment.
///
/// Returns `None` when `quoted` is not a well-formed quoted identifier.
pub fn unquote_double(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '"' {
            // Escaped quote must be doubled.
            if chars.next() != Some('"') {
                return None;
            }
        }
        out.push(ch);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backtick_quotes_column_only() {
        assert_eq!(IdentStyle::Backtick.quote_column("username"), "`username`");
        assert_eq!(
            IdentStyle::Backtick.quote_table_column("users", "username"),
            "users.`username`"
        );
        assert_eq!(
            IdentStyle::Backtick.quote_table_column("app.users", "id"),
            "app.users.`id`"
        );
    }

    #[test]
    fn double_quote_simple_column() {
        assert_eq!(IdentStyle::DoubleQuote.quote_column("username"), r#""username""#);
    }

    #[test]
    fn double_quote_table_and_column() {
        assert_eq!(
            IdentStyle::DoubleQuote.quote_table_column("users", "username"),
            r#""users"."username""#
        );
    }

    #[test]
    fn double_quote_schema_qualified() {
        assert_eq!(
            IdentStyle::DoubleQuote.quote_table_column("public.users", "username"),
            r#""public"."users"."username""#
        );
        assert_eq!(
            IdentStyle::DoubleQuote.quote_table_column("schema.public.users", "id"),
            r#""schema"."public"."users"."id""#
        );
    }

    #[test]
    fn double_quote_escapes_embedded_quotes() {
        assert_eq!(IdentStyle::DoubleQuote.quote_column(r#"user"name"#), r#""user""name""#);
        assert_eq!(
            IdentStyle::DoubleQuote.quote_table_column(r#"my"table"#, "column"),
            r#""my""table"."column""#
        );
    }

    #[test]
    fn double_quote_drops_empty_segments() {
        assert_eq!(
            IdentStyle::DoubleQuote.quote_table_column(".users", "id"),
            r#""users"."id""#
        );
        assert_eq!(
            IdentStyle::DoubleQuote.quote_table_column("public..users", "id"),
            r#""public"."users"."id""#
        );
    }

    #[test]
    fn unquote_recovers_original() {
        for name in [r#"user"name"#, "plain", r#""""#, "with space"] {
            let quoted = IdentStyle::DoubleQuote.quote_column(name);
            assert_eq!(unquote_double(&quoted).as_deref(), Some(name));
        }
    }

    #[test]
    fn unquote_rejects_malformed() {
        assert_eq!(unquote_double("plain"), None);
        assert_eq!(unquote_double(r#""a"b""#), None);
    }
}

//! Clause tracking for the statement state machine.
//!
//! Every fluent call records the clause it emitted. The next call consults
//! [`Clause::connector`] to decide between opening a clause (`WHERE`,
//! `ORDER BY`, ...) and continuing it (`AND`/`OR`, `,`).
//!
//! | last \ next        | Where      | Having     | OrderBy  | GroupBy  | Set   | With   | Select   |
//! |--------------------|------------|------------|----------|----------|-------|--------|----------|
//! | same clause        | `AND`/`OR` | `AND`/`OR` | `,`      | `,`      | `,`   | `,`    | `,`      |
//! | `SelectOpen`       | `WHERE`    | `HAVING`   | ...      | ...      | ...   | ...    | (none)   |
//! | anything else      | `WHERE`    | `HAVING`   | ORDER BY | GROUP BY | `SET` | `WITH` | `SELECT` |

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// Set operation joining two SELECT statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Union,
    UnionAll,
    Intersect,
    IntersectAll,
    Except,
    ExceptAll,
}

impl SetOp {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            SetOp::Union => "UNION",
            SetOp::UnionAll => "UNION ALL",
            SetOp::Intersect => "INTERSECT",
            SetOp::IntersectAll => "INTERSECT ALL",
            SetOp::Except => "EXCEPT",
            SetOp::ExceptAll => "EXCEPT ALL",
        }
    }
}

/// JSON helper that produced the last fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonOp {
    Extract,
    Set,
    Remove,
    Exists,
    Contains,
    MergePatch,
    ArrayAppend,
    Unquote,
    Compact,
}

/// The clause most recently emitted into a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clause {
    /// Nothing emitted yet.
    #[default]
    None,
    /// `SELECT` followed by at least one select-list item.
    Select,
    /// A bare `SELECT` keyword waiting for its first item.
    SelectOpen,
    From,
    Where,
    OrderBy,
    GroupBy,
    Having,
    Set,
    Join(JoinKind),
    With,
    SubQuery,
    Update,
    Delete,
    Insert,
    Limit,
    Offset,
    Alias,
    SetOp(SetOp),
    Raw,
    Json(JsonOp),
    DateFormat,
    /// The statement has been executed.
    Done,
}

/// Conjunction used when a filter continues an open WHERE/HAVING clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conj {
    And,
    Or,
}

impl Conj {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Conj::And => "AND",
            Conj::Or => "OR",
        }
    }
}

/// Token emitted in front of the next fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Connector {
    /// Open a new clause with this keyword.
    Keyword(&'static str),
    /// Continue a list with `,`.
    Comma,
    /// Nothing to emit.
    Empty,
}

impl Clause {
    /// Whether a select-list expression is being built.
    pub fn in_select_list(self) -> bool {
        matches!(self, Clause::Select | Clause::SelectOpen)
    }

    /// Connector for emitting `next` after `self`.
    pub(crate) fn connector(self, next: Clause, conj: Conj) -> Connector {
        let repeat = self == next;
        match next {
            Clause::Where if repeat => Connector::Keyword(conj.keyword()),
            Clause::Where => Connector::Keyword("WHERE"),
            Clause::Having if repeat => Connector::Keyword(conj.keyword()),
            Clause::Having => Connector::Keyword("HAVING"),
            Clause::OrderBy | Clause::GroupBy | Clause::Set | Clause::With | Clause::Select
                if repeat =>
            {
                Connector::Comma
            }
            Clause::OrderBy => Connector::Keyword("ORDER BY"),
            Clause::GroupBy => Connector::Keyword("GROUP BY"),
            Clause::Set => Connector::Keyword("SET"),
            Clause::With => Connector::Keyword("WITH"),
            Clause::Select if self == Clause::SelectOpen => Connector::Empty,
            Clause::Select => Connector::Keyword("SELECT"),
            _ => Connector::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_opens_then_continues() {
        assert_eq!(
            Clause::From.connector(Clause::Where, Conj::And),
            Connector::Keyword("WHERE")
        );
        assert_eq!(
            Clause::Where.connector(Clause::Where, Conj::And),
            Connector::Keyword("AND")
        );
        assert_eq!(
            Clause::Where.connector(Clause::Where, Conj::Or),
            Connector::Keyword("OR")
        );
        // OR never opens a clause.
        assert_eq!(
            Clause::None.connector(Clause::Where, Conj::Or),
            Connector::Keyword("WHERE")
        );
    }

    #[test]
    fn list_clauses_continue_with_comma() {
        for clause in [Clause::OrderBy, Clause::GroupBy, Clause::Set, Clause::With, Clause::Select] {
            assert_eq!(clause.connector(clause, Conj::And), Connector::Comma);
        }
        assert_eq!(
            Clause::Where.connector(Clause::OrderBy, Conj::And),
            Connector::Keyword("ORDER BY")
        );
        assert_eq!(
            Clause::Update.connector(Clause::Set, Conj::And),
            Connector::Keyword("SET")
        );
    }

    #[test]
    fn bare_select_takes_first_item_directly() {
        assert_eq!(
            Clause::SelectOpen.connector(Clause::Select, Conj::And),
            Connector::Empty
        );
        assert_eq!(
            Clause::None.connector(Clause::Select, Conj::And),
            Connector::Keyword("SELECT")
        );
        assert_eq!(
            Clause::SetOp(SetOp::Union).connector(Clause::Select, Conj::And),
            Connector::Keyword("SELECT")
        );
    }

    #[test]
    fn having_is_independent_of_where() {
        assert_eq!(
            Clause::Where.connector(Clause::Having, Conj::And),
            Connector::Keyword("HAVING")
        );
        assert_eq!(
            Clause::GroupBy.connector(Clause::Having, Conj::And),
            Connector::Keyword("HAVING")
        );
    }
}

use super::Query;
use crate::clause::{Clause, Conj, JoinKind, SetOp};
use crate::error::QueryResult;
use serde_json::Value;

impl<C> Query<C> {
    // ==================== Select list ====================

    /// `SELECT cols`, or `, cols` when a select list is already open.
    ///
    /// An empty `cols` emits a bare `SELECT` whose first item is supplied by
    /// the next call (e.g. a JSON helper or [`select_query`](Self::select_query)).
    pub fn select(&mut self, cols: &str) -> &mut Self {
        let cols = cols.trim();
        if cols.is_empty() {
            self.resume();
            if !self.last.in_select_list() {
                self.push("SELECT");
                self.last = Clause::SelectOpen;
            }
            return self;
        }
        self.open(Clause::Select, Conj::And);
        self.push(cols);
        self
    }

    /// Embed `sub` as a scalar subquery in the select list.
    ///
    /// `SELECT` is prefixed when the subquery does not start with one.
    pub fn select_query(&mut self, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.guard(sub)?;
        self.open(Clause::Select, Conj::And);
        let prefix = if starts_with_select(&sub.sql) { "" } else { "SELECT " };
        let wrapped = format!("( {prefix}{} )", sub.sql.trim());
        self.push(&wrapped);
        self.params.extend(sub.params.iter().cloned());
        Ok(self)
    }

    /// `AS name`. Inside a select list the list stays open.
    pub fn alias(&mut self, name: &str) -> &mut Self {
        self.resume();
        self.push(&format!("AS {name}"));
        self.last = if self.last.in_select_list() {
            Clause::Select
        } else {
            Clause::Alias
        };
        self
    }

    // ==================== Sources ====================

    /// `FROM table`
    pub fn from(&mut self, table: &str) -> &mut Self {
        self.resume();
        self.push(&format!("FROM {table}"));
        self.last = Clause::From;
        self
    }

    /// `FROM ( sub ) AS alias`
    pub fn from_query(&mut self, sub: &Query<C>, alias: &str) -> QueryResult<&mut Self> {
        self.guard(sub)?;
        self.resume();
        self.push_wrapped("FROM", sub, &format!("AS {alias}"));
        self.last = Clause::From;
        Ok(self)
    }

    /// `( sub )`
    pub fn sub_query(&mut self, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.guard(sub)?;
        self.resume();
        self.push_wrapped("", sub, "");
        self.last = Clause::SubQuery;
        Ok(self)
    }

    fn join_on(
        &mut self,
        kind: JoinKind,
        table: &str,
        left: &str,
        op: &str,
        right: &str,
    ) -> QueryResult<&mut Self> {
        let op = self.operator(op)?;
        self.resume();
        self.push(&format!("{} {table} ON {left} {op} {right}", kind.keyword()));
        self.last = Clause::Join(kind);
        Ok(self)
    }

    /// `INNER JOIN table ON left op right`
    pub fn join(&mut self, table: &str, left: &str, op: &str, right: &str) -> QueryResult<&mut Self> {
        self.join_on(JoinKind::Inner, table, left, op, right)
    }

    /// `LEFT JOIN table ON left op right`
    pub fn left_join(&mut self, table: &str, left: &str, op: &str, right: &str) -> QueryResult<&mut Self> {
        self.join_on(JoinKind::Left, table, left, op, right)
    }

    /// `RIGHT JOIN table ON left op right`
    pub fn right_join(&mut self, table: &str, left: &str, op: &str, right: &str) -> QueryResult<&mut Self> {
        self.join_on(JoinKind::Right, table, left, op, right)
    }

    /// `FULL JOIN table ON left op right`
    pub fn full_join(&mut self, table: &str, left: &str, op: &str, right: &str) -> QueryResult<&mut Self> {
        self.join_on(JoinKind::Full, table, left, op, right)
    }

    /// `CROSS JOIN table`
    pub fn cross_join(&mut self, table: &str) -> &mut Self {
        self.resume();
        self.push(&format!("CROSS JOIN {table}"));
        self.last = Clause::Join(JoinKind::Cross);
        self
    }

    // ==================== Shaping ====================

    /// `ORDER BY col ASC`, or `, col ASC` when ordering is already open.
    pub fn order_by_asc(&mut self, col: &str) -> &mut Self {
        self.open(Clause::OrderBy, Conj::And);
        self.push(&format!("{col} ASC"));
        self
    }

    /// `ORDER BY col DESC`, or `, col DESC` when ordering is already open.
    pub fn order_by_desc(&mut self, col: &str) -> &mut Self {
        self.open(Clause::OrderBy, Conj::And);
        self.push(&format!("{col} DESC"));
        self
    }

    /// `GROUP BY col`, or `, col` when grouping is already open.
    pub fn group_by(&mut self, col: &str) -> &mut Self {
        self.open(Clause::GroupBy, Conj::And);
        self.push(col);
        self
    }

    fn having_with(&mut self, conj: Conj, col: &str, op: &str, value: Value) -> QueryResult<&mut Self> {
        let op = self.operator(op)?;
        self.open(Clause::Having, conj);
        self.push(&format!("{col} {op} ?"));
        self.params.push(value);
        Ok(self)
    }

    /// `HAVING col op ?`, or `AND col op ?` after another HAVING condition.
    pub fn having(&mut self, col: &str, op: &str, value: impl Into<Value>) -> QueryResult<&mut Self> {
        self.having_with(Conj::And, col, op, value.into())
    }

    /// `OR col op ?` after another HAVING condition.
    pub fn or_having(&mut self, col: &str, op: &str, value: impl Into<Value>) -> QueryResult<&mut Self> {
        self.having_with(Conj::Or, col, op, value.into())
    }

    /// `LIMIT ?`
    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.resume();
        self.push("LIMIT ?");
        self.params.push(Value::from(n));
        self.last = Clause::Limit;
        self
    }

    /// Alias of [`limit`](Self::limit).
    pub fn take(&mut self, n: u64) -> &mut Self {
        self.limit(n)
    }

    /// `OFFSET ?`
    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.resume();
        self.push("OFFSET ?");
        self.params.push(Value::from(n));
        self.last = Clause::Offset;
        self
    }

    /// Alias of [`offset`](Self::offset).
    pub fn skip(&mut self, n: u64) -> &mut Self {
        self.offset(n)
    }

    // ==================== Set algebra ====================

    fn set_operation(&mut self, op: SetOp, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.guard(sub)?;
        self.resume();
        self.push(&format!("{} {}", op.keyword(), sub.sql.trim()));
        self.params.extend(sub.params.iter().cloned());
        self.last = Clause::SetOp(op);
        Ok(self)
    }

    /// `UNION sub`
    pub fn union(&mut self, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.set_operation(SetOp::Union, sub)
    }

    /// `UNION ALL sub`
    pub fn union_all(&mut self, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.set_operation(SetOp::UnionAll, sub)
    }

    /// `INTERSECT sub`
    pub fn intersect(&mut self, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.set_operation(SetOp::Intersect, sub)
    }

    /// `INTERSECT ALL sub`
    pub fn intersect_all(&mut self, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.set_operation(SetOp::IntersectAll, sub)
    }

    /// `EXCEPT sub`
    pub fn except(&mut self, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.set_operation(SetOp::Except, sub)
    }

    /// `EXCEPT ALL sub`
    pub fn except_all(&mut self, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.set_operation(SetOp::ExceptAll, sub)
    }

    // ==================== CTEs ====================

    /// `WITH name AS ( sub )`, or `, name AS ( sub )` for further CTEs.
    pub fn with(&mut self, name: &str, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.guard(sub)?;
        self.mark_cte_start();
        self.open(Clause::With, Conj::And);
        self.push_wrapped(&format!("{name} AS"), sub, "");
        Ok(self)
    }

    /// `WITH RECURSIVE name AS ( sub )`.
    ///
    /// Continues an open WITH list like [`with`](Self::with); the list's
    /// keyword becomes `WITH RECURSIVE` since the modifier applies to the
    /// whole list.
    pub fn with_recursive(&mut self, name: &str, sub: &Query<C>) -> QueryResult<&mut Self> {
        self.guard(sub)?;
        self.resume();
        if self.last == Clause::With {
            self.make_cte_list_recursive();
            self.sql.push(',');
            self.push_wrapped(&format!("{name} AS"), sub, "");
        } else {
            self.cte_start = self.sql.len();
            self.push_wrapped(&format!("WITH RECURSIVE {name} AS"), sub, "");
        }
        self.last = Clause::With;
        Ok(self)
    }

    fn mark_cte_start(&mut self) {
        if self.last != Clause::With {
            self.cte_start = self.sql.len();
        }
    }

    fn make_cte_list_recursive(&mut self) {
        let Some(offset) = self.sql[self.cte_start..].find("WITH") else {
            return;
        };
        let keyword_end = self.cte_start + offset + "WITH".len();
        if !self.sql[keyword_end..].starts_with(" RECURSIVE ") {
            self.sql.insert_str(keyword_end, " RECURSIVE");
        }
    }
}

fn starts_with_select(sql: &str) -> bool {
    let head = sql.trim_start().trim_start_matches('(').trim_start();
    head.get(..6)
        .is_some_and(|word| word.eq_ignore_ascii_case("SELECT"))
}

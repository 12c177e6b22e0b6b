//! The query model: one SELECT statement before it is rendered to SQL.

use crate::condition::Predicate;
use serde::Serialize;

/// Join kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
        }
    }
}

/// A resolved join: `<kind> <table> ON <on>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    /// `source.foreign_key = target.referenced_column`, resolved from the relation graph.
    pub on: String,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

/// A named sub-query rendered as `name AS (...)` in the WITH list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CteBinding {
    pub name: String,
    pub query: QueryModel,
}

/// One SELECT statement.
///
/// The table is fixed at construction. Everything else is mutated through
/// [`QueryBuilder`](crate::QueryBuilder).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryModel {
    table: String,
    /// Empty means `*`.
    pub(crate) columns: Vec<String>,
    /// Top-level WHERE predicates, joined with AND.
    #[serde(rename = "where")]
    pub(crate) where_: Vec<Predicate>,
    pub(crate) joins: Vec<JoinClause>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) group_by: Vec<String>,
    /// Top-level HAVING predicates, joined with AND.
    pub(crate) having: Vec<Predicate>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) ctes: Vec<CteBinding>,
}

impl QueryModel {
    /// Create an empty model selecting everything from `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            where_: Vec::new(),
            joins: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            limit: None,
            offset: None,
            ctes: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn where_predicates(&self) -> &[Predicate] {
        &self.where_
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn having_predicates(&self) -> &[Predicate] {
        &self.having
    }

    pub fn limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn ctes(&self) -> &[CteBinding] {
        &self.ctes
    }

    /// Parameters bound by the whole statement, sub-queries included.
    pub fn param_count(&self) -> usize {
        self.ctes.iter().map(|c| c.query.param_count()).sum::<usize>()
            + self
                .where_
                .iter()
                .chain(&self.having)
                .map(Predicate::param_count)
                .sum::<usize>()
    }
}

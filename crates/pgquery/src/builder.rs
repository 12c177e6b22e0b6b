//! SELECT query builder.
//!
//! A [`QueryBuilder`] owns exactly one [`QueryModel`] and mutates it in place.
//! Methods take `&mut self` and return `&mut Self` so calls chain; `join` and
//! `with` can fail and return `QueryResult<&mut Self>`.
//!
//! ```ignore
//! let (mut q, c) = db.table("users")?;
//! q.select(["users.id", "posts.title"])
//!     .inner_join("posts")?
//!     .and_where(c.eq("status", "active")?)
//!     .order_by_desc("created_at")
//!     .limit(10);
//! let compiled = q.compile();
//! ```

use crate::client::GenericClient;
use crate::compiler::{self, CompiledQuery};
use crate::condition::Predicate;
use crate::config::DatabaseConfig;
use crate::error::{QueryError, QueryResult};
use crate::ident::validate_ident;
use crate::model::{CteBinding, JoinClause, JoinKind, OrderBy, OrderDirection, QueryModel};
use crate::relation::RelationGraph;
use std::future::Future;
use std::sync::Arc;
use tokio_postgres::Row;

/// Fluent accumulator for one SELECT statement.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    model: QueryModel,
    relations: Arc<RelationGraph>,
    config: Arc<DatabaseConfig>,
}

impl QueryBuilder {
    /// Create a builder for `table` with no declared relations (every join fails).
    pub fn new(table: impl Into<String>) -> Self {
        Self::with_context(
            table,
            Arc::new(RelationGraph::empty()),
            Arc::new(DatabaseConfig::default()),
        )
    }

    pub(crate) fn with_context(
        table: impl Into<String>,
        relations: Arc<RelationGraph>,
        config: Arc<DatabaseConfig>,
    ) -> Self {
        Self {
            model: QueryModel::new(table),
            relations,
            config,
        }
    }

    /// The table this query reads from.
    pub fn table(&self) -> &str {
        self.model.table()
    }

    // ==================== Projection ====================

    /// Set the projected columns, replacing any previous projection.
    ///
    /// An empty list selects `*`.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    // ==================== WHERE / HAVING ====================

    /// Append one WHERE predicate (ANDed with the others).
    pub fn and_where(&mut self, predicate: Predicate) -> &mut Self {
        self.model.where_.push(predicate);
        self
    }

    /// Append several WHERE predicates, in order.
    pub fn where_all(&mut self, predicates: impl IntoIterator<Item = Predicate>) -> &mut Self {
        self.model.where_.extend(predicates);
        self
    }

    /// Append one HAVING predicate (ANDed with the others).
    pub fn having(&mut self, predicate: Predicate) -> &mut Self {
        self.model.having.push(predicate);
        self
    }

    /// Append several HAVING predicates, in order.
    pub fn having_all(&mut self, predicates: impl IntoIterator<Item = Predicate>) -> &mut Self {
        self.model.having.extend(predicates);
        self
    }

    // ==================== JOIN ====================

    /// Join `table` using the declared relation between it and this query's table.
    ///
    /// Fails with [`QueryError::RelationNotFound`] and leaves the query
    /// untouched when no relation links the two tables.
    pub fn join(&mut self, table: &str, kind: JoinKind) -> QueryResult<&mut Self> {
        let relation = match self.relations.resolve(self.model.table(), table) {
            Ok(relation) => relation,
            Err(err) => {
                let base = self.model.table();
                let related: Vec<&str> = self
                    .relations
                    .relations_of(base)
                    .map(|r| if r.from == base { r.to.as_str() } else { r.from.as_str() })
                    .collect();
                tracing::debug!(
                    target: "pgquery",
                    from = base,
                    to = table,
                    ?related,
                    "join rejected: no declared relation"
                );
                return Err(err);
            }
        };

        let on = relation.on_clause();
        tracing::trace!(
            target: "pgquery",
            from = self.model.table(),
            to = table,
            on = %on,
            "join resolved"
        );
        self.model.joins.push(JoinClause {
            kind,
            table: table.to_string(),
            on,
        });
        Ok(self)
    }

    /// Add INNER JOIN.
    pub fn inner_join(&mut self, table: &str) -> QueryResult<&mut Self> {
        self.join(table, JoinKind::Inner)
    }

    /// Add LEFT JOIN.
    pub fn left_join(&mut self, table: &str) -> QueryResult<&mut Self> {
        self.join(table, JoinKind::Left)
    }

    /// Add RIGHT JOIN.
    pub fn right_join(&mut self, table: &str) -> QueryResult<&mut Self> {
        self.join(table, JoinKind::Right)
    }

    /// Add FULL OUTER JOIN.
    pub fn full_join(&mut self, table: &str) -> QueryResult<&mut Self> {
        self.join(table, JoinKind::Full)
    }

    // ==================== Ordering & Grouping ====================

    /// Append an ORDER BY key. Later calls add secondary keys.
    pub fn order_by(&mut self, column: impl Into<String>, direction: OrderDirection) -> &mut Self {
        self.model.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(&mut self, column: impl Into<String>) -> &mut Self {
        self.order_by(column, OrderDirection::Asc)
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(&mut self, column: impl Into<String>) -> &mut Self {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Set the GROUP BY columns, replacing any previous list.
    pub fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    // ==================== Pagination ====================

    /// Set LIMIT. Rendered literally, negative values included.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.model.limit = Some(n);
        self
    }

    /// Set OFFSET. Rendered literally, negative values included.
    pub fn offset(&mut self, n: i64) -> &mut Self {
        self.model.offset = Some(n);
        self
    }

    /// Pagination helper.
    ///
    /// `page` is 1-based (clamped to >= 1).
    /// `per_page` is clamped to >= 1.
    pub fn paginate(&mut self, page: i64, per_page: i64) -> &mut Self {
        let p = page.max(1);
        let size = per_page.max(1);
        self.model.limit = Some(size);
        self.model.offset = Some((p - 1).saturating_mul(size));
        self
    }

    // ==================== Named sub-queries ====================

    /// Bind `sub` as the named sub-query `name` (`WITH name AS (...)`).
    ///
    /// The sub-query is copied at call time; changing `sub` afterwards does
    /// not affect this query.
    pub fn with(&mut self, name: &str, sub: &QueryBuilder) -> QueryResult<&mut Self> {
        validate_ident(name)?;
        if self.model.ctes.iter().any(|c| c.name == name) {
            return Err(QueryError::validation(format!(
                "Sub-query '{name}' is already bound"
            )));
        }
        self.model.ctes.push(CteBinding {
            name: name.to_string(),
            query: sub.model.clone(),
        });
        Ok(self)
    }

    // ==================== Output ====================

    /// Compile to SQL text and parameters. Repeated calls give identical output.
    pub fn compile(&self) -> CompiledQuery {
        let compiled = compiler::compile(&self.model);
        tracing::debug!(
            target: "pgquery.sql",
            table = self.model.table(),
            param_count = compiled.params.len(),
            sql = %self.config.truncate_sql(&compiled.sql),
            "compiled select"
        );
        compiled
    }

    /// Compile a COUNT(*) over this query (ordering and paging dropped).
    pub fn compile_count(&self) -> CompiledQuery {
        let compiled = compiler::compile_count(&self.model);
        tracing::debug!(
            target: "pgquery.sql",
            table = self.model.table(),
            param_count = compiled.params.len(),
            sql = %self.config.truncate_sql(&compiled.sql),
            "compiled count"
        );
        compiled
    }

    /// Read-only view of the current model.
    pub fn inspect(&self) -> &QueryModel {
        &self.model
    }

    /// Take the model out of the builder.
    pub fn into_model(self) -> QueryModel {
        self.model
    }

    // ==================== Execution ====================

    /// Run the query and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> QueryResult<Vec<Row>> {
        let compiled = self.compile();
        let params = compiled.params_ref();
        self.run(conn.query(&compiled.sql, &params)).await
    }

    /// Run the query and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> QueryResult<Option<Row>> {
        let compiled = self.compile();
        let params = compiled.params_ref();
        self.run(conn.query_opt(&compiled.sql, &params)).await
    }

    /// Run the query and return the first row, failing with `NotFound` when empty.
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> QueryResult<Row> {
        self.fetch_opt(conn)
            .await?
            .ok_or_else(|| QueryError::not_found(format!("no rows from {}", self.table())))
    }

    /// Run the COUNT(*) form of the query.
    pub async fn count(&self, conn: &impl GenericClient) -> QueryResult<i64> {
        let compiled = self.compile_count();
        let params = compiled.params_ref();
        let row = self
            .run(conn.query_opt(&compiled.sql, &params))
            .await?
            .ok_or_else(|| QueryError::not_found("COUNT(*) returned no row"))?;
        Ok(row.try_get(0)?)
    }

    async fn run<T>(&self, fut: impl Future<Output = QueryResult<T>>) -> QueryResult<T> {
        tracing::debug!(
            target: "pgquery.sql",
            table = self.model.table(),
            timeout = ?self.config.query_timeout,
            "executing"
        );
        match self.config.query_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                tracing::warn!(
                    target: "pgquery.sql",
                    table = self.model.table(),
                    timeout = ?limit,
                    "query timed out"
                );
                QueryError::Timeout(limit)
            })?,
            None => fut.await,
        }
    }
}

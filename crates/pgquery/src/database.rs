//! Entry point binding a schema and its relations.

use crate::builder::QueryBuilder;
use crate::condition::ConditionFactory;
use crate::config::DatabaseConfig;
use crate::error::{QueryError, QueryResult};
use crate::relation::{Relation, RelationGraph};
use crate::schema::Schema;
use std::sync::Arc;

/// Owns a [`Schema`] and a [`RelationGraph`] and hands out per-table
/// builder/factory pairs.
///
/// # Example
///
/// ```ignore
/// let posts_author = Relation::new("posts", "author_id", "users", "id", Cardinality::OneToMany);
/// let db = Database::new(schema, [posts_author])?;
/// let (mut q, c) = db.table("users")?;
/// q.and_where(c.eq("status", "active")?);
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    schema: Arc<Schema>,
    relations: Arc<RelationGraph>,
    config: Arc<DatabaseConfig>,
}

impl Database {
    /// Create a facade with the default configuration.
    pub fn new(schema: Schema, relations: impl IntoIterator<Item = Relation>) -> QueryResult<Self> {
        Self::with_config(schema, relations, DatabaseConfig::default())
    }

    /// Create a facade with an explicit configuration.
    pub fn with_config(
        schema: Schema,
        relations: impl IntoIterator<Item = Relation>,
        config: DatabaseConfig,
    ) -> QueryResult<Self> {
        let relations = RelationGraph::new(relations)?;
        tracing::debug!(
            target: "pgquery",
            tables = schema.len(),
            relations = relations.len(),
            validation = ?config.field_validation,
            "database facade ready"
        );
        Ok(Self {
            schema: Arc::new(schema),
            relations: Arc::new(relations),
            config: Arc::new(config),
        })
    }

    /// A fresh query builder and a condition factory for `name`.
    ///
    /// Each call returns an independent builder.
    pub fn table(&self, name: &str) -> QueryResult<(QueryBuilder, ConditionFactory)> {
        if !self.schema.has_table(name) {
            return Err(QueryError::UnknownTable(name.to_string()));
        }
        let builder =
            QueryBuilder::with_context(name, Arc::clone(&self.relations), Arc::clone(&self.config));
        let conditions = ConditionFactory::with_schema(
            name,
            Arc::clone(&self.schema),
            self.config.field_validation,
        );
        Ok((builder, conditions))
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn relations(&self) -> &RelationGraph {
        &self.relations
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

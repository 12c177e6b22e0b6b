//! # pgquery
//!
//! A relation-aware SELECT builder that compiles to parameterized PostgreSQL.
//!
//! ## Features
//!
//! - **Predicate trees**: leaf conditions composed with `and` / `or` / `not`
//! - **Declared joins**: `ON` clauses come from a relation graph, never from hand-written text
//! - **Named sub-queries**: `WITH name AS (...)`, nested to any depth
//! - **Consistent placeholders**: `$1..$N` numbered in text order across the whole statement
//! - **Schema-checked fields**: condition factories reject unknown columns
//!
//! ## Example
//!
//! ```ignore
//! use pgquery::prelude::*;
//!
//! let db = Database::new(
//!     schema,
//!     [Relation::new("posts", "author_id", "users", "id", Cardinality::OneToMany)],
//! )?;
//!
//! let (mut q, c) = db.table("users")?;
//! q.select(["users.id", "posts.title"])
//!     .inner_join("posts")?
//!     .and_where(c.or([c.eq("status", "active")?, c.gt("age", 18)?]))
//!     .order_by_desc("created_at")
//!     .limit(10);
//!
//! let compiled = q.compile();
//! // SELECT users.id, posts.title FROM users
//! //   INNER JOIN posts ON posts.author_id = users.id
//! //   WHERE (status = $1 OR age > $2) ORDER BY created_at DESC LIMIT 10
//!
//! let rows = q.fetch_all(&client).await?;
//! ```

pub mod builder;
pub mod client;
pub mod compiler;
pub mod condition;
pub mod config;
pub mod database;
pub mod error;
pub mod ident;
pub mod model;
pub mod prelude;
pub mod relation;
pub mod schema;
pub mod value;

pub use builder::QueryBuilder;
pub use client::GenericClient;
pub use compiler::{CompiledQuery, compile, compile_count, compile_predicate};
pub use condition::{Condition, ConditionFactory, Operand, Operator, Predicate};
pub use config::{DatabaseConfig, FieldValidation};
pub use database::Database;
pub use error::{QueryError, QueryResult};
pub use ident::validate_ident;
pub use model::{CteBinding, JoinClause, JoinKind, OrderBy, OrderDirection, QueryModel};
pub use relation::{Cardinality, Relation, RelationGraph};
pub use schema::{ColumnDescriptor, ScalarKind, Schema, TableSchema};
pub use value::Value;

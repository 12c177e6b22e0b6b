//! Convenient imports for typical `pgquery` usage.
//!
//! ```ignore
//! use pgquery::prelude::*;
//! ```

pub use crate::{
    Cardinality, ColumnDescriptor, CompiledQuery, ConditionFactory, Database, DatabaseConfig,
    GenericClient, JoinKind, OrderDirection, Predicate, QueryBuilder, QueryError, QueryResult,
    Relation, ScalarKind, Schema, TableSchema, Value,
};

//! Table and column metadata.
//!
//! The schema is supplied from outside (hand-built or decoded from JSON) and is
//! read-only once a [`Database`](crate::Database) owns it.

use crate::error::{QueryError, QueryResult};
use chrono::{DateTime, Utc};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The fixed set of scalar kinds a column can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Numeric,
    Text,
    Boolean,
    Temporal,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::Numeric => "numeric",
            ScalarKind::Text => "text",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Temporal => "temporal",
        })
    }
}

/// Column information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Scalar kind of the stored values.
    pub kind: ScalarKind,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Default value, if the column declares one.
    #[serde(default)]
    pub default: Option<Value>,
}

impl ColumnDescriptor {
    /// Create a non-null column of the given kind.
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
            unique: false,
            primary_key: false,
            default: None,
        }
    }

    /// Mark the column nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark the column unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark the column as the primary key (implies unique).
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self
    }

    /// Set a default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Whether `value` may be stored in this column.
    ///
    /// Temporal columns also take text, which Postgres parses on its side.
    pub fn accepts(&self, value: &Value) -> bool {
        match value.kind() {
            None => self.nullable,
            Some(kind) if kind == self.kind => true,
            Some(ScalarKind::Text) => self.kind == ScalarKind::Temporal,
            Some(_) => false,
        }
    }
}

/// Column set of one table, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Column metadata.
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    /// Create an empty table schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Add a column.
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Look up a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check if this table has a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// The primary key column, if any.
    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.primary_key)
    }
}

/// All tables known to a [`Database`](crate::Database).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    tables: BTreeMap<String, TableSchema>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any table with the same name.
    pub fn table(mut self, table: TableSchema) -> Self {
        self.register_table(table);
        self
    }

    /// Register a table schema directly.
    pub fn register_table(&mut self, table: TableSchema) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Decode a schema from its JSON form:
    ///
    /// ```json
    /// { "users": { "id": { "kind": "numeric", "primary_key": true },
    ///              "status": { "kind": "text" } } }
    /// ```
    ///
    /// Columns come out ordered by name.
    pub fn from_json(json: &str) -> QueryResult<Self> {
        #[derive(Deserialize)]
        struct RawColumn {
            kind: ScalarKind,
            #[serde(default)]
            nullable: bool,
            #[serde(default)]
            unique: bool,
            #[serde(default)]
            primary_key: bool,
            #[serde(default)]
            default: Option<serde_json::Value>,
        }

        let raw: BTreeMap<String, BTreeMap<String, RawColumn>> = serde_json::from_str(json)?;
        let mut schema = Schema::new();
        for (table_name, columns) in raw {
            let mut table = TableSchema::new(table_name);
            for (name, c) in columns {
                let default = match c.default {
                    Some(json) => Some(decode_default(&name, c.kind, json)?),
                    None => None,
                };
                table.columns.push(ColumnDescriptor {
                    name,
                    kind: c.kind,
                    nullable: c.nullable,
                    unique: c.unique || c.primary_key,
                    primary_key: c.primary_key,
                    default,
                });
            }
            schema.register_table(table);
        }
        Ok(schema)
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Check if a table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Get all registered tables, ordered by name.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    /// Get the number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Decode a JSON column default by the column's kind, so a text default that
/// happens to look like a timestamp stays text.
fn decode_default(column: &str, kind: ScalarKind, json: serde_json::Value) -> QueryResult<Value> {
    use serde_json::Value as Json;

    let value = match (kind, json) {
        (_, Json::Null) => Value::Null,
        (ScalarKind::Text, Json::String(s)) => Value::Text(s),
        (ScalarKind::Boolean, Json::Bool(b)) => Value::Bool(b),
        (ScalarKind::Numeric, Json::Number(n)) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        (ScalarKind::Temporal, Json::String(s)) => match DateTime::parse_from_rfc3339(&s) {
            Ok(ts) => Value::Timestamp(ts.with_timezone(&Utc)),
            Err(_) => Value::Text(s),
        },
        (kind, other) => {
            return Err(QueryError::Schema(format!(
                "Default for column '{column}' does not fit kind {kind}: {other}"
            )));
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_table_by_hand() {
        let users = TableSchema::new("users")
            .column(ColumnDescriptor::new("id", ScalarKind::Numeric).primary_key())
            .column(ColumnDescriptor::new("email", ScalarKind::Text).unique())
            .column(ColumnDescriptor::new("deleted_at", ScalarKind::Temporal).nullable());

        assert!(users.has_column("email"));
        assert!(!users.has_column("password"));
        assert_eq!(users.primary_key().map(|c| c.name.as_str()), Some("id"));
        assert!(users.get_column("id").is_some_and(|c| c.unique));
    }

    #[test]
    fn decodes_json_schema() {
        let schema = Schema::from_json(
            r#"{
                "users": {
                    "id": { "kind": "numeric", "primary_key": true },
                    "status": { "kind": "text", "default": "active" },
                    "created_at": { "kind": "temporal" }
                },
                "posts": {
                    "id": { "kind": "numeric", "primary_key": true },
                    "author_id": { "kind": "numeric" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(schema.len(), 2);
        let users = schema.get_table("users").unwrap();
        assert_eq!(users.columns.len(), 3);
        let status = users.get_column("status").unwrap();
        assert_eq!(status.kind, ScalarKind::Text);
        assert_eq!(status.default, Some(Value::Text("active".into())));
        assert!(users.get_column("id").unwrap().unique);
    }

    #[test]
    fn defaults_decode_by_column_kind() {
        let schema = Schema::from_json(
            r#"{
                "events": {
                    "label": { "kind": "text", "default": "2024-01-02T03:04:05Z" },
                    "starts_at": { "kind": "temporal", "default": "2024-01-02T03:04:05Z" },
                    "weight": { "kind": "numeric", "default": 1.5 },
                    "note": { "kind": "text", "nullable": true, "default": null }
                }
            }"#,
        )
        .unwrap();
        let events = schema.get_table("events").unwrap();
        let default_of = |name: &str| events.get_column(name).unwrap().default.clone();

        assert_eq!(
            default_of("label"),
            Some(Value::Text("2024-01-02T03:04:05Z".into()))
        );
        assert!(matches!(default_of("starts_at"), Some(Value::Timestamp(_))));
        assert_eq!(default_of("weight"), Some(Value::Float(1.5)));
        assert_eq!(default_of("note"), Some(Value::Null));
    }

    #[test]
    fn rejects_default_of_wrong_kind() {
        let json = r#"{ "users": { "age": { "kind": "numeric", "default": "x" } } }"#;
        let err = Schema::from_json(json).unwrap_err();
        assert!(matches!(err, QueryError::Schema(_)));
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = Schema::from_json(r#"{ "users": { "id": { "kind": "uuid" } } }"#).unwrap_err();
        assert!(matches!(err, crate::QueryError::Schema(_)));
    }

    #[test]
    fn column_accepts_matching_kinds() {
        let age = ColumnDescriptor::new("age", ScalarKind::Numeric);
        assert!(age.accepts(&Value::Int(3)));
        assert!(age.accepts(&Value::Float(3.5)));
        assert!(!age.accepts(&Value::Text("3".into())));
        assert!(!age.accepts(&Value::Null));

        let seen = ColumnDescriptor::new("seen_at", ScalarKind::Temporal).nullable();
        assert!(seen.accepts(&Value::Null));
        assert!(seen.accepts(&Value::Text("2024-01-01".into())));
        assert!(!seen.accepts(&Value::Bool(true)));
    }
}

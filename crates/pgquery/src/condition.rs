//! Predicate trees for WHERE/HAVING clauses.
//!
//! This module provides [`Predicate`] (a closed AND/OR/NOT/leaf tree) and the
//! table-bound [`ConditionFactory`] that builds it.
//!
//! # Example
//! ```ignore
//! use pgquery::ConditionFactory;
//!
//! let c = ConditionFactory::new("users");
//! let filter = c.or([
//!     c.eq("status", "active")?,
//!     c.and([c.eq("status", "pending")?, c.gt("age", 18)?]),
//! ]);
//! ```

use crate::config::FieldValidation;
use crate::error::{QueryError, QueryResult};
use crate::ident::{aggregate_argument, split_qualified, validate_ident};
use crate::schema::{ColumnDescriptor, ScalarKind, Schema};
use crate::value::Value;
use serde::Serialize;
use std::sync::Arc;

/// Comparison operator of a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    ILike,
    NotLike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
}

impl Operator {
    /// SQL spelling of the operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    /// `IS NULL` and `IS NOT NULL` take no value.
    pub fn is_null_check(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

/// Right-hand side of a leaf condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// Null checks.
    None,
    Single(Value),
    /// `IN` / `NOT IN`: each element becomes its own parameter.
    List(Vec<Value>),
    /// `BETWEEN low AND high`.
    Range(Value, Value),
}

impl Operand {
    /// Number of parameters this operand binds.
    pub fn param_count(&self) -> usize {
        match self {
            Operand::None => 0,
            Operand::Single(_) => 1,
            Operand::List(values) => values.len(),
            Operand::Range(..) => 2,
        }
    }
}

/// Leaf condition: `field operator operand`.
///
/// Only [`ConditionFactory`] builds these, so the operand always matches the
/// operator (no value for null checks, a list for `IN`, a pair for `BETWEEN`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    field: String,
    operator: Operator,
    operand: Operand,
}

impl Condition {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }
}

/// Predicate tree node.
///
/// Nodes are plain values: clone one to reuse it in another query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Condition(Condition),
    /// All children must hold. Rendered parenthesized.
    And(Vec<Predicate>),
    /// At least one child must hold. Rendered parenthesized.
    Or(Vec<Predicate>),
    /// Negation of exactly one child.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Create an AND group.
    pub fn and(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::And(children.into_iter().collect())
    }

    /// Create an OR group.
    pub fn or(children: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Or(children.into_iter().collect())
    }

    /// Create a NOT node.
    pub fn not(child: Predicate) -> Self {
        Predicate::Not(Box::new(child))
    }

    /// Number of parameters this tree binds when compiled.
    pub fn param_count(&self) -> usize {
        match self {
            Predicate::Condition(c) => match (&c.operator, &c.operand) {
                // Empty lists compile to a constant.
                (Operator::In | Operator::NotIn, Operand::List(v)) if v.is_empty() => 0,
                (_, operand) => operand.param_count(),
            },
            Predicate::And(children) | Predicate::Or(children) => {
                children.iter().map(Predicate::param_count).sum()
            }
            Predicate::Not(child) => child.param_count(),
        }
    }
}

impl From<Condition> for Predicate {
    fn from(c: Condition) -> Self {
        Predicate::Condition(c)
    }
}

/// Builds predicates for one table.
///
/// A factory handed out by [`Database`](crate::Database) checks field names
/// (and, in strict mode, value kinds) against the schema. A factory made with
/// [`ConditionFactory::new`] checks nothing.
#[derive(Debug, Clone)]
pub struct ConditionFactory {
    table: String,
    schema: Option<Arc<Schema>>,
    validation: FieldValidation,
}

impl ConditionFactory {
    /// Create an unchecked factory for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: None,
            validation: FieldValidation::Disabled,
        }
    }

    pub(crate) fn with_schema(
        table: impl Into<String>,
        schema: Arc<Schema>,
        validation: FieldValidation,
    ) -> Self {
        Self {
            table: table.into(),
            schema: Some(schema),
            validation,
        }
    }

    /// The table this factory is bound to.
    pub fn table(&self) -> &str {
        &self.table
    }

    // ==================== Comparison ====================

    /// `field = value`
    pub fn eq(&self, field: &str, value: impl Into<Value>) -> QueryResult<Predicate> {
        self.single(field, Operator::Eq, value.into())
    }

    /// `field != value`
    pub fn ne(&self, field: &str, value: impl Into<Value>) -> QueryResult<Predicate> {
        self.single(field, Operator::Ne, value.into())
    }

    /// `field > value`
    pub fn gt(&self, field: &str, value: impl Into<Value>) -> QueryResult<Predicate> {
        self.single(field, Operator::Gt, value.into())
    }

    /// `field >= value`
    pub fn gte(&self, field: &str, value: impl Into<Value>) -> QueryResult<Predicate> {
        self.single(field, Operator::Gte, value.into())
    }

    /// `field < value`
    pub fn lt(&self, field: &str, value: impl Into<Value>) -> QueryResult<Predicate> {
        self.single(field, Operator::Lt, value.into())
    }

    /// `field <= value`
    pub fn lte(&self, field: &str, value: impl Into<Value>) -> QueryResult<Predicate> {
        self.single(field, Operator::Lte, value.into())
    }

    /// `field BETWEEN low AND high`
    pub fn between(
        &self,
        field: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> QueryResult<Predicate> {
        let column = self.check_field(field)?;
        let (low, high) = (low.into(), high.into());
        self.check_value(column, field, &low)?;
        self.check_value(column, field, &high)?;
        Ok(leaf(field, Operator::Between, Operand::Range(low, high)))
    }

    // ==================== Pattern matching ====================

    /// `field LIKE pattern`
    pub fn like(&self, field: &str, pattern: impl Into<Value>) -> QueryResult<Predicate> {
        self.pattern(field, Operator::Like, pattern.into())
    }

    /// `field ILIKE pattern` (case-insensitive)
    pub fn ilike(&self, field: &str, pattern: impl Into<Value>) -> QueryResult<Predicate> {
        self.pattern(field, Operator::ILike, pattern.into())
    }

    /// `field NOT LIKE pattern`
    pub fn not_like(&self, field: &str, pattern: impl Into<Value>) -> QueryResult<Predicate> {
        self.pattern(field, Operator::NotLike, pattern.into())
    }

    // ==================== Set membership ====================

    /// `field IN (v1, v2, ...)`, one parameter per element.
    pub fn in_list<V: Into<Value>>(
        &self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> QueryResult<Predicate> {
        self.list(field, Operator::In, values)
    }

    /// `field NOT IN (v1, v2, ...)`
    pub fn not_in<V: Into<Value>>(
        &self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> QueryResult<Predicate> {
        self.list(field, Operator::NotIn, values)
    }

    // ==================== Null checks ====================

    /// `field IS NULL`
    pub fn is_null(&self, field: &str) -> QueryResult<Predicate> {
        self.check_field(field)?;
        Ok(leaf(field, Operator::IsNull, Operand::None))
    }

    /// `field IS NOT NULL`
    pub fn is_not_null(&self, field: &str) -> QueryResult<Predicate> {
        self.check_field(field)?;
        Ok(leaf(field, Operator::IsNotNull, Operand::None))
    }

    // ==================== Composition ====================

    /// All of `children`.
    pub fn and(&self, children: impl IntoIterator<Item = Predicate>) -> Predicate {
        Predicate::and(children)
    }

    /// Any of `children`.
    pub fn or(&self, children: impl IntoIterator<Item = Predicate>) -> Predicate {
        Predicate::or(children)
    }

    /// Negate a single predicate.
    pub fn not(&self, child: Predicate) -> Predicate {
        Predicate::not(child)
    }

    // ==================== Internals ====================

    fn single(&self, field: &str, operator: Operator, value: Value) -> QueryResult<Predicate> {
        let column = self.check_field(field)?;
        self.check_value(column, field, &value)?;
        Ok(leaf(field, operator, Operand::Single(value)))
    }

    fn pattern(&self, field: &str, operator: Operator, pattern: Value) -> QueryResult<Predicate> {
        let column = self.check_field(field)?;
        if self.validation == FieldValidation::Strict {
            if let Some(column) = column.filter(|c| c.kind != ScalarKind::Text) {
                return Err(QueryError::TypeMismatch {
                    field: field.to_string(),
                    expected: ScalarKind::Text.to_string(),
                    found: column.kind.to_string(),
                });
            }
            if !matches!(pattern, Value::Text(_)) {
                return Err(type_mismatch(field, ScalarKind::Text, &pattern));
            }
        }
        Ok(leaf(field, operator, Operand::Single(pattern)))
    }

    fn list<V: Into<Value>>(
        &self,
        field: &str,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> QueryResult<Predicate> {
        let column = self.check_field(field)?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        for value in &values {
            self.check_value(column, field, value)?;
        }
        Ok(leaf(field, operator, Operand::List(values)))
    }

    /// Resolve `field` (bare or qualified with this table) to its column.
    ///
    /// `field` must be an identifier or an aggregate over one (`SUM(age)`,
    /// `COUNT(*)`) at every validation level, since it is spliced into SQL.
    /// Aggregates resolve to no column, so value kinds are not checked for them.
    fn check_field(&self, field: &str) -> QueryResult<Option<&ColumnDescriptor>> {
        let (target, aggregate) = match aggregate_argument(field) {
            Some(arg) => (arg.trim(), true),
            None => (field, false),
        };
        let star = aggregate && target == "*";
        if !star && validate_ident(target).is_err() {
            return Err(QueryError::invalid_field(&self.table, field));
        }

        let Some(schema) = self.schema.as_deref() else {
            return Ok(None);
        };
        if self.validation == FieldValidation::Disabled || star {
            return Ok(None);
        }

        let (qualifier, column) = split_qualified(target);
        if qualifier.is_some_and(|q| q != self.table) {
            return Err(QueryError::invalid_field(&self.table, field));
        }
        let table = schema
            .get_table(&self.table)
            .ok_or_else(|| QueryError::UnknownTable(self.table.clone()))?;
        let column = table
            .get_column(column)
            .ok_or_else(|| QueryError::invalid_field(&self.table, field))?;
        Ok((!aggregate).then_some(column))
    }

    fn check_value(
        &self,
        column: Option<&ColumnDescriptor>,
        field: &str,
        value: &Value,
    ) -> QueryResult<()> {
        match column {
            Some(column)
                if self.validation == FieldValidation::Strict && !column.accepts(value) =>
            {
                Err(type_mismatch(field, column.kind, value))
            }
            _ => Ok(()),
        }
    }
}

fn leaf(field: &str, operator: Operator, operand: Operand) -> Predicate {
    Predicate::Condition(Condition {
        field: field.to_string(),
        operator,
        operand,
    })
}

fn type_mismatch(field: &str, expected: ScalarKind, found: &Value) -> QueryError {
    QueryError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        found: found.type_name().to_string(),
    }
}

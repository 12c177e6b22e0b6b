//! Renders a [`QueryModel`] into SQL text plus bound parameters.
//!
//! One compile pass owns one `CompileSession`: a single parameter list whose
//! length is the current placeholder number. Named sub-queries are compiled
//! through the same session, so the WITH list and the outer statement share
//! one continuous `$1, $2, ...` numbering.
//!
//! Emission order, which fixes parameter numbering:
//!
//! 1. `WITH name AS (...), ...` in declaration order
//! 2. `SELECT <columns or *> FROM <table>`
//! 3. joins, in call order
//! 4. `WHERE` (top-level predicates joined with AND, not parenthesized)
//! 5. `GROUP BY`
//! 6. `HAVING`
//! 7. `ORDER BY`
//! 8. `LIMIT` / `OFFSET` as literal integers

use crate::condition::{Condition, Operand, Operator, Predicate};
use crate::model::QueryModel;
use crate::value::Value;
use serde::Serialize;
use tokio_postgres::types::ToSql;

/// SQL text and its parameters. `$n` in `sql` binds `params[n - 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledQuery {
    /// Parameters as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
    }
}

/// Compile a full SELECT statement.
pub fn compile(model: &QueryModel) -> CompiledQuery {
    let mut session = CompileSession::default();
    let mut sql = String::new();
    session.write_statement(model, Shape::Rows, &mut sql);
    session.finish(sql)
}

/// Compile a row count of the statement.
///
/// ORDER BY, LIMIT and OFFSET are dropped. With GROUP BY or HAVING the
/// statement is wrapped: `SELECT COUNT(*) FROM (...) AS t`.
pub fn compile_count(model: &QueryModel) -> CompiledQuery {
    let mut session = CompileSession::default();
    let mut sql = String::new();
    session.write_statement(model, Shape::Count, &mut sql);
    session.finish(sql)
}

/// Compile a single predicate tree, numbering from `$1`.
pub fn compile_predicate(predicate: &Predicate) -> CompiledQuery {
    let mut session = CompileSession::default();
    let mut sql = String::new();
    session.write_predicate(predicate, &mut sql);
    session.finish(sql)
}

#[derive(Clone, Copy)]
enum Shape {
    Rows,
    Count,
}

#[derive(Clone, Copy)]
enum Projection {
    Columns,
    CountAll,
    One,
}

/// Placeholder counter and parameter list for one compile pass.
#[derive(Debug, Default)]
struct CompileSession {
    params: Vec<Value>,
}

impl CompileSession {
    fn finish(self, sql: String) -> CompiledQuery {
        CompiledQuery {
            sql,
            params: self.params,
        }
    }

    /// Push `value` and write its placeholder.
    fn bind(&mut self, value: &Value, out: &mut String) {
        self.params.push(value.clone());
        out.push('$');
        out.push_str(&self.params.len().to_string());
    }

    fn write_statement(&mut self, model: &QueryModel, shape: Shape, out: &mut String) {
        if !model.ctes.is_empty() {
            out.push_str("WITH ");
            for (i, cte) in model.ctes.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&cte.name);
                out.push_str(" AS (");
                self.write_statement(&cte.query, Shape::Rows, out);
                out.push(')');
            }
            out.push(' ');
        }

        match shape {
            Shape::Rows => self.write_select(model, Projection::Columns, true, out),
            Shape::Count if model.group_by.is_empty() && model.having.is_empty() => {
                self.write_select(model, Projection::CountAll, false, out)
            }
            Shape::Count => {
                out.push_str("SELECT COUNT(*) FROM (");
                self.write_select(model, Projection::One, false, out);
                out.push_str(") AS t");
            }
        }
    }

    fn write_select(
        &mut self,
        model: &QueryModel,
        projection: Projection,
        paged: bool,
        out: &mut String,
    ) {
        out.push_str("SELECT ");
        match projection {
            Projection::Columns if model.columns.is_empty() => out.push('*'),
            Projection::Columns => out.push_str(&model.columns.join(", ")),
            Projection::CountAll => out.push_str("COUNT(*)"),
            Projection::One => out.push('1'),
        }
        out.push_str(" FROM ");
        out.push_str(model.table());

        for join in &model.joins {
            out.push(' ');
            out.push_str(join.kind.as_sql());
            out.push(' ');
            out.push_str(&join.table);
            out.push_str(" ON ");
            out.push_str(&join.on);
        }

        if !model.where_.is_empty() {
            out.push_str(" WHERE ");
            self.write_conjunction(&model.where_, out);
        }

        if !model.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            out.push_str(&model.group_by.join(", "));
        }

        if !model.having.is_empty() {
            out.push_str(" HAVING ");
            self.write_conjunction(&model.having, out);
        }

        if !paged {
            return;
        }

        if !model.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            for (i, order) in model.order_by.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&order.column);
                out.push(' ');
                out.push_str(order.direction.as_sql());
            }
        }

        if let Some(limit) = model.limit {
            out.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = model.offset {
            out.push_str(&format!(" OFFSET {offset}"));
        }
    }

    /// Top-level WHERE/HAVING list: implicit AND, no surrounding parentheses.
    fn write_conjunction(&mut self, predicates: &[Predicate], out: &mut String) {
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                out.push_str(" AND ");
            }
            self.write_predicate(predicate, out);
        }
    }

    fn write_predicate(&mut self, predicate: &Predicate, out: &mut String) {
        match predicate {
            Predicate::Condition(condition) => self.write_condition(condition, out),
            Predicate::And(children) => self.write_group(children, " AND ", "1=1", out),
            Predicate::Or(children) => self.write_group(children, " OR ", "1=0", out),
            Predicate::Not(child) => {
                out.push_str("NOT (");
                self.write_predicate(child, out);
                out.push(')');
            }
        }
    }

    /// Explicit AND/OR node: always parenthesized. An empty group is a constant.
    fn write_group(&mut self, children: &[Predicate], sep: &str, empty: &str, out: &mut String) {
        if children.is_empty() {
            out.push_str(empty);
            return;
        }
        out.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write_predicate(child, out);
        }
        out.push(')');
    }

    fn write_condition(&mut self, condition: &Condition, out: &mut String) {
        let operator = condition.operator();
        match condition.operand() {
            Operand::List(values) if values.is_empty() => {
                out.push_str(if operator == Operator::NotIn { "1=1" } else { "1=0" });
                return;
            }
            _ => {}
        }

        out.push_str(condition.field());
        out.push(' ');
        out.push_str(operator.as_sql());

        match condition.operand() {
            Operand::None => {}
            Operand::Single(value) => {
                out.push(' ');
                self.bind(value, out);
            }
            Operand::List(values) => {
                out.push_str(" (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.bind(value, out);
                }
                out.push(')');
            }
            Operand::Range(low, high) => {
                out.push(' ');
                self.bind(low, out);
                out.push_str(" AND ");
                self.bind(high, out);
            }
        }
    }
}

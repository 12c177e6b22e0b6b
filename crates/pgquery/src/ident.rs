//! Identifier validation.
//!
//! Postgres cannot parameterize identifiers, so names that end up spliced into
//! SQL text (tables in the relation graph, CTE names) are checked here.
//!
//! - Each dotted segment must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - Empty segments (`a..b`, `a.`) are rejected

use crate::error::{QueryError, QueryResult};

/// Validate a plain or dotted SQL identifier such as `users` or `public.users`.
pub fn validate_ident(name: &str) -> QueryResult<()> {
    if name.is_empty() {
        return Err(QueryError::validation("Identifier cannot be empty"));
    }

    for segment in name.split('.') {
        let mut chars = segment.chars();
        match chars.next() {
            None => {
                return Err(QueryError::validation(format!(
                    "Empty identifier segment in '{name}'"
                )));
            }
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            Some(c) => {
                return Err(QueryError::validation(format!(
                    "Invalid identifier start character '{c}' in '{name}'"
                )));
            }
        }
        if let Some(c) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
            return Err(QueryError::validation(format!(
                "Invalid character '{c}' in identifier '{name}'"
            )));
        }
    }

    Ok(())
}

/// Split `table.column` into its qualifier and column. Unqualified names return `None`.
pub(crate) fn split_qualified(field: &str) -> (Option<&str>, &str) {
    match field.rsplit_once('.') {
        Some((qualifier, column)) => (Some(qualifier), column),
        None => (None, field),
    }
}

/// The argument of an aggregate call such as `COUNT(*)` or `SUM(age)`.
///
/// Returns `None` unless `field` is exactly `NAME(arg)` with an undotted
/// identifier for `NAME`. The argument itself is not validated.
pub(crate) fn aggregate_argument(field: &str) -> Option<&str> {
    let (name, rest) = field.split_once('(')?;
    let arg = rest.strip_suffix(')')?;
    if name.contains('.') || validate_ident(name).is_err() {
        return None;
    }
    Some(arg)
}

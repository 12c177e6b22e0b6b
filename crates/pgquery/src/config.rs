use serde::Deserialize;
use std::time::Duration;

/// How much a [`ConditionFactory`](crate::ConditionFactory) checks against the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValidation {
    /// No checks.
    Disabled,
    /// Unknown columns fail with `InvalidField`.
    #[default]
    Names,
    /// Column names plus value kinds (`TypeMismatch`).
    Strict,
}

/// Configuration for [`Database`](crate::Database).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Condition factory validation level.
    pub field_validation: FieldValidation,
    /// Query timeout duration, applied when running compiled statements.
    #[serde(with = "millis")]
    pub query_timeout: Option<Duration>,
    /// Truncate SQL in log events (in chars). `None` means no truncation.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            field_validation: FieldValidation::Names,
            query_timeout: None,
            max_logged_sql_length: Some(200),
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation level.
    pub fn field_validation(mut self, level: FieldValidation) -> Self {
        self.field_validation = level;
        self
    }

    /// Check column names and value kinds.
    pub fn strict(mut self) -> Self {
        self.field_validation = FieldValidation::Strict;
        self
    }

    /// Disable field validation.
    pub fn no_validation(mut self) -> Self {
        self.field_validation = FieldValidation::Disabled;
        self
    }

    /// Set query timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = Some(duration);
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }

    /// Log SQL untruncated.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }

    /// Truncate `sql` for a log event, on a char boundary.
    pub(crate) fn truncate_sql<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_logged_sql_length {
            Some(max) if sql.chars().count() > max => {
                let cut: String = sql.chars().take(max).collect();
                std::borrow::Cow::Owned(format!("{cut}..."))
            }
            _ => std::borrow::Cow::Borrowed(sql),
        }
    }
}

/// `query_timeout` is written as milliseconds in config files.
mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

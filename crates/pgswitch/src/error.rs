//! Error types for pgswitch

use thiserror::Error;

/// Result type alias for pgswitch operations
pub type SwitchResult<T> = Result<T, SwitchError>;

/// Error types for scanning and syncing tables
#[derive(Debug, Error)]
pub enum SwitchError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Tables whose foreign keys form a cycle
    #[error("Dependency cycle between tables: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SwitchError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a dependency cycle error
    pub fn is_dependency_cycle(&self) -> bool {
        matches!(self, Self::DependencyCycle(_))
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SwitchError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_lists_tables() {
        let err = SwitchError::DependencyCycle(vec!["a".into(), "b".into()]);
        assert!(err.is_dependency_cycle());
        assert_eq!(err.to_string(), "Dependency cycle between tables: a, b");
    }

    #[test]
    fn decode_names_column() {
        let err = SwitchError::decode("relname", "unexpected null");
        assert_eq!(
            err.to_string(),
            "Decode error on column 'relname': unexpected null"
        );
    }
}

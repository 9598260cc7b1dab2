//! Error types for schema building and migration tracking
//!
//! A declaration error (`InvalidInput`) is distinguishable from a statement
//! the store rejected (`Execution`) and from a tracker-level fault
//! (`Migration`), so callers can tell bad input apart from runtime failure.

use std::fmt;

/// Result type alias for schema and migration operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Error types for schema and migration operations
#[derive(Debug, Clone)]
pub enum SchemaError {
    /// A builder call received invalid input (e.g. an empty enum value set)
    InvalidInput(String),
    /// The database executor rejected a statement
    Execution(String),
    /// Migration tracking failed
    Migration(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            SchemaError::Execution(msg) => write!(f, "Execution error: {}", msg),
            SchemaError::Migration(msg) => write!(f, "Migration error: {}", msg),
        }
    }
}

impl std::error::Error for SchemaError {}

// Convert from sqlx errors raised by the concrete backend
impl From<sqlx::Error> for SchemaError {
    fn from(err: sqlx::Error) -> Self {
        SchemaError::Execution(err.to_string())
    }
}

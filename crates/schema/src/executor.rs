//! Database executor abstraction
//!
//! The engine never talks to a database directly. Everything goes through
//! this trait, injected at construction time, so schema building and
//! migration tracking can be exercised against any store (or a test double).
//!
//! Statement text is plain SQL. Identifiers are interpolated directly and
//! are not sanitized beyond string-literal quoting; callers must validate
//! table and column names themselves. Scalar queries may carry `?`
//! placeholders bound to the given parameters.

use async_trait::async_trait;

use crate::error::SchemaResult;
use crate::value::DatabaseValue;

/// Abstract database executor
#[async_trait]
pub trait DatabaseExecutor: Send + Sync {
    /// Check whether a table exists in the connected database
    async fn table_exists(&self, table: &str) -> SchemaResult<bool>;

    /// Execute a statement and return the affected row count
    async fn execute(&self, statement: &str) -> SchemaResult<u64>;

    /// Execute a query and return the first column of the first row, if any
    async fn query_scalar(
        &self,
        statement: &str,
        params: &[DatabaseValue],
    ) -> SchemaResult<Option<DatabaseValue>>;

    /// Insert a row and return the generated id
    async fn insert_record(
        &self,
        table: &str,
        fields: &[(&str, DatabaseValue)],
    ) -> SchemaResult<u64>;
}

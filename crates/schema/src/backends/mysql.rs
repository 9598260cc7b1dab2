//! MySQL executor backed by a sqlx connection pool
//!
//! The compiled DDL dialect targets MySQL (`MODIFY COLUMN`, `AFTER`,
//! engine/charset table options), so this is the reference backend.

use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Executor as _, MySql, Row};

use crate::error::{SchemaError, SchemaResult};
use crate::executor::DatabaseExecutor;
use crate::value::DatabaseValue;

/// MySQL implementation of [`DatabaseExecutor`]
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    /// Wrap an existing pool
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool from a database URL
    pub async fn connect(database_url: &str) -> SchemaResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| SchemaError::Execution(format!("failed to connect: {}", e)))?;
        Ok(Self::new(pool))
    }

    /// The underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &DatabaseValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        DatabaseValue::Null => query.bind(Option::<String>::None),
        DatabaseValue::Bool(v) => query.bind(*v),
        DatabaseValue::Int(v) => query.bind(*v),
        DatabaseValue::UInt(v) => query.bind(*v),
        DatabaseValue::Float(v) => query.bind(*v),
        DatabaseValue::String(v) => query.bind(v.clone()),
        DatabaseValue::DateTime(v) => query.bind(*v),
        DatabaseValue::Json(v) => query.bind(v.to_string()),
    }
}

fn scalar_from_row(row: &MySqlRow) -> Option<DatabaseValue> {
    if let Ok(value) = row.try_get::<Option<i64>, _>(0) {
        return value.map(DatabaseValue::Int);
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(0) {
        return value.map(DatabaseValue::UInt);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(0) {
        return value.map(DatabaseValue::Float);
    }
    row.try_get::<Option<String>, _>(0)
        .ok()
        .flatten()
        .map(DatabaseValue::String)
}

#[async_trait]
impl DatabaseExecutor for MySqlExecutor {
    async fn table_exists(&self, table: &str) -> SchemaResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn execute(&self, statement: &str) -> SchemaResult<u64> {
        // DDL goes over the text protocol; not every statement is preparable
        let done = self.pool.execute(statement).await?;
        Ok(done.rows_affected())
    }

    async fn query_scalar(
        &self,
        statement: &str,
        params: &[DatabaseValue],
    ) -> SchemaResult<Option<DatabaseValue>> {
        let mut query = sqlx::query(statement);
        for param in params {
            query = bind_value(query, param);
        }
        let row = query.fetch_optional(&self.pool).await?;
        Ok(row.as_ref().and_then(scalar_from_row))
    }

    async fn insert_record(
        &self,
        table: &str,
        fields: &[(&str, DatabaseValue)],
    ) -> SchemaResult<u64> {
        let columns: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let placeholders = vec!["?"; fields.len()].join(", ");
        let statement = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&statement);
        for (_, value) in fields {
            query = bind_value(query, value);
        }
        let done = query.execute(&self.pool).await?;
        Ok(done.last_insert_id())
    }
}

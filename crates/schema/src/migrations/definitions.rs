//! Migration definitions - core types for migration tracking
//!
//! Defines the `Migration` contract plus the record and result structures
//! the tracker works with.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SchemaResult;
use crate::schema::{Schema, SchemaConfig};

/// One migration unit.
///
/// `name` is the stable identifier recorded in the store; it must not
/// change once a migration has shipped. The tracker never invokes `down`
/// on its own; only an explicit rollback call executes it.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Stable identifier for this migration
    fn name(&self) -> &str;

    /// Apply the migration
    async fn up(&self, schema: &Schema) -> SchemaResult<()>;

    /// Reverse the migration
    async fn down(&self, schema: &Schema) -> SchemaResult<()>;
}

/// An applied migration as recorded in the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Migration identifier
    pub migration: String,
    /// Batch number grouping migrations applied in one run
    pub batch: i64,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// Migration status in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Not yet applied
    Pending,
    /// Applied in the given batch
    Applied { batch: i64 },
}

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationRunResult {
    /// Number of migrations that were applied
    pub applied_count: usize,
    /// Names of migrations that were applied
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were skipped (already applied)
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Result of rolling back migrations
#[derive(Debug)]
pub struct RollbackResult {
    /// Number of migrations that were rolled back
    pub rolled_back_count: usize,
    /// Names of migrations that were rolled back
    pub rolled_back_migrations: Vec<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Configuration for the migration tracker
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Logical name of the tracking table (prefixed like any other table)
    pub table: String,
    /// Schema settings migrations run under
    pub schema: SchemaConfig,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            table: "migrations".to_string(),
            schema: SchemaConfig::default(),
        }
    }
}

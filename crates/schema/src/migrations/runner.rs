//! Migration runner - applies migration units and tracks batches
//!
//! The tracker consults the record store before each unit: names already
//! recorded are skipped, everything else runs `up()` and is recorded under
//! the batch number computed once at the start of the run. A failing
//! `up()` propagates immediately and leaves no record, so the unit is
//! retried on the next invocation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::error::{SchemaError, SchemaResult};
use crate::executor::DatabaseExecutor;
use crate::schema::Schema;
use crate::value::{quote_literal, DatabaseValue};

use super::definitions::{
    Migration, MigrationRecord, MigrationRunResult, MigrationStatus, MigratorConfig,
    RollbackResult,
};

/// Runs migration units against the record store
pub struct Migrator {
    executor: Arc<dyn DatabaseExecutor>,
    config: MigratorConfig,
    schema: Schema,
}

impl Migrator {
    /// Create a tracker with the default configuration
    pub fn new(executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self::with_config(executor, MigratorConfig::default())
    }

    pub fn with_config(executor: Arc<dyn DatabaseExecutor>, config: MigratorConfig) -> Self {
        let schema = Schema::with_config(executor.clone(), config.schema.clone());
        Self {
            executor,
            config,
            schema,
        }
    }

    /// The schema handle migration units run against
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn record_table(&self) -> String {
        format!("{}{}", self.config.schema.table_prefix, self.config.table)
    }

    /// Apply every pending unit in input order.
    ///
    /// All units applied by one call share a single batch number, computed
    /// up front as `max(batch) + 1`.
    pub async fn run(&self, migrations: &[Box<dyn Migration>]) -> SchemaResult<MigrationRunResult> {
        let start = Instant::now();
        self.ensure_record_store().await?;

        let batch = self.latest_batch().await? + 1;

        let mut applied = Vec::new();
        let mut skipped = 0usize;
        for migration in migrations {
            let name = migration.name();
            if self.is_applied(name).await? {
                tracing::debug!(migration = name, "already applied, skipping");
                skipped += 1;
                continue;
            }

            tracing::info!(migration = name, batch, "applying migration");
            migration.up(&self.schema).await?;
            self.record_applied(name, batch).await?;
            applied.push(name.to_string());
        }

        Ok(MigrationRunResult {
            applied_count: applied.len(),
            applied_migrations: applied,
            skipped_count: skipped,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }

    /// Roll back the most recent batch, executing `down()` in reverse
    /// application order.
    ///
    /// Units are resolved from the supplied list by name; a recorded
    /// migration missing from the list is an error, since its `down()`
    /// cannot be located.
    pub async fn rollback(
        &self,
        migrations: &[Box<dyn Migration>],
    ) -> SchemaResult<RollbackResult> {
        let start = Instant::now();
        self.ensure_record_store().await?;

        let batch = self.latest_batch().await?;
        let mut rolled_back = Vec::new();
        if batch > 0 {
            for migration in migrations.iter().rev() {
                let name = migration.name();
                if self.applied_batch(name).await? == Some(batch) {
                    tracing::info!(migration = name, batch, "rolling back migration");
                    migration.down(&self.schema).await?;
                    self.delete_record(name).await?;
                    rolled_back.push(name.to_string());
                }
            }

            let remaining = self.batch_count(batch).await?;
            if remaining > 0 {
                return Err(SchemaError::Migration(format!(
                    "batch {} still holds {} applied migration(s) missing from the supplied list",
                    batch, remaining
                )));
            }
        }

        Ok(RollbackResult {
            rolled_back_count: rolled_back.len(),
            rolled_back_migrations: rolled_back,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }

    /// Report each supplied unit as pending or applied
    pub async fn status(
        &self,
        migrations: &[Box<dyn Migration>],
    ) -> SchemaResult<Vec<(String, MigrationStatus)>> {
        self.ensure_record_store().await?;

        let mut statuses = Vec::with_capacity(migrations.len());
        for migration in migrations {
            let name = migration.name();
            let status = match self.applied_batch(name).await? {
                Some(batch) => MigrationStatus::Applied { batch },
                None => MigrationStatus::Pending,
            };
            statuses.push((name.to_string(), status));
        }
        Ok(statuses)
    }

    /// Lazily create the tracking table.
    ///
    /// The UNIQUE key on `migration` is what turns a concurrent
    /// double-application into a detectable insert conflict; it is not
    /// optional.
    async fn ensure_record_store(&self) -> SchemaResult<()> {
        self.schema
            .create(&self.config.table, |table| {
                table.id();
                table.string("migration", Some(255)).unique();
                table.integer("batch");
                table.timestamp("created_at").use_current();
                Ok(())
            })
            .await
    }

    async fn latest_batch(&self) -> SchemaResult<i64> {
        let statement = format!(
            "SELECT COALESCE(MAX(batch), 0) FROM {}",
            self.record_table()
        );
        Ok(match self.executor.query_scalar(&statement, &[]).await? {
            Some(DatabaseValue::Int(batch)) => batch,
            Some(DatabaseValue::UInt(batch)) => batch as i64,
            _ => 0,
        })
    }

    async fn is_applied(&self, name: &str) -> SchemaResult<bool> {
        let statement = format!(
            "SELECT migration FROM {} WHERE migration = ?",
            self.record_table()
        );
        Ok(self
            .executor
            .query_scalar(&statement, &[DatabaseValue::from(name)])
            .await?
            .is_some())
    }

    async fn applied_batch(&self, name: &str) -> SchemaResult<Option<i64>> {
        let statement = format!(
            "SELECT batch FROM {} WHERE migration = ?",
            self.record_table()
        );
        Ok(
            match self
                .executor
                .query_scalar(&statement, &[DatabaseValue::from(name)])
                .await?
            {
                Some(DatabaseValue::Int(batch)) => Some(batch),
                Some(DatabaseValue::UInt(batch)) => Some(batch as i64),
                _ => None,
            },
        )
    }

    async fn batch_count(&self, batch: i64) -> SchemaResult<i64> {
        let statement = format!(
            "SELECT COUNT(*) FROM {} WHERE batch = ?",
            self.record_table()
        );
        Ok(
            match self
                .executor
                .query_scalar(&statement, &[DatabaseValue::from(batch)])
                .await?
            {
                Some(DatabaseValue::Int(count)) => count,
                Some(DatabaseValue::UInt(count)) => count as i64,
                _ => 0,
            },
        )
    }

    async fn record_applied(&self, name: &str, batch: i64) -> SchemaResult<()> {
        let record = MigrationRecord {
            migration: name.to_string(),
            batch,
            applied_at: Utc::now(),
        };
        let fields = [
            ("migration", DatabaseValue::from(record.migration)),
            ("batch", DatabaseValue::from(record.batch)),
            ("created_at", DatabaseValue::from(record.applied_at)),
        ];
        self.executor
            .insert_record(&self.record_table(), &fields)
            .await?;
        Ok(())
    }

    async fn delete_record(&self, name: &str) -> SchemaResult<()> {
        let statement = format!(
            "DELETE FROM {} WHERE migration = {}",
            self.record_table(),
            quote_literal(name)
        );
        self.executor.execute(&statement).await?;
        Ok(())
    }
}

//! Schema compiler
//!
//! Turns a fluent table definition into DDL and hands it to the injected
//! executor. `create` never overwrites an existing table and `alter` never
//! touches a missing one; both skips are deliberate idempotency policies,
//! not errors.

pub mod column;
pub mod foreign;
pub mod table;

pub use column::ColumnSpec;
pub use foreign::ForeignKeyRef;
pub use table::{ColumnRef, TableBuilder};

use std::sync::Arc;

use crate::error::SchemaResult;
use crate::executor::DatabaseExecutor;

/// Storage-level settings applied to every table
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    /// Prefix folded into every table name, including foreign-key targets
    pub table_prefix: String,
    /// Options appended to CREATE TABLE statements
    pub table_options: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            table_options: "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4".to_string(),
        }
    }
}

/// Compiles table definitions and executes them through the injected
/// executor
#[derive(Clone)]
pub struct Schema {
    executor: Arc<dyn DatabaseExecutor>,
    config: SchemaConfig,
}

impl Schema {
    pub fn new(executor: Arc<dyn DatabaseExecutor>) -> Self {
        Self::with_config(executor, SchemaConfig::default())
    }

    pub fn with_config(executor: Arc<dyn DatabaseExecutor>, config: SchemaConfig) -> Self {
        Self { executor, config }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    pub fn executor(&self) -> Arc<dyn DatabaseExecutor> {
        self.executor.clone()
    }

    fn prefixed(&self, table: &str) -> String {
        format!("{}{}", self.config.table_prefix, table)
    }

    /// Check whether a table exists under its prefixed name
    pub async fn has_table(&self, table: &str) -> SchemaResult<bool> {
        self.executor.table_exists(&self.prefixed(table)).await
    }

    /// Create a table from a fluent definition.
    ///
    /// If the table already exists this returns without invoking the
    /// definition closure or issuing any statement.
    pub async fn create<F>(&self, table: &str, define: F) -> SchemaResult<()>
    where
        F: FnOnce(&mut TableBuilder) -> SchemaResult<()>,
    {
        let name = self.prefixed(table);
        if self.executor.table_exists(&name).await? {
            tracing::debug!(table = %name, "table exists, create skipped");
            return Ok(());
        }

        let mut builder = TableBuilder::with_prefix(name.as_str(), self.config.table_prefix.as_str());
        define(&mut builder)?;
        builder.finalize_foreign_keys();

        let statement = builder.create_statement(&self.config.table_options);
        tracing::debug!(table = %name, "creating table");
        self.executor.execute(&statement).await?;
        Ok(())
    }

    /// Alter an existing table: one statement per accumulated spec, in
    /// declaration order.
    ///
    /// A missing table makes this a no-op.
    pub async fn alter<F>(&self, table: &str, define: F) -> SchemaResult<()>
    where
        F: FnOnce(&mut TableBuilder) -> SchemaResult<()>,
    {
        let name = self.prefixed(table);
        if !self.executor.table_exists(&name).await? {
            tracing::debug!(table = %name, "table missing, alter skipped");
            return Ok(());
        }

        let mut builder = TableBuilder::with_prefix(name.as_str(), self.config.table_prefix.as_str());
        define(&mut builder)?;
        builder.finalize_foreign_keys();

        for statement in builder.alter_statements() {
            self.executor.execute(&statement).await?;
        }
        Ok(())
    }

    pub async fn drop(&self, table: &str) -> SchemaResult<()> {
        let statement = format!("DROP TABLE {}", self.prefixed(table));
        self.executor.execute(&statement).await?;
        Ok(())
    }

    pub async fn drop_if_exists(&self, table: &str) -> SchemaResult<()> {
        let statement = format!("DROP TABLE IF EXISTS {}", self.prefixed(table));
        self.executor.execute(&statement).await?;
        Ok(())
    }

    pub async fn rename(&self, from: &str, to: &str) -> SchemaResult<()> {
        let statement = format!(
            "RENAME TABLE {} TO {}",
            self.prefixed(from),
            self.prefixed(to)
        );
        self.executor.execute(&statement).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryExecutor;

    #[tokio::test]
    async fn create_on_an_existing_table_issues_no_statements() {
        let executor = Arc::new(MemoryExecutor::with_tables(&["users"]));
        let schema = Schema::new(executor.clone());

        schema
            .create("users", |table| {
                table.id();
                Ok(())
            })
            .await
            .unwrap();

        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn alter_on_a_missing_table_issues_no_statements() {
        let executor = Arc::new(MemoryExecutor::new());
        let schema = Schema::new(executor.clone());

        schema
            .alter("users", |table| {
                table.drop_column("legacy");
                Ok(())
            })
            .await
            .unwrap();

        assert!(executor.statements().is_empty());
    }

    #[tokio::test]
    async fn create_executes_a_single_statement() {
        let executor = Arc::new(MemoryExecutor::new());
        let schema = Schema::new(executor.clone());

        schema
            .create("users", |table| {
                table.id();
                table.string("email", None).unique();
                Ok(())
            })
            .await
            .unwrap();

        let statements = executor.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("CREATE TABLE users (\n"));
        assert!(statements[0].contains("UNIQUE KEY users_email_unique (email)"));
        assert!(executor.has_table("users"));
    }

    #[tokio::test]
    async fn table_prefix_applies_to_the_statement_and_constraint_names() {
        let executor = Arc::new(MemoryExecutor::new());
        let config = SchemaConfig {
            table_prefix: "wp_".to_string(),
            ..SchemaConfig::default()
        };
        let schema = Schema::with_config(executor.clone(), config);

        schema
            .create("posts", |table| {
                table.id();
                table.foreign_id("user_id").references("id").on("users");
                Ok(())
            })
            .await
            .unwrap();

        let statements = executor.statements();
        assert!(statements[0].starts_with("CREATE TABLE wp_posts"));
        assert!(statements[0].contains("REFERENCES wp_users (id)"));
    }

    #[tokio::test]
    async fn alter_executes_statements_in_declaration_order() {
        let executor = Arc::new(MemoryExecutor::with_tables(&["users"]));
        let schema = Schema::new(executor.clone());

        schema
            .alter("users", |table| {
                table.rename_column("old_name", "name");
                table.modify_column("name").string_type(Some(100));
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(
            executor.statements(),
            vec![
                "ALTER TABLE users RENAME COLUMN old_name TO name",
                "ALTER TABLE users MODIFY COLUMN name VARCHAR(100) NOT NULL",
            ]
        );
    }

    #[tokio::test]
    async fn definition_errors_stop_before_any_statement() {
        let executor = Arc::new(MemoryExecutor::new());
        let schema = Schema::new(executor.clone());

        let result = schema
            .create("posts", |table| {
                table.enumeration("status", &[], None)?;
                Ok(())
            })
            .await;

        assert!(result.is_err());
        assert!(executor.statements().is_empty());
    }
}

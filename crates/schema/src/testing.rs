//! In-memory executor for tests
//!
//! `MemoryExecutor` records every executed statement, tracks table
//! existence from the DDL it sees (plus any scripted pre-existing tables),
//! and understands the narrow record-store statements the tracker issues.
//! It enforces the UNIQUE constraint on the `migration` field, so the
//! duplicate-insert conflict policy can be exercised without a live server.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{SchemaError, SchemaResult};
use crate::executor::DatabaseExecutor;
use crate::value::DatabaseValue;

/// One stored row, keyed by field name
pub type Record = BTreeMap<String, DatabaseValue>;

#[derive(Default)]
struct MemoryState {
    tables: HashSet<String>,
    statements: Vec<String>,
    records: BTreeMap<String, Vec<Record>>,
    next_id: u64,
}

/// In-memory [`DatabaseExecutor`] test double
#[derive(Default)]
pub struct MemoryExecutor {
    state: Mutex<MemoryState>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that reports the given tables as already existing
    pub fn with_tables(tables: &[&str]) -> Self {
        let executor = Self::new();
        {
            let mut state = executor.state.lock().unwrap();
            for table in tables {
                state.tables.insert((*table).to_string());
            }
        }
        executor
    }

    /// Every statement passed to `execute`, in order
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.state.lock().unwrap().tables.contains(table)
    }

    /// All rows inserted into a table, in insertion order
    pub fn records(&self, table: &str) -> Vec<Record> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

/// First identifier in `rest`, ending at whitespace or an opening paren
fn table_token(rest: &str) -> String {
    rest.trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("")
        .to_string()
}

/// Parse `<key> = '<value>'`, undoing `''` escaping
fn parse_equality(condition: &str) -> Option<(String, DatabaseValue)> {
    let (key, quoted) = condition.split_once(" = ")?;
    let quoted = quoted.trim();
    let inner = quoted.strip_prefix('\'')?.strip_suffix('\'')?;
    Some((
        key.trim().to_string(),
        DatabaseValue::String(inner.replace("''", "'")),
    ))
}

impl MemoryExecutor {
    fn missing_table(table: &str) -> SchemaError {
        SchemaError::Execution(format!("table {} does not exist", table))
    }
}

#[async_trait]
impl DatabaseExecutor for MemoryExecutor {
    async fn table_exists(&self, table: &str) -> SchemaResult<bool> {
        Ok(self.state.lock().unwrap().tables.contains(table))
    }

    async fn execute(&self, statement: &str) -> SchemaResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(statement.to_string());

        if let Some(rest) = statement.strip_prefix("CREATE TABLE ") {
            state.tables.insert(table_token(rest));
        } else if let Some(rest) = statement.strip_prefix("DROP TABLE IF EXISTS ") {
            let table = table_token(rest);
            state.tables.remove(&table);
            state.records.remove(&table);
        } else if let Some(rest) = statement.strip_prefix("DROP TABLE ") {
            let table = table_token(rest);
            if !state.tables.remove(&table) {
                return Err(Self::missing_table(&table));
            }
            state.records.remove(&table);
        } else if let Some(rest) = statement.strip_prefix("RENAME TABLE ") {
            if let Some((from, to)) = rest.split_once(" TO ") {
                let (from, to) = (from.trim().to_string(), to.trim().to_string());
                if !state.tables.remove(&from) {
                    return Err(Self::missing_table(&from));
                }
                state.tables.insert(to.clone());
                if let Some(rows) = state.records.remove(&from) {
                    state.records.insert(to, rows);
                }
            }
        } else if let Some(rest) = statement.strip_prefix("ALTER TABLE ") {
            let table = table_token(rest);
            if !state.tables.contains(&table) {
                return Err(Self::missing_table(&table));
            }
        } else if let Some(rest) = statement.strip_prefix("DELETE FROM ") {
            let (table_part, condition) = rest
                .split_once(" WHERE ")
                .ok_or_else(|| SchemaError::Execution("unsupported DELETE".to_string()))?;
            let table = table_token(table_part);
            if !state.tables.contains(&table) {
                return Err(Self::missing_table(&table));
            }
            let (key, needle) = parse_equality(condition)
                .ok_or_else(|| SchemaError::Execution("unsupported DELETE".to_string()))?;
            if let Some(rows) = state.records.get_mut(&table) {
                let before = rows.len();
                rows.retain(|row| row.get(&key) != Some(&needle));
                return Ok((before - rows.len()) as u64);
            }
        }
        Ok(0)
    }

    async fn query_scalar(
        &self,
        statement: &str,
        params: &[DatabaseValue],
    ) -> SchemaResult<Option<DatabaseValue>> {
        let state = self.state.lock().unwrap();

        if let Some(table) = statement.strip_prefix("SELECT COALESCE(MAX(batch), 0) FROM ") {
            let table = table.trim();
            if !state.tables.contains(table) {
                return Err(Self::missing_table(table));
            }
            let max = state
                .records
                .get(table)
                .into_iter()
                .flatten()
                .filter_map(|row| match row.get("batch") {
                    Some(DatabaseValue::Int(batch)) => Some(*batch),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            return Ok(Some(DatabaseValue::Int(max)));
        }

        if let Some(rest) = statement.strip_prefix("SELECT COUNT(*) FROM ") {
            if let Some((table, _)) = rest.split_once(" WHERE batch = ?") {
                let table = table.trim();
                if !state.tables.contains(table) {
                    return Err(Self::missing_table(table));
                }
                let needle = params.first().cloned().unwrap_or(DatabaseValue::Null);
                let count = state
                    .records
                    .get(table)
                    .into_iter()
                    .flatten()
                    .filter(|row| row.get("batch") == Some(&needle))
                    .count();
                return Ok(Some(DatabaseValue::Int(count as i64)));
            }
        }

        if let Some(rest) = statement.strip_prefix("SELECT ") {
            if let Some((column, rest)) = rest.split_once(" FROM ") {
                if let Some((table, condition)) = rest.split_once(" WHERE ") {
                    if let Some(key) = condition.strip_suffix(" = ?") {
                        let table = table.trim();
                        if !state.tables.contains(table) {
                            return Err(Self::missing_table(table));
                        }
                        let needle = params.first().cloned().unwrap_or(DatabaseValue::Null);
                        let value = state
                            .records
                            .get(table)
                            .into_iter()
                            .flatten()
                            .find(|row| row.get(key.trim()) == Some(&needle))
                            .and_then(|row| row.get(column.trim()).cloned());
                        return Ok(value);
                    }
                }
            }
        }

        Err(SchemaError::Execution(format!(
            "MemoryExecutor cannot interpret statement: {}",
            statement
        )))
    }

    async fn insert_record(
        &self,
        table: &str,
        fields: &[(&str, DatabaseValue)],
    ) -> SchemaResult<u64> {
        let mut state = self.state.lock().unwrap();
        if !state.tables.contains(table) {
            return Err(Self::missing_table(table));
        }

        // the record store's UNIQUE key on `migration`
        if let Some((_, value)) = fields.iter().find(|(name, _)| *name == "migration") {
            let duplicate = state
                .records
                .get(table)
                .into_iter()
                .flatten()
                .any(|row| row.get("migration") == Some(value));
            if duplicate {
                return Err(SchemaError::Execution(format!(
                    "duplicate entry {} for unique key on migration",
                    value.to_sql_literal()
                )));
            }
        }

        state.next_id += 1;
        let id = state.next_id;
        let mut record: Record = fields
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();
        record.insert("id".to_string(), DatabaseValue::UInt(id));
        state.records.entry(table.to_string()).or_default().push(record);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn executed_create_registers_the_table() {
        let executor = MemoryExecutor::new();
        executor
            .execute("CREATE TABLE users (\n  id INT\n)")
            .await
            .unwrap();

        assert!(executor.table_exists("users").await.unwrap());
        assert_eq!(executor.statements().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_migration_insert_is_rejected() {
        let executor = MemoryExecutor::with_tables(&["migrations"]);
        let fields = [
            ("migration", DatabaseValue::from("0001_init")),
            ("batch", DatabaseValue::from(1i64)),
        ];

        executor.insert_record("migrations", &fields).await.unwrap();
        let err = executor
            .insert_record("migrations", &fields)
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::Execution(_)));
    }

    #[tokio::test]
    async fn scalar_queries_cover_the_record_store_shapes() {
        let executor = MemoryExecutor::with_tables(&["migrations"]);
        for (name, batch) in [("0001_a", 1i64), ("0002_b", 2)] {
            executor
                .insert_record(
                    "migrations",
                    &[
                        ("migration", DatabaseValue::from(name)),
                        ("batch", DatabaseValue::from(batch)),
                    ],
                )
                .await
                .unwrap();
        }

        let max = executor
            .query_scalar("SELECT COALESCE(MAX(batch), 0) FROM migrations", &[])
            .await
            .unwrap();
        assert_eq!(max, Some(DatabaseValue::Int(2)));

        let hit = executor
            .query_scalar(
                "SELECT batch FROM migrations WHERE migration = ?",
                &[DatabaseValue::from("0001_a")],
            )
            .await
            .unwrap();
        assert_eq!(hit, Some(DatabaseValue::Int(1)));

        let miss = executor
            .query_scalar(
                "SELECT migration FROM migrations WHERE migration = ?",
                &[DatabaseValue::from("0009_z")],
            )
            .await
            .unwrap();
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn delete_removes_matching_records() {
        let executor = MemoryExecutor::with_tables(&["migrations"]);
        executor
            .insert_record(
                "migrations",
                &[
                    ("migration", DatabaseValue::from("0001_a")),
                    ("batch", DatabaseValue::from(1i64)),
                ],
            )
            .await
            .unwrap();

        let removed = executor
            .execute("DELETE FROM migrations WHERE migration = '0001_a'")
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(executor.records("migrations").is_empty());
    }

    #[tokio::test]
    async fn querying_a_missing_table_errors() {
        let executor = MemoryExecutor::new();
        let err = executor
            .query_scalar("SELECT COALESCE(MAX(batch), 0) FROM migrations", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::Execution(_)));
    }
}

//! Migration tracking
//!
//! Runs ordered migration units against a single tracking table, grouping
//! each run into a batch so replaying a set is a no-op for units that are
//! already applied.

pub mod definitions;
pub mod runner;

pub use definitions::{
    Migration, MigrationRecord, MigrationRunResult, MigrationStatus, MigratorConfig,
    RollbackResult,
};
pub use runner::Migrator;

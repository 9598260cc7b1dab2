//! # mason-schema: fluent schema definitions and tracked migrations
//!
//! Two halves working against one injected database executor:
//!
//! - [`Schema`] compiles fluent table definitions into DDL and executes
//!   them idempotently: `create` never overwrites an existing table,
//!   `alter` never touches a missing one.
//! - [`Migrator`] runs an ordered list of [`Migration`] units, recording
//!   each applied unit with a batch number so replaying a set is a no-op
//!   for units that are already applied.
//!
//! ```rust,ignore
//! let executor = Arc::new(MySqlExecutor::connect(&database_url).await?);
//! let schema = Schema::new(executor.clone());
//!
//! schema
//!     .create("posts", |table| {
//!         table.id();
//!         table.string("title", Some(255));
//!         table.foreign_id("user_id").references("id").on("users");
//!         table.timestamps();
//!         Ok(())
//!     })
//!     .await?;
//!
//! let migrator = Migrator::new(executor);
//! migrator.run(&migrations).await?;
//! ```

pub mod backends;
pub mod error;
pub mod executor;
pub mod migrations;
pub mod schema;
pub mod testing;
pub mod value;

// Re-export core traits and types
pub use backends::*;
pub use error::*;
pub use executor::*;
pub use migrations::*;
pub use schema::*;
pub use value::*;

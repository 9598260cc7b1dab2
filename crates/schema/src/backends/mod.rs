//! Concrete [`DatabaseExecutor`](crate::executor::DatabaseExecutor)
//! implementations

pub mod mysql;

pub use mysql::MySqlExecutor;

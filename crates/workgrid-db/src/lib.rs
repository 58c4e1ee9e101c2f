//! Workgrid Database — SurrealDB connection management, schema
//! migrations, and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types with structural schema-absence classification
//!   ([`DbError`])
//! - Implementations of the `workgrid-core` repository and lookup traits

mod connection;
mod error;
mod schema;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};

//! Persistence layer
//!
//! Store traits plus their PostgreSQL and in-memory implementations.

pub mod associations;
pub mod business;
pub mod memory;
pub mod schema;
mod sql;
pub mod traits;

pub use associations::PostgresAssociationStore;
pub use business::PostgresBusinessStore;
pub use memory::{InMemoryTopoStore, StaticSchemaResolver};
pub use schema::PostgresSchemaResolver;
pub use traits::{AssociationStore, BusinessStore, SchemaResolver};

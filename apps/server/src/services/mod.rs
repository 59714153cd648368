//! Business logic layer
//!
//! Services validate caller input, apply business rules and coordinate the
//! schema resolver and stores.

pub mod association_guard;
pub mod business;

pub use association_guard::AssociationGuard;
pub use business::{BusinessService, SearchPolicy};

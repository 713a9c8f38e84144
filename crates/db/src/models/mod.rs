//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` entity structs matching the database rows
//! - `Deserialize` input DTOs for create and replace requests
//! - Flat response projections; no entity carries a reference back to its
//!   parent, only the foreign key

pub mod movie;
pub mod person;

//! Domain building blocks shared by the store and HTTP layers.
//!
//! Nothing in this crate touches the database or the network.

pub mod catalog_import;
pub mod error;
pub mod movie;
pub mod pagination;
pub mod text;
pub mod types;

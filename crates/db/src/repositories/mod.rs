//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Multi-statement writes run
//! inside a single transaction.

pub mod movie_repo;
pub mod person_repo;

pub use movie_repo::{MovieRepo, ReplaceOutcome};
pub use person_repo::PersonRepo;

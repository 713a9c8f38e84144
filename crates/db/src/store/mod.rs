//! Store gateway: the seam between the API services and persistence.
//!
//! Services receive a `&dyn MovieStore` / `&dyn PersonStore` handle and
//! never talk to a connection pool directly. Two backends implement the
//! traits:
//!
//! - [`pg::PgStore`] delegates to the Postgres repositories.
//! - [`memory::MemoryStore`] keeps all tables in process memory.
//!
//! Every multi-step write is atomic on both backends: either all of it is
//! visible afterwards or none of it is.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use marquee_core::catalog_import::ImportedMovie;
use marquee_core::pagination::PageRequest;
use marquee_core::types::DbId;

use crate::models::movie::{ImportSummary, MovieDto, MovieFilter, MovieInput, MovieSummary};
use crate::models::person::{Person, PersonInput};

/// PostgreSQL `serialization_failure`.
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";

/// PostgreSQL `deadlock_detected`.
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";

/// PostgreSQL `character_not_in_repertoire`, raised for NUL in text.
const SQLSTATE_CHARACTER_NOT_IN_REPERTOIRE: &str = "22021";

/// PostgreSQL `foreign_key_violation`.
const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The row changed concurrently; the write was not applied.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation was aborted and rolled back; retrying is safe.
    #[error("Transient store failure: {0}")]
    Transient(String),

    /// The database refused a value the caller supplied.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Any other database error.
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(SQLSTATE_SERIALIZATION_FAILURE | SQLSTATE_DEADLOCK_DETECTED) => {
                    return StoreError::Transient(db_err.message().to_string());
                }
                Some(SQLSTATE_CHARACTER_NOT_IN_REPERTOIRE) => {
                    return StoreError::InvalidInput(db_err.message().to_string());
                }
                // The parent row vanished under a concurrent delete.
                Some(SQLSTATE_FOREIGN_KEY_VIOLATION) => {
                    return StoreError::Conflict("Referenced row no longer exists".to_string());
                }
                _ => {}
            }
        }
        if matches!(err, sqlx::Error::PoolTimedOut) {
            return StoreError::Transient(
                "timed out waiting for a database connection".to_string(),
            );
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations for movies and their actors and ratings.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// One page of movies matching `filter` (ordered by id) and the total
    /// number of matches.
    async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<MovieSummary>, i64)>;

    /// A movie with all of its children, or `None`.
    async fn find_movie(&self, id: DbId) -> StoreResult<Option<MovieDto>>;

    /// Insert a movie and its children atomically.
    async fn create_movie(&self, input: &MovieInput) -> StoreResult<MovieDto>;

    /// Replace a movie's fields and children atomically.
    ///
    /// `Ok(None)` if the movie does not exist; [`StoreError::Conflict`] if
    /// the version check failed.
    async fn replace_movie(&self, id: DbId, input: &MovieInput) -> StoreResult<Option<MovieDto>>;

    /// Delete a movie and its children atomically. `false` if it did not exist.
    async fn delete_movie(&self, id: DbId) -> StoreResult<bool>;

    /// Drop every movie and actor and insert `movies` in their place, all
    /// in one transaction.
    async fn replace_catalog(&self, movies: &[ImportedMovie]) -> StoreResult<ImportSummary>;

    /// Verify the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;
}

/// Persistence operations for the standalone person registry.
#[async_trait]
pub trait PersonStore: Send + Sync {
    async fn create_person(&self, input: &PersonInput) -> StoreResult<Person>;

    async fn find_person(&self, id: DbId) -> StoreResult<Option<Person>>;

    /// All persons ordered by id.
    async fn list_persons(&self) -> StoreResult<Vec<Person>>;

    /// Full replace of a person's fields. `None` if it does not exist.
    async fn update_person(&self, id: DbId, input: &PersonInput) -> StoreResult<Option<Person>>;

    /// Delete a person, returning the removed row. `None` if it did not exist.
    async fn delete_person(&self, id: DbId) -> StoreResult<Option<Person>>;
}

//! Postgres-backed store gateway.

use async_trait::async_trait;
use marquee_core::catalog_import::ImportedMovie;
use marquee_core::pagination::PageRequest;
use marquee_core::types::DbId;

use crate::models::movie::{ImportSummary, MovieDto, MovieFilter, MovieInput, MovieSummary};
use crate::models::person::{Person, PersonInput};
use crate::repositories::{MovieRepo, PersonRepo, ReplaceOutcome};
use crate::store::{MovieStore, PersonStore, StoreError, StoreResult};
use crate::DbPool;

/// Store gateway over a Postgres connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieStore for PgStore {
    async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<MovieSummary>, i64)> {
        Ok(MovieRepo::list(&self.pool, filter, page).await?)
    }

    async fn find_movie(&self, id: DbId) -> StoreResult<Option<MovieDto>> {
        Ok(MovieRepo::find_with_children(&self.pool, id).await?)
    }

    async fn create_movie(&self, input: &MovieInput) -> StoreResult<MovieDto> {
        Ok(MovieRepo::create(&self.pool, input).await?)
    }

    async fn replace_movie(&self, id: DbId, input: &MovieInput) -> StoreResult<Option<MovieDto>> {
        match MovieRepo::replace(&self.pool, id, input).await? {
            ReplaceOutcome::Replaced(dto) => Ok(Some(dto)),
            ReplaceOutcome::NotFound => Ok(None),
            ReplaceOutcome::VersionMismatch => Err(StoreError::Conflict(format!(
                "Movie {id} was modified concurrently"
            ))),
        }
    }

    async fn delete_movie(&self, id: DbId) -> StoreResult<bool> {
        Ok(MovieRepo::delete(&self.pool, id).await?)
    }

    async fn replace_catalog(&self, movies: &[ImportedMovie]) -> StoreResult<ImportSummary> {
        Ok(MovieRepo::replace_catalog(&self.pool, movies).await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

#[async_trait]
impl PersonStore for PgStore {
    async fn create_person(&self, input: &PersonInput) -> StoreResult<Person> {
        Ok(PersonRepo::create(&self.pool, input).await?)
    }

    async fn find_person(&self, id: DbId) -> StoreResult<Option<Person>> {
        Ok(PersonRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_persons(&self) -> StoreResult<Vec<Person>> {
        Ok(PersonRepo::list(&self.pool).await?)
    }

    async fn update_person(&self, id: DbId, input: &PersonInput) -> StoreResult<Option<Person>> {
        Ok(PersonRepo::update(&self.pool, id, input).await?)
    }

    async fn delete_person(&self, id: DbId) -> StoreResult<Option<Person>> {
        Ok(PersonRepo::delete(&self.pool, id).await?)
    }
}

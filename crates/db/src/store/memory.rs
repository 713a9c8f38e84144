//! In-process store gateway.
//!
//! Tables live behind one `RwLock`. A write clones the tables, applies the
//! whole operation to the copy and swaps it in only if every step
//! succeeded, so readers observe either the old or the new state. Used for
//! `STORE_BACKEND=memory` and throughout the service and HTTP tests.
//!
//! The copy makes each write O(total rows) and writes are serialized, so
//! this backend is not meant for large catalogs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use marquee_core::catalog_import::ImportedMovie;
use marquee_core::movie::{average_rating, contains_ignore_case, join_actor_names};
use marquee_core::pagination::PageRequest;
use marquee_core::types::DbId;
use tokio::sync::RwLock;

use crate::models::movie::{
    Actor, ImportSummary, Movie, MovieDto, MovieFilter, MovieInput, MovieSummary, Rating,
};
use crate::models::person::{Person, PersonInput};
use crate::store::{MovieStore, PersonStore, StoreError, StoreResult};

/// Marker for "no injected failure".
const NO_FAILURE: usize = usize::MAX;

#[derive(Debug, Clone, Default)]
struct Sequences {
    movie: DbId,
    actor: DbId,
    rating: DbId,
    person: DbId,
}

fn next_id(seq: &mut DbId) -> DbId {
    *seq += 1;
    *seq
}

#[derive(Debug, Clone, Default)]
struct Tables {
    movies: BTreeMap<DbId, Movie>,
    actors: BTreeMap<DbId, Actor>,
    ratings: BTreeMap<DbId, Rating>,
    persons: BTreeMap<DbId, Person>,
    seq: Sequences,
}

impl Tables {
    fn insert_movie(&mut self, title: &str, release_date: NaiveDate) -> Movie {
        let now = Utc::now();
        let movie = Movie {
            id: next_id(&mut self.seq.movie),
            title: title.to_string(),
            release_date,
            version: 1,
            created_at: now,
            updated_at: now,
        };
        self.movies.insert(movie.id, movie.clone());
        movie
    }

    fn insert_actor(&mut self, movie_id: DbId, name: &str) -> Actor {
        let actor = Actor {
            id: next_id(&mut self.seq.actor),
            name: name.to_string(),
            movie_id,
        };
        self.actors.insert(actor.id, actor.clone());
        actor
    }

    fn insert_rating(&mut self, movie_id: DbId, stars: i32) -> Rating {
        let rating = Rating {
            id: next_id(&mut self.seq.rating),
            stars,
            movie_id,
        };
        self.ratings.insert(rating.id, rating.clone());
        rating
    }

    fn insert_children(&mut self, movie_id: DbId, input: &MovieInput) -> (Vec<Actor>, Vec<Rating>) {
        let actors = input
            .actors
            .iter()
            .map(|a| self.insert_actor(movie_id, &a.name))
            .collect();
        let ratings = input
            .ratings
            .iter()
            .map(|r| self.insert_rating(movie_id, r.stars))
            .collect();
        (actors, ratings)
    }

    fn actors_of(&self, movie_id: DbId) -> Vec<Actor> {
        self.actors
            .values()
            .filter(|a| a.movie_id == movie_id)
            .cloned()
            .collect()
    }

    fn ratings_of(&self, movie_id: DbId) -> Vec<Rating> {
        self.ratings
            .values()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect()
    }

    fn delete_children(&mut self, movie_id: DbId) {
        self.actors.retain(|_, a| a.movie_id != movie_id);
        self.ratings.retain(|_, r| r.movie_id != movie_id);
    }

    fn matches(&self, movie: &Movie, filter: &MovieFilter) -> bool {
        if let Some(ref title) = filter.title {
            if !contains_ignore_case(&movie.title, title) {
                return false;
            }
        }
        if let Some(ref actor_name) = filter.actor_name {
            let any_actor = self
                .actors
                .values()
                .any(|a| a.movie_id == movie.id && contains_ignore_case(&a.name, actor_name));
            if !any_actor {
                return false;
            }
        }
        if let Some(year) = filter.release_year {
            if movie.release_date.year() != year {
                return false;
            }
        }
        if let Some(min_rating) = filter.min_rating {
            let any_rating = self
                .ratings
                .values()
                .any(|r| r.movie_id == movie.id && r.stars >= min_rating);
            if !any_rating {
                return false;
            }
        }
        true
    }

    fn summarize(&self, movie: &Movie) -> MovieSummary {
        let actors = self.actors_of(movie.id);
        let stars: Vec<i32> = self.ratings_of(movie.id).iter().map(|r| r.stars).collect();
        MovieSummary {
            id: movie.id,
            title: movie.title.clone(),
            release_date: movie.release_date,
            actors: join_actor_names(actors.iter().map(|a| a.name.as_str())),
            average_rating: average_rating(&stars),
        }
    }
}

/// Store gateway keeping every table in memory.
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_after_movie_inserts: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            fail_after_movie_inserts: AtomicUsize::new(NO_FAILURE),
        }
    }

    /// Make any write that inserts more than `inserts` movies abort with
    /// [`StoreError::Transient`] once that many rows have been staged.
    pub fn fail_after_movie_inserts(&self, inserts: usize) {
        self.fail_after_movie_inserts
            .store(inserts, Ordering::SeqCst);
    }

    /// Remove a failure installed with [`Self::fail_after_movie_inserts`].
    pub fn clear_injected_failure(&self) {
        self.fail_after_movie_inserts
            .store(NO_FAILURE, Ordering::SeqCst);
    }

    pub async fn movie_count(&self) -> usize {
        self.tables.read().await.movies.len()
    }

    pub async fn actor_count(&self) -> usize {
        self.tables.read().await.actors.len()
    }

    pub async fn rating_count(&self) -> usize {
        self.tables.read().await.ratings.len()
    }

    /// Run `op` against a copy of the tables and publish the copy only if
    /// `op` succeeds.
    async fn write<T>(&self, op: impl FnOnce(&mut Tables) -> StoreResult<T>) -> StoreResult<T> {
        let mut live = self.tables.write().await;
        let mut draft = live.clone();
        let out = op(&mut draft)?;
        *live = draft;
        Ok(out)
    }

    fn check_insert_budget(&self, already_inserted: usize) -> StoreResult<()> {
        let budget = self.fail_after_movie_inserts.load(Ordering::SeqCst);
        if already_inserted >= budget {
            return Err(StoreError::Transient(format!(
                "injected failure after {already_inserted} movie inserts"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MovieStore for MemoryStore {
    async fn list_movies(
        &self,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> StoreResult<(Vec<MovieSummary>, i64)> {
        let tables = self.tables.read().await;
        let matching: Vec<&Movie> = tables
            .movies
            .values()
            .filter(|m| tables.matches(m, filter))
            .collect();

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);

        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|m| tables.summarize(m))
            .collect();
        Ok((items, total))
    }

    async fn find_movie(&self, id: DbId) -> StoreResult<Option<MovieDto>> {
        let tables = self.tables.read().await;
        Ok(tables.movies.get(&id).map(|movie| {
            MovieDto::from_parts(movie.clone(), tables.actors_of(id), tables.ratings_of(id))
        }))
    }

    async fn create_movie(&self, input: &MovieInput) -> StoreResult<MovieDto> {
        self.check_insert_budget(0)?;
        self.write(|t| {
            let movie = t.insert_movie(&input.title, input.release_date);
            let (actors, ratings) = t.insert_children(movie.id, input);
            Ok(MovieDto::from_parts(movie, actors, ratings))
        })
        .await
    }

    async fn replace_movie(&self, id: DbId, input: &MovieInput) -> StoreResult<Option<MovieDto>> {
        self.write(|t| {
            let Some(current) = t.movies.get(&id).cloned() else {
                return Ok(None);
            };
            if input.version.is_some_and(|v| v != current.version) {
                return Err(StoreError::Conflict(format!(
                    "Movie {id} was modified concurrently"
                )));
            }

            t.delete_children(id);
            let movie = Movie {
                title: input.title.clone(),
                release_date: input.release_date,
                version: current.version + 1,
                updated_at: Utc::now(),
                ..current
            };
            t.movies.insert(id, movie.clone());
            let (actors, ratings) = t.insert_children(id, input);
            Ok(Some(MovieDto::from_parts(movie, actors, ratings)))
        })
        .await
    }

    async fn delete_movie(&self, id: DbId) -> StoreResult<bool> {
        self.write(|t| {
            t.delete_children(id);
            Ok(t.movies.remove(&id).is_some())
        })
        .await
    }

    async fn replace_catalog(&self, movies: &[ImportedMovie]) -> StoreResult<ImportSummary> {
        self.write(|t| {
            t.actors.clear();
            // Ratings follow their movies, like the FK cascade.
            t.ratings.clear();
            t.movies.clear();

            let mut actors_imported = 0;
            for (inserted, imported) in movies.iter().enumerate() {
                self.check_insert_budget(inserted)?;
                let movie = t.insert_movie(&imported.title, imported.release_date);
                for name in &imported.actor_names {
                    t.insert_actor(movie.id, name);
                    actors_imported += 1;
                }
            }

            Ok(ImportSummary {
                movies_imported: movies.len(),
                actors_imported,
            })
        })
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl PersonStore for MemoryStore {
    async fn create_person(&self, input: &PersonInput) -> StoreResult<Person> {
        self.write(|t| {
            let now = Utc::now();
            let person = Person {
                id: next_id(&mut t.seq.person),
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                email: input.email.clone(),
                created_at: now,
                updated_at: now,
            };
            t.persons.insert(person.id, person.clone());
            Ok(person)
        })
        .await
    }

    async fn find_person(&self, id: DbId) -> StoreResult<Option<Person>> {
        Ok(self.tables.read().await.persons.get(&id).cloned())
    }

    async fn list_persons(&self) -> StoreResult<Vec<Person>> {
        Ok(self.tables.read().await.persons.values().cloned().collect())
    }

    async fn update_person(&self, id: DbId, input: &PersonInput) -> StoreResult<Option<Person>> {
        self.write(|t| {
            let Some(person) = t.persons.get_mut(&id) else {
                return Ok(None);
            };
            person.first_name = input.first_name.clone();
            person.last_name = input.last_name.clone();
            person.email = input.email.clone();
            person.updated_at = Utc::now();
            Ok(Some(person.clone()))
        })
        .await
    }

    async fn delete_person(&self, id: DbId) -> StoreResult<Option<Person>> {
        self.write(|t| Ok(t.persons.remove(&id))).await
    }
}

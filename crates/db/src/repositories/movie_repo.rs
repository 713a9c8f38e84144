//! Repository for the `movies`, `actors` and `ratings` tables.
//!
//! Actors and ratings are owned by a movie and are only ever written
//! together with it, so they have no repository of their own.

use marquee_core::catalog_import::ImportedMovie;
use marquee_core::pagination::PageRequest;
use marquee_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::movie::{
    Actor, ActorInput, ImportSummary, Movie, MovieDto, MovieFilter, MovieInput, MovieSummary,
    Rating, RatingInput,
};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Column list for `movies` SELECT queries.
const COLUMNS: &str = "id, title, release_date, version, created_at, updated_at";

/// Column list for `actors` SELECT queries.
const ACTOR_COLUMNS: &str = "id, name, movie_id";

/// Column list for `ratings` SELECT queries.
const RATING_COLUMNS: &str = "id, stars, movie_id";

/// Projection for the paginated listing. Expects `movies` aliased as `m`.
const SUMMARY_COLUMNS: &str = "\
    m.id, m.title, m.release_date, \
    COALESCE((SELECT string_agg(a.name, ', ' ORDER BY a.id) \
              FROM actors a WHERE a.movie_id = m.id), '') AS actors, \
    COALESCE((SELECT AVG(r.stars)::FLOAT8 \
              FROM ratings r WHERE r.movie_id = m.id), 0)::FLOAT8 AS average_rating";

/// Read-only snapshot so multi-query reads see one consistent state.
const READ_SNAPSHOT: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

/// Outcome of [`MovieRepo::replace`].
#[derive(Debug)]
pub enum ReplaceOutcome {
    Replaced(MovieDto),
    /// No movie with the requested id exists.
    NotFound,
    /// The row changed or vanished between the read and the version-checked
    /// write. Nothing was written.
    VersionMismatch,
}

// ---------------------------------------------------------------------------
// MovieRepo
// ---------------------------------------------------------------------------

/// Provides CRUD, filtered listing and bulk replacement for movies.
pub struct MovieRepo;

impl MovieRepo {
    /// List one page of movies matching `filter`, ordered by id.
    ///
    /// Returns the page items together with the total number of matching
    /// movies. Both are read from the same snapshot.
    pub async fn list(
        pool: &PgPool,
        filter: &MovieFilter,
        page: PageRequest,
    ) -> Result<(Vec<MovieSummary>, i64), sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_movie_filter(filter);

        let count_query = format!("SELECT COUNT(*)::BIGINT FROM movies m {where_clause}");
        let page_query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM movies m {where_clause} \
             ORDER BY m.id \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut tx = pool.begin().await?;
        sqlx::query(READ_SNAPSHOT).execute(&mut *tx).await?;

        let total =
            bind_filter_values_scalar(sqlx::query_scalar::<_, i64>(&count_query), &bind_values)
                .fetch_one(&mut *tx)
                .await?;

        let items =
            bind_filter_values(sqlx::query_as::<_, MovieSummary>(&page_query), &bind_values)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&mut *tx)
                .await?;

        tx.commit().await?;
        Ok((items, total))
    }

    /// Find a movie with all of its actors and ratings.
    pub async fn find_with_children(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<MovieDto>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(READ_SNAPSHOT).execute(&mut *tx).await?;
        let dto = Self::load_with_children(&mut tx, id).await?;
        tx.commit().await?;
        Ok(dto)
    }

    /// List a movie's actors ordered by id.
    pub async fn list_actors(
        conn: &mut PgConnection,
        movie_id: DbId,
    ) -> Result<Vec<Actor>, sqlx::Error> {
        let query = format!("SELECT {ACTOR_COLUMNS} FROM actors WHERE movie_id = $1 ORDER BY id");
        sqlx::query_as::<_, Actor>(&query)
            .bind(movie_id)
            .fetch_all(conn)
            .await
    }

    /// List a movie's ratings ordered by id.
    pub async fn list_ratings(
        conn: &mut PgConnection,
        movie_id: DbId,
    ) -> Result<Vec<Rating>, sqlx::Error> {
        let query = format!("SELECT {RATING_COLUMNS} FROM ratings WHERE movie_id = $1 ORDER BY id");
        sqlx::query_as::<_, Rating>(&query)
            .bind(movie_id)
            .fetch_all(conn)
            .await
    }

    /// Insert a movie together with its actors and ratings in one
    /// transaction, returning the persisted rows with their new ids.
    pub async fn create(pool: &PgPool, input: &MovieInput) -> Result<MovieDto, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO movies (title, release_date)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let movie = sqlx::query_as::<_, Movie>(&insert_query)
            .bind(&input.title)
            .bind(input.release_date)
            .fetch_one(&mut *tx)
            .await?;

        let actors = Self::insert_actors(&mut tx, movie.id, &input.actors).await?;
        let ratings = Self::insert_ratings(&mut tx, movie.id, &input.ratings).await?;

        tx.commit().await?;
        Ok(MovieDto::from_parts(movie, actors, ratings))
    }

    /// Replace a movie's scalar fields and all of its children.
    ///
    /// Existing actors and ratings are deleted and the supplied ones
    /// inserted; nothing is merged. The update is guarded by the movie's
    /// `version`: `input.version` when given, otherwise the version read at
    /// the start of the transaction.
    pub async fn replace(
        pool: &PgPool,
        id: DbId,
        input: &MovieInput,
    ) -> Result<ReplaceOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<i32> = sqlx::query_scalar("SELECT version FROM movies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(current) = current else {
            return Ok(ReplaceOutcome::NotFound);
        };
        let expected = input.version.unwrap_or(current);

        Self::delete_children(&mut tx, id).await?;

        let update_query = format!(
            "UPDATE movies SET
                title = $2,
                release_date = $3,
                version = version + 1,
                updated_at = NOW()
             WHERE id = $1 AND version = $4
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Movie>(&update_query)
            .bind(id)
            .bind(&input.title)
            .bind(input.release_date)
            .bind(expected)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(movie) = updated else {
            // Dropping `tx` rolls back the child deletes.
            return Ok(ReplaceOutcome::VersionMismatch);
        };

        let actors = Self::insert_actors(&mut tx, id, &input.actors).await?;
        let ratings = Self::insert_ratings(&mut tx, id, &input.ratings).await?;

        tx.commit().await?;
        Ok(ReplaceOutcome::Replaced(MovieDto::from_parts(
            movie, actors, ratings,
        )))
    }

    /// Delete a movie and its children. Returns `true` if the movie existed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::delete_children(&mut tx, id).await?;
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the whole catalog with `movies` in one transaction.
    ///
    /// Deletes every actor, then every movie (ratings go with their movie
    /// through `ON DELETE CASCADE`), then inserts the new movies with their
    /// actors. Any error rolls everything back.
    pub async fn replace_catalog(
        pool: &PgPool,
        movies: &[ImportedMovie],
    ) -> Result<ImportSummary, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let actors_deleted = sqlx::query("DELETE FROM actors")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let movies_deleted = sqlx::query("DELETE FROM movies")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tracing::debug!(movies_deleted, actors_deleted, "Cleared movie catalog");

        let mut actors_imported = 0;
        for imported in movies {
            let movie_id: DbId = sqlx::query_scalar(
                "INSERT INTO movies (title, release_date) VALUES ($1, $2) RETURNING id",
            )
            .bind(&imported.title)
            .bind(imported.release_date)
            .fetch_one(&mut *tx)
            .await?;

            let actors = Self::insert_actor_names(&mut tx, movie_id, &imported.actor_names).await?;
            actors_imported += actors.len();
        }

        tx.commit().await?;
        Ok(ImportSummary {
            movies_imported: movies.len(),
            actors_imported,
        })
    }

    // -----------------------------------------------------------------------
    // Transaction-scoped helpers
    // -----------------------------------------------------------------------

    async fn load_with_children(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<MovieDto>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE id = $1");
        let Some(movie) = sqlx::query_as::<_, Movie>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let actors = Self::list_actors(&mut *conn, id).await?;
        let ratings = Self::list_ratings(&mut *conn, id).await?;
        Ok(Some(MovieDto::from_parts(movie, actors, ratings)))
    }

    async fn delete_children(conn: &mut PgConnection, movie_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM actors WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM ratings WHERE movie_id = $1")
            .bind(movie_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn insert_actors(
        conn: &mut PgConnection,
        movie_id: DbId,
        actors: &[ActorInput],
    ) -> Result<Vec<Actor>, sqlx::Error> {
        let names: Vec<String> = actors.iter().map(|a| a.name.clone()).collect();
        Self::insert_actor_names(conn, movie_id, &names).await
    }

    /// Insert actors in input order using a single `UNNEST` statement.
    async fn insert_actor_names(
        conn: &mut PgConnection,
        movie_id: DbId,
        names: &[String],
    ) -> Result<Vec<Actor>, sqlx::Error> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "INSERT INTO actors (movie_id, name)
             SELECT $1, t.name FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t(name, ord)
             ORDER BY t.ord
             RETURNING {ACTOR_COLUMNS}"
        );
        let mut rows = sqlx::query_as::<_, Actor>(&query)
            .bind(movie_id)
            .bind(names)
            .fetch_all(conn)
            .await?;
        rows.sort_by_key(|a| a.id);
        Ok(rows)
    }

    /// Insert ratings in input order using a single `UNNEST` statement.
    async fn insert_ratings(
        conn: &mut PgConnection,
        movie_id: DbId,
        ratings: &[RatingInput],
    ) -> Result<Vec<Rating>, sqlx::Error> {
        if ratings.is_empty() {
            return Ok(Vec::new());
        }
        let stars: Vec<i32> = ratings.iter().map(|r| r.stars).collect();
        let query = format!(
            "INSERT INTO ratings (movie_id, stars)
             SELECT $1, t.stars FROM UNNEST($2::INT4[]) WITH ORDINALITY AS t(stars, ord)
             ORDER BY t.ord
             RETURNING {RATING_COLUMNS}"
        );
        let mut rows = sqlx::query_as::<_, Rating>(&query)
            .bind(movie_id)
            .bind(&stars)
            .fetch_all(conn)
            .await?;
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built movie listing queries.
enum BindValue {
    Int(i32),
    Text(String),
}

/// Build a WHERE clause and bind values from `MovieFilter`.
///
/// Returns `(where_clause, bind_values, next_bind_index)`.
/// The `where_clause` is empty if no filters are active, or starts with `WHERE `.
/// Text filters use `strpos` so `%` and `_` in user input match literally.
fn build_movie_filter(filter: &MovieFilter) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(ref title) = filter.title {
        conditions.push(format!("strpos(lower(m.title), lower(${bind_idx})) > 0"));
        bind_idx += 1;
        bind_values.push(BindValue::Text(title.clone()));
    }

    if let Some(ref actor_name) = filter.actor_name {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM actors a \
             WHERE a.movie_id = m.id AND strpos(lower(a.name), lower(${bind_idx})) > 0)"
        ));
        bind_idx += 1;
        bind_values.push(BindValue::Text(actor_name.clone()));
    }

    if let Some(year) = filter.release_year {
        conditions.push(format!(
            "EXTRACT(YEAR FROM m.release_date)::INT4 = ${bind_idx}"
        ));
        bind_idx += 1;
        bind_values.push(BindValue::Int(year));
    }

    if let Some(min_rating) = filter.min_rating {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM ratings r \
             WHERE r.movie_id = m.id AND r.stars >= ${bind_idx})"
        ));
        bind_idx += 1;
        bind_values.push(BindValue::Int(min_rating));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_filter_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Int(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_filter_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::Int(v) => q = q.bind(*v),
            BindValue::Text(v) => q = q.bind(v.as_str()),
        }
    }
    q
}

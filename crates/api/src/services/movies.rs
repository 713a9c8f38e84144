//! Movie catalog service: filtered listing, CRUD with children and the
//! bulk catalog import.

use marquee_core::catalog_import::parse_catalog;
use marquee_core::error::CoreError;
use marquee_core::movie::{validate_actor_name, validate_title};
use marquee_core::pagination::PageRequest;
use marquee_core::text::ensure_storable;
use marquee_core::types::DbId;
use marquee_db::models::movie::{ImportSummary, MovieDto, MovieFilter, MovieInput, MoviePage};
use marquee_db::{MovieStore, StoreError};

use super::ensure_body_id;
use crate::error::{AppError, AppResult};

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Movie", id })
}

/// Title and actor-name rules shared by create and replace.
fn validate_input(input: &MovieInput) -> AppResult<()> {
    validate_title(&input.title)?;
    for actor in &input.actors {
        validate_actor_name(&actor.name)?;
    }
    Ok(())
}

/// One page of movies matching every supplied filter.
pub async fn list_movies(
    store: &dyn MovieStore,
    filter: MovieFilter,
    page: PageRequest,
) -> AppResult<MoviePage> {
    let filter = filter.normalized();
    if let Some(title) = &filter.title {
        ensure_storable("Title filter", title)?;
    }
    if let Some(actor_name) = &filter.actor_name {
        ensure_storable("Actor name filter", actor_name)?;
    }
    let (data, total_count) = store.list_movies(&filter, page).await?;
    Ok(MoviePage {
        total_pages: page.total_pages(total_count),
        data,
    })
}

pub async fn get_movie(store: &dyn MovieStore, id: DbId) -> AppResult<MovieDto> {
    store.find_movie(id).await?.ok_or_else(|| not_found(id))
}

/// Create a movie with its actors and ratings, returning the persisted
/// representation with store-assigned ids.
pub async fn create_movie(store: &dyn MovieStore, input: &MovieInput) -> AppResult<MovieDto> {
    validate_input(input)?;
    let movie = store.create_movie(input).await?;
    tracing::info!(
        movie_id = movie.id,
        actors = movie.actors.len(),
        ratings = movie.ratings.len(),
        "Movie created",
    );
    Ok(movie)
}

/// Replace a movie's fields and children.
///
/// The body must carry the path id; a missing id counts as a mismatch.
/// A concurrent-modification error from the store is re-checked against
/// existence: a movie deleted in the meantime is reported as not found,
/// anything else as a conflict.
pub async fn replace_movie(
    store: &dyn MovieStore,
    id: DbId,
    input: &MovieInput,
) -> AppResult<MovieDto> {
    ensure_body_id(input.id, id)?;
    validate_input(input)?;

    match store.replace_movie(id, input).await {
        Ok(Some(movie)) => {
            tracing::info!(movie_id = id, version = movie.version, "Movie replaced");
            Ok(movie)
        }
        Ok(None) => Err(not_found(id)),
        Err(StoreError::Conflict(msg)) => {
            if store.find_movie(id).await?.is_none() {
                return Err(not_found(id));
            }
            tracing::warn!(movie_id = id, "Concurrent modification while replacing movie");
            Err(AppError::Core(CoreError::Conflict(msg)))
        }
        Err(err) => Err(err.into()),
    }
}

/// Delete a movie together with its actors and ratings.
pub async fn delete_movie(store: &dyn MovieStore, id: DbId) -> AppResult<()> {
    if store.delete_movie(id).await? {
        tracing::info!(movie_id = id, "Movie deleted");
        Ok(())
    } else {
        Err(not_found(id))
    }
}

/// Replace the whole catalog with the records of a CSV source.
///
/// The source is parsed completely before the store is touched; the store
/// then swaps the catalog in one transaction. Failures are returned to the
/// caller after the rollback.
pub async fn import_catalog(store: &dyn MovieStore, source: &[u8]) -> AppResult<ImportSummary> {
    let movies = parse_catalog(source)?;

    match store.replace_catalog(&movies).await {
        Ok(summary) => {
            tracing::info!(
                movies = summary.movies_imported,
                actors = summary.actors_imported,
                "Movie catalog imported",
            );
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(error = %err, records = movies.len(), "Movie catalog import rolled back");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use marquee_core::catalog_import::ImportedMovie;
    use marquee_db::models::movie::{ActorInput, MovieSummary, RatingInput};
    use marquee_db::{MemoryStore, StoreResult};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn movie(title: &str, release_date: NaiveDate, actors: &[&str], stars: &[i32]) -> MovieInput {
        MovieInput {
            id: None,
            title: title.to_string(),
            release_date,
            version: None,
            actors: actors
                .iter()
                .map(|n| ActorInput {
                    name: n.to_string(),
                })
                .collect(),
            ratings: stars.iter().map(|&s| RatingInput { stars: s }).collect(),
        }
    }

    fn with_id(mut input: MovieInput, id: DbId) -> MovieInput {
        input.id = Some(id);
        input
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for input in [
            movie("Inception", date(2010, 7, 16), &["Leonardo DiCaprio", "Tom Hardy"], &[3, 5]),
            movie("Up", date(2009, 5, 29), &["Ed Asner"], &[]),
            movie("The Dark Knight", date(2008, 7, 18), &["Christian Bale", "Heath Ledger"], &[2]),
            movie("Dark Waters", date(2019, 11, 22), &["Mark Ruffalo"], &[4]),
            movie("Revolutionary Road", date(2008, 12, 26), &["Leonardo DiCaprio"], &[5, 1]),
        ] {
            create_movie(&store, &input).await.unwrap();
        }
        store
    }

    fn titles(page: &MoviePage) -> Vec<&str> {
        page.data.iter().map(|m| m.title.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_filter_returns_everything_in_id_order() {
        let store = seeded().await;
        let page = list_movies(&store, MovieFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(
            titles(&page),
            vec!["Inception", "Up", "The Dark Knight", "Dark Waters", "Revolutionary Road"]
        );
    }

    #[tokio::test]
    async fn summaries_carry_joined_actors_and_average() {
        let store = seeded().await;
        let page = list_movies(&store, MovieFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.data[0].actors, "Leonardo DiCaprio, Tom Hardy");
        assert_eq!(page.data[0].average_rating, 4.0);
        assert_eq!(page.data[1].average_rating, 0.0);
        assert_eq!(page.data[4].average_rating, 3.0);
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let store = seeded().await;

        let filter = MovieFilter {
            title: Some("dark".into()),
            ..MovieFilter::default()
        };
        let page = list_movies(&store, filter, PageRequest::default()).await.unwrap();
        assert_eq!(titles(&page), vec!["The Dark Knight", "Dark Waters"]);

        let filter = MovieFilter {
            title: Some("dark".into()),
            release_year: Some(2008),
            ..MovieFilter::default()
        };
        let page = list_movies(&store, filter, PageRequest::default()).await.unwrap();
        assert_eq!(titles(&page), vec!["The Dark Knight"]);

        let filter = MovieFilter {
            actor_name: Some("dicaprio".into()),
            release_year: Some(2008),
            ..MovieFilter::default()
        };
        let page = list_movies(&store, filter, PageRequest::default()).await.unwrap();
        assert_eq!(titles(&page), vec!["Revolutionary Road"]);
    }

    #[tokio::test]
    async fn min_rating_matches_any_single_rating() {
        let store = seeded().await;
        let filter = MovieFilter {
            min_rating: Some(5),
            ..MovieFilter::default()
        };
        let page = list_movies(&store, filter, PageRequest::default()).await.unwrap();
        // Revolutionary Road averages 3 but has one 5-star rating.
        assert_eq!(titles(&page), vec!["Inception", "Revolutionary Road"]);
    }

    #[tokio::test]
    async fn blank_text_filters_are_ignored() {
        let store = seeded().await;
        let filter = MovieFilter {
            title: Some("   ".into()),
            actor_name: Some(String::new()),
            ..MovieFilter::default()
        };
        let page = list_movies(&store, filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.data.len(), 5);
    }

    #[tokio::test]
    async fn nul_in_text_filter_is_rejected() {
        let store = seeded().await;
        let filter = MovieFilter {
            actor_name: Some("Tom\0".into()),
            ..MovieFilter::default()
        };
        assert_matches!(
            list_movies(&store, filter, PageRequest::default()).await,
            Err(AppError::Core(CoreError::Validation(msg))) if msg.contains("Actor name filter")
        );
    }

    #[tokio::test]
    async fn pagination_reports_ceiling_of_pages() {
        let store = seeded().await;

        let page = list_movies(
            &store,
            MovieFilter::default(),
            PageRequest::new(Some(2), Some(2)).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(titles(&page), vec!["The Dark Knight", "Dark Waters"]);

        let past_end = list_movies(
            &store,
            MovieFilter::default(),
            PageRequest::new(Some(7), Some(2)).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(past_end.total_pages, 3);
        assert!(past_end.data.is_empty());
    }

    #[tokio::test]
    async fn no_matches_means_zero_pages() {
        let store = seeded().await;
        let filter = MovieFilter {
            release_year: Some(1901),
            ..MovieFilter::default()
        };
        let page = list_movies(&store, filter, PageRequest::default()).await.unwrap();
        assert_eq!(page.total_pages, 0);
        assert!(page.data.is_empty());
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_returns_persisted_ids() {
        let store = MemoryStore::new();
        let mut input = movie("Up", date(2009, 5, 29), &["Ed Asner"], &[4]);
        input.id = Some(99);

        let created = create_movie(&store, &input).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.actors[0].movie_id, 1);
        assert_eq!(get_movie(&store, 1).await.unwrap(), created);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let store = MemoryStore::new();
        let result = create_movie(&store, &movie(" ", date(2009, 5, 29), &[], &[])).await;
        assert_matches!(result, Err(AppError::Core(CoreError::Validation(_))));
        assert_eq!(store.movie_count().await, 0);
    }

    #[tokio::test]
    async fn get_missing_movie_is_not_found() {
        let store = MemoryStore::new();
        assert_matches!(
            get_movie(&store, 42).await,
            Err(AppError::Core(CoreError::NotFound { id: 42, .. }))
        );
    }

    #[tokio::test]
    async fn replace_swaps_children_instead_of_merging() {
        let store = seeded().await;
        let input = with_id(movie("Inception", date(2010, 7, 16), &["Elliot Page"], &[2]), 1);

        replace_movie(&store, 1, &input).await.unwrap();

        let loaded = get_movie(&store, 1).await.unwrap();
        let names: Vec<_> = loaded.actors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Elliot Page"]);
        let stars: Vec<_> = loaded.ratings.iter().map(|r| r.stars).collect();
        assert_eq!(stars, vec![2]);
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn replace_with_mismatched_id_changes_nothing() {
        let store = seeded().await;
        let before = get_movie(&store, 1).await.unwrap();

        let mut input = movie("Hijacked", date(2000, 1, 1), &[], &[]);
        input.id = Some(2);
        assert_matches!(
            replace_movie(&store, 1, &input).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_eq!(get_movie(&store, 1).await.unwrap(), before);
    }

    #[tokio::test]
    async fn replace_without_body_id_changes_nothing() {
        let store = seeded().await;
        let before = get_movie(&store, 1).await.unwrap();

        let input = movie("Anonymous", date(2000, 1, 1), &[], &[]);
        assert_matches!(
            replace_movie(&store, 1, &input).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_eq!(get_movie(&store, 1).await.unwrap(), before);
    }

    #[tokio::test]
    async fn nul_in_title_or_actor_is_rejected_before_the_store() {
        let store = seeded().await;

        let result = create_movie(&store, &movie("Bad\0Title", date(2000, 1, 1), &[], &[])).await;
        assert_matches!(result, Err(AppError::Core(CoreError::Validation(_))));

        let result = create_movie(&store, &movie("Up", date(2009, 5, 29), &["Ed\0Asner"], &[])).await;
        assert_matches!(result, Err(AppError::Core(CoreError::Validation(_))));

        let input = with_id(movie("Inception", date(2010, 7, 16), &["Tom\0Hardy"], &[]), 1);
        assert_matches!(
            replace_movie(&store, 1, &input).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_eq!(store.movie_count().await, 5);
        assert_eq!(get_movie(&store, 1).await.unwrap().actors.len(), 2);
    }

    #[tokio::test]
    async fn replace_missing_movie_is_not_found() {
        let store = MemoryStore::new();
        let input = with_id(movie("Ghost", date(1990, 7, 13), &[], &[]), 5);
        assert_matches!(
            replace_movie(&store, 5, &input).await,
            Err(AppError::Core(CoreError::NotFound { .. }))
        );
    }

    #[tokio::test]
    async fn replace_with_stale_version_is_a_conflict() {
        let store = seeded().await;
        let mut input = with_id(movie("Up", date(2009, 5, 29), &[], &[]), 2);
        input.version = Some(1);
        replace_movie(&store, 2, &input).await.unwrap();

        // Same expected version again: the row is now at version 2.
        assert_matches!(
            replace_movie(&store, 2, &input).await,
            Err(AppError::Core(CoreError::Conflict(_)))
        );
    }

    #[tokio::test]
    async fn delete_removes_movie_and_children() {
        let store = seeded().await;
        let actors_before = store.actor_count().await;
        let ratings_before = store.rating_count().await;

        delete_movie(&store, 1).await.unwrap();

        assert_matches!(
            get_movie(&store, 1).await,
            Err(AppError::Core(CoreError::NotFound { .. }))
        );
        assert_eq!(store.actor_count().await, actors_before - 2);
        assert_eq!(store.rating_count().await, ratings_before - 2);
        assert_matches!(
            delete_movie(&store, 1).await,
            Err(AppError::Core(CoreError::NotFound { .. }))
        );
    }

    /// Store whose replace always reports a conflict and whose movie is
    /// gone by the time it is looked up again.
    struct DeletedDuringReplace;

    #[async_trait]
    impl MovieStore for DeletedDuringReplace {
        async fn list_movies(
            &self,
            _filter: &MovieFilter,
            _page: PageRequest,
        ) -> StoreResult<(Vec<MovieSummary>, i64)> {
            unreachable!("not used by replace")
        }

        async fn find_movie(&self, _id: DbId) -> StoreResult<Option<MovieDto>> {
            Ok(None)
        }

        async fn create_movie(&self, _input: &MovieInput) -> StoreResult<MovieDto> {
            unreachable!("not used by replace")
        }

        async fn replace_movie(
            &self,
            id: DbId,
            _input: &MovieInput,
        ) -> StoreResult<Option<MovieDto>> {
            Err(StoreError::Conflict(format!("Movie {id} was modified concurrently")))
        }

        async fn delete_movie(&self, _id: DbId) -> StoreResult<bool> {
            unreachable!("not used by replace")
        }

        async fn replace_catalog(&self, _movies: &[ImportedMovie]) -> StoreResult<ImportSummary> {
            unreachable!("not used by replace")
        }

        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn conflict_on_vanished_movie_is_not_found() {
        let store = DeletedDuringReplace;
        let input = with_id(movie("Up", date(2009, 5, 29), &[], &[]), 2);

        assert_matches!(
            replace_movie(&store, 2, &input).await,
            Err(AppError::Core(CoreError::NotFound { entity: "Movie", id: 2 }))
        );
    }

    // -----------------------------------------------------------------------
    // Import
    // -----------------------------------------------------------------------

    const TWO_MOVIES: &str = "Title,Release Date,Actors\n\
        Inception,2010-07-16,\"Leonardo DiCaprio, Tom Hardy\"\n\
        Up,2009-05-29,Ed Asner\n";

    #[tokio::test]
    async fn import_rebuilds_the_catalog() {
        let store = seeded().await;

        let summary = import_catalog(&store, TWO_MOVIES.as_bytes()).await.unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                movies_imported: 2,
                actors_imported: 3,
            }
        );

        let page = list_movies(&store, MovieFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(titles(&page), vec!["Inception", "Up"]);
        let inception = get_movie(&store, page.data[0].id).await.unwrap();
        let names: Vec<_> = inception.actors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Leonardo DiCaprio", "Tom Hardy"]);
        let up = get_movie(&store, page.data[1].id).await.unwrap();
        assert_eq!(up.actors.len(), 1);
    }

    #[tokio::test]
    async fn import_into_empty_store_adds_no_ratings() {
        let store = MemoryStore::new();
        import_catalog(&store, TWO_MOVIES.as_bytes()).await.unwrap();
        assert_eq!(store.movie_count().await, 2);
        assert_eq!(store.actor_count().await, 3);
        assert_eq!(store.rating_count().await, 0);
    }

    #[tokio::test]
    async fn malformed_source_leaves_store_untouched() {
        let store = seeded().await;
        let source = "Title,Release Date,Actors\nUp,2009-05-29,Ed Asner\nHeat,whenever,Al Pacino\n";

        assert_matches!(
            import_catalog(&store, source.as_bytes()).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_eq!(store.movie_count().await, 5);
    }

    #[tokio::test]
    async fn mid_import_failure_rolls_back_and_is_reported() {
        let store = seeded().await;
        let actors_before = store.actor_count().await;
        let ratings_before = store.rating_count().await;
        store.fail_after_movie_inserts(1);

        assert_matches!(
            import_catalog(&store, TWO_MOVIES.as_bytes()).await,
            Err(AppError::Store(StoreError::Transient(_)))
        );

        let page = list_movies(&store, MovieFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(store.actor_count().await, actors_before);
        assert_eq!(store.rating_count().await, ratings_before);
    }
}

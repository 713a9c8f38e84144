//! Handlers for the `/movies` resource.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::pagination::PageRequest;
use marquee_core::types::DbId;
use marquee_db::models::movie::{ImportSummary, MovieDto, MovieFilter, MovieInput, MoviePage};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::routes::API_PREFIX;
use crate::services::movies as service;
use crate::state::AppState;

/// Query parameters for `GET /movies`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListParams {
    pub title: Option<String>,
    pub actor_name: Option<String>,
    pub release_year: Option<i32>,
    pub min_rating: Option<i32>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl MovieListParams {
    fn into_parts(self) -> AppResult<(MovieFilter, PageRequest)> {
        let page = PageRequest::new(self.page, self.page_size)?;
        let filter = MovieFilter {
            title: self.title,
            actor_name: self.actor_name,
            release_year: self.release_year,
            min_rating: self.min_rating,
        };
        Ok((filter, page))
    }
}

/// GET /api/v1/movies
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<MovieListParams>,
) -> AppResult<Json<MoviePage>> {
    let (filter, page) = params.into_parts()?;
    let movies = service::list_movies(state.movies.as_ref(), filter, page).await?;
    Ok(Json(movies))
}

/// GET /api/v1/movies/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MovieDto>> {
    let movie = service::get_movie(state.movies.as_ref(), id).await?;
    Ok(Json(movie))
}

/// POST /api/v1/movies
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<MovieInput>,
) -> AppResult<impl IntoResponse> {
    let movie = service::create_movie(state.movies.as_ref(), &input).await?;
    let location = format!("{API_PREFIX}/movies/{}", movie.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(movie)))
}

/// PUT /api/v1/movies/{id}
pub async fn replace(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<MovieInput>,
) -> AppResult<StatusCode> {
    service::replace_movie(state.movies.as_ref(), id, &input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/movies/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    service::delete_movie(state.movies.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/movies/import
///
/// Imports the CSV sent as the request body, or the configured import file
/// when the body is empty.
pub async fn import(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<ImportSummary>> {
    let summary = if body.is_empty() {
        let path = &state.config.import_csv_path;
        let source = tokio::fs::read(path).await.map_err(|e| {
            AppError::InternalError(format!(
                "Failed to read import file {}: {e}",
                path.display()
            ))
        })?;
        service::import_catalog(state.movies.as_ref(), &source).await?
    } else {
        service::import_catalog(state.movies.as_ref(), &body).await?
    };
    Ok(Json(summary))
}

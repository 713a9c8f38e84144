pub mod health;
pub mod movies;
pub mod persons;

use axum::Router;

use crate::state::AppState;

/// Path prefix every API route is nested under.
pub const API_PREFIX: &str = "/api/v1";

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /movies                  list (filtered, paginated), create
/// /movies/import           bulk catalog import (POST)
/// /movies/{id}             get, replace, delete
///
/// /persons                 list, create
/// /persons/{id}            get, update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/movies", movies::router())
        .nest("/persons", persons::router())
}

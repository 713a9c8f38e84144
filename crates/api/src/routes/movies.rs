//! Route definitions for the `/movies` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::movies;
use crate::state::AppState;

/// Routes mounted at `/movies`.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create
/// POST   /import    -> import
/// GET    /{id}      -> get_by_id
/// PUT    /{id}      -> replace
/// DELETE /{id}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(movies::list).post(movies::create))
        .route("/import", post(movies::import))
        .route(
            "/{id}",
            get(movies::get_by_id)
                .put(movies::replace)
                .delete(movies::delete),
        )
}

//! Route definitions for the `/persons` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::persons;
use crate::state::AppState;

/// Routes mounted at `/persons`.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create
/// GET    /{id}      -> get_by_id
/// PUT    /{id}      -> update
/// DELETE /{id}      -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(persons::list).post(persons::create))
        .route(
            "/{id}",
            get(persons::get_by_id)
                .put(persons::update)
                .delete(persons::delete),
        )
}

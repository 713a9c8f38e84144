//! Handlers for the `/persons` resource.

use axum::extract::{Path, State};
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use marquee_core::types::DbId;
use marquee_db::models::person::{Person, PersonInput};

use crate::error::AppResult;
use crate::routes::API_PREFIX;
use crate::services::persons as service;
use crate::state::AppState;

/// POST /api/v1/persons
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<PersonInput>,
) -> AppResult<impl IntoResponse> {
    let person = service::create_person(state.persons.as_ref(), &input).await?;
    let location = format!("{API_PREFIX}/persons/{}", person.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(person)))
}

/// GET /api/v1/persons
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Person>>> {
    let persons = service::list_persons(state.persons.as_ref()).await?;
    Ok(Json(persons))
}

/// GET /api/v1/persons/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Person>> {
    let person = service::get_person(state.persons.as_ref(), id).await?;
    Ok(Json(person))
}

/// PUT /api/v1/persons/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<PersonInput>,
) -> AppResult<Json<Person>> {
    let person = service::update_person(state.persons.as_ref(), id, &input).await?;
    Ok(Json(person))
}

/// DELETE /api/v1/persons/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<Json<Person>> {
    let person = service::delete_person(state.persons.as_ref(), id).await?;
    Ok(Json(person))
}

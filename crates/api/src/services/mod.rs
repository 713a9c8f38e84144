//! Application services.
//!
//! Each function receives the store gateway handle it needs as an explicit
//! argument, applies the domain rules and maps store outcomes to
//! [`AppError`](crate::error::AppError) variants. Handlers stay thin
//! wrappers around these functions.

pub mod movies;
pub mod persons;

use marquee_core::error::CoreError;
use marquee_core::types::DbId;

use crate::error::{AppError, AppResult};

/// Check that a request body names the resource addressed by the path.
pub(crate) fn ensure_body_id(body_id: Option<DbId>, path_id: DbId) -> AppResult<()> {
    match body_id {
        Some(body_id) if body_id == path_id => Ok(()),
        Some(body_id) => Err(AppError::Core(CoreError::Validation(format!(
            "Body id {body_id} does not match path id {path_id}"
        )))),
        None => Err(AppError::Core(CoreError::Validation(format!(
            "Body id is required and must equal path id {path_id}"
        )))),
    }
}

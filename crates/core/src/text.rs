//! Checks for free-text fields before they reach a store.

use crate::error::CoreError;

/// Reject values that a text column cannot hold.
///
/// PostgreSQL `TEXT` refuses the NUL character, so it is rejected up front
/// for every backend. `field` names the value in the error message.
pub fn ensure_storable(field: &str, value: &str) -> Result<(), CoreError> {
    if value.contains('\0') {
        return Err(CoreError::Validation(format!(
            "{field} must not contain NUL characters"
        )));
    }
    Ok(())
}

//! Person registry service.

use marquee_core::error::CoreError;
use marquee_core::text::ensure_storable;
use marquee_core::types::DbId;
use marquee_db::models::person::{Person, PersonInput};
use marquee_db::PersonStore;

use super::ensure_body_id;
use crate::error::{AppError, AppResult};

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Person",
        id,
    })
}

fn validate_input(input: &PersonInput) -> AppResult<()> {
    ensure_storable("First name", &input.first_name)?;
    ensure_storable("Last name", &input.last_name)?;
    if let Some(email) = &input.email {
        ensure_storable("Email", email)?;
    }
    Ok(())
}

pub async fn create_person(store: &dyn PersonStore, input: &PersonInput) -> AppResult<Person> {
    validate_input(input)?;
    let person = store.create_person(input).await?;
    tracing::info!(person_id = person.id, "Person created");
    Ok(person)
}

pub async fn get_person(store: &dyn PersonStore, id: DbId) -> AppResult<Person> {
    store.find_person(id).await?.ok_or_else(|| not_found(id))
}

pub async fn list_persons(store: &dyn PersonStore) -> AppResult<Vec<Person>> {
    Ok(store.list_persons().await?)
}

/// Replace every field of an existing person. The body must carry the
/// path id.
pub async fn update_person(
    store: &dyn PersonStore,
    id: DbId,
    input: &PersonInput,
) -> AppResult<Person> {
    ensure_body_id(input.id, id)?;
    validate_input(input)?;
    store
        .update_person(id, input)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Delete a person, returning the removed record.
pub async fn delete_person(store: &dyn PersonStore, id: DbId) -> AppResult<Person> {
    let person = store.delete_person(id).await?.ok_or_else(|| not_found(id))?;
    tracing::info!(person_id = id, "Person deleted");
    Ok(person)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use marquee_db::MemoryStore;

    use super::*;

    fn input(first: &str, last: &str) -> PersonInput {
        PersonInput {
            id: None,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn update_with_mismatched_id_is_rejected() {
        let store = MemoryStore::new();
        let ada = create_person(&store, &input("Ada", "Lovelace")).await.unwrap();

        let mut changed = input("Grace", "Hopper");
        changed.id = Some(ada.id + 1);
        assert_matches!(
            update_person(&store, ada.id, &changed).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_eq!(get_person(&store, ada.id).await.unwrap().first_name, "Ada");
    }

    #[tokio::test]
    async fn update_without_body_id_is_rejected() {
        let store = MemoryStore::new();
        let ada = create_person(&store, &input("Ada", "Lovelace")).await.unwrap();

        assert_matches!(
            update_person(&store, ada.id, &input("Grace", "Hopper")).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_eq!(get_person(&store, ada.id).await.unwrap().first_name, "Ada");
    }

    #[tokio::test]
    async fn nul_in_any_field_is_rejected() {
        let store = MemoryStore::new();

        assert_matches!(
            create_person(&store, &input("A\0da", "Lovelace")).await,
            Err(AppError::Core(CoreError::Validation(msg))) if msg.contains("First name")
        );
        let mut with_email = input("Ada", "Lovelace");
        with_email.email = Some("ada\0@example.com".into());
        assert_matches!(
            create_person(&store, &with_email).await,
            Err(AppError::Core(CoreError::Validation(msg))) if msg.contains("Email")
        );
        assert!(list_persons(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let store = MemoryStore::new();
        let ada = create_person(&store, &input("Ada", "Lovelace")).await.unwrap();

        let mut changed = input("Ada", "King");
        changed.id = Some(ada.id);
        changed.email = Some("ada@example.com".into());
        let updated = update_person(&store, ada.id, &changed).await.unwrap();

        assert_eq!(updated.last_name, "King");
        assert_eq!(updated.email.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn missing_person_is_not_found() {
        let store = MemoryStore::new();
        assert_matches!(
            get_person(&store, 3).await,
            Err(AppError::Core(CoreError::NotFound { entity: "Person", id: 3 }))
        );
        let mut missing = input("A", "B");
        missing.id = Some(3);
        assert_matches!(
            update_person(&store, 3, &missing).await,
            Err(AppError::Core(CoreError::NotFound { .. }))
        );
        assert_matches!(
            delete_person(&store, 3).await,
            Err(AppError::Core(CoreError::NotFound { .. }))
        );
    }

    #[tokio::test]
    async fn delete_returns_removed_person() {
        let store = MemoryStore::new();
        let ada = create_person(&store, &input("Ada", "Lovelace")).await.unwrap();

        let removed = delete_person(&store, ada.id).await.unwrap();
        assert_eq!(removed, ada);
        assert!(list_persons(&store).await.unwrap().is_empty());
    }
}

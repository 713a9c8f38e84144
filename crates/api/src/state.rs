use std::sync::Arc;

use marquee_db::{MemoryStore, MovieStore, PersonStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). Handlers pass
/// the store handles explicitly into the service functions.
#[derive(Clone)]
pub struct AppState {
    /// Store gateway for movies, actors and ratings.
    pub movies: Arc<dyn MovieStore>,
    /// Store gateway for the person registry.
    pub persons: Arc<dyn PersonStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build state where one backend serves every store trait.
    pub fn with_store<S>(store: Arc<S>, config: ServerConfig) -> Self
    where
        S: MovieStore + PersonStore + 'static,
    {
        let movies: Arc<dyn MovieStore> = store.clone();
        let persons: Arc<dyn PersonStore> = store;
        Self {
            movies,
            persons,
            config: Arc::new(config),
        }
    }

    /// State backed by a fresh [`MemoryStore`].
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), config)
    }
}

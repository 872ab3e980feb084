//! HTTP request handlers for the lookup service

use axum::{Router, middleware::from_fn_with_state, routing::get};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;

use crate::config::Config;
use crate::metrics::{Metrics, RegistryError};
use crate::middleware::instrument_middleware;
use crate::store::EntityStore;

pub mod health;
pub mod lookup;
pub mod metrics;

/// Application state shared across all handlers
///
/// Contains configuration, metrics and the entity store.
/// All fields are cheap to clone for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    metrics: Metrics,
    store: Arc<EntityStore>,
}

impl AppState {
    /// Create a new AppState with the seeded demo store
    ///
    /// # Errors
    ///
    /// Returns an error if the metric catalogue cannot be registered.
    pub fn new(config: Arc<Config>) -> Result<Self, RegistryError> {
        Self::with_store(config, EntityStore::default())
    }

    /// Create a new AppState serving `store`
    pub fn with_store(config: Arc<Config>, store: EntityStore) -> Result<Self, RegistryError> {
        let metrics = Metrics::new(&config.metrics)?;
        Ok(Self {
            config,
            metrics,
            store: Arc::new(store),
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Get reference to the entity store
    pub fn store(&self) -> &EntityStore {
        &self.store
    }
}

/// Build the application router
///
/// Lookup routes are wrapped by the instrumentation middleware; panics inside
/// them are turned into 500 responses before the middleware sees the result.
/// `/health` and `/metrics` are served without instrumentation.
pub fn router(state: AppState) -> Router {
    let lookups = Router::new()
        .route("/user/get/{id}", get(lookup::get_user))
        .route("/note/get/{id}", get(lookup::get_note))
        .route("/user/get-list", get(lookup::list_users))
        .route("/note/get-list", get(lookup::list_notes))
        .layer(CatchPanicLayer::new())
        .layer(from_fn_with_state(
            state.metrics().clone(),
            instrument_middleware,
        ));

    Router::new()
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .merge(lookups)
        .with_state(state)
}

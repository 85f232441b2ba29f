//! Brackets Server - persistence and HTTP access for bracket stores.
//!
//! Each bracket instance is held in memory by a [`BracketStore`] and mirrored,
//! as one JSON snapshot, to a document in a [`DocumentStore`] after every
//! mutation. The HTTP API exposes the CRUD contract per instance.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod routes;
pub mod store;

pub use config::Config;
pub use db::{DocumentStore, MemoryDocuments, PgDocuments, SnapshotDocument};
pub use error::{AppError, Error, Result};
pub use registry::Registry;
pub use store::{BracketStore, WriteMode};

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build state over `documents` using the configured write mode.
    pub fn new(config: Config, documents: Arc<dyn DocumentStore>) -> Self {
        let registry = Registry::new_shared(documents, config.write_mode);
        Self {
            registry,
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

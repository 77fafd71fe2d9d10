//! Router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use loupe_store::StoreRegistry;

use crate::handlers::*;

/// Application state shared across all handlers.
pub struct AppState {
    /// Process-wide index handle registry.
    pub registry: StoreRegistry,
}

impl AppState {
    /// Create state over a registry.
    pub fn new(registry: StoreRegistry) -> Self {
        Self { registry }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Search
        .route("/1/indexes/{index_name}/query", post(query_index))
        // Mutations
        .route("/1/indexes/{index_name}", post(save_object))
        .route("/1/indexes/{index_name}/batch", post(batch_write))
        .route("/1/indexes/{index_name}/deleteByQuery", post(delete_by_query))
        .route("/1/indexes/{index_name}/clear", post(clear_index))
        // Enumeration
        .route("/1/indexes/{index_name}/browse", post(browse_index))
        // Per-object operations
        .route(
            "/1/indexes/{index_name}/{object_id}",
            get(get_object).put(update_object).delete(delete_object),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

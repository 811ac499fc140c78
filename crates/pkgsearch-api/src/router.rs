//! Axum router construction.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use pkgsearch_solr::client::SearchEngine;

use crate::handlers::{batch::batch_handler, search::search_handler};
use crate::models::HealthResponse;
use crate::search::transform::ResultTransformer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Search engine the queries run against.
    pub engine: Arc<dyn SearchEngine>,
    /// Result shaper holding the public base URL.
    pub transformer: Arc<ResultTransformer>,
}

/// Build the Axum application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/search.json", get(search_handler))
        .route("/search/queries", post(batch_handler))
        .route("/1/indexes/:index/queries", post(batch_handler))
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

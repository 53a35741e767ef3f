//! HTTP API route definitions.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health, list_patients, list_providers, patients_by_first_name, providers_by_specialty,
    AppState,
};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(health))
        // Directory listings
        .route("/patients", get(list_patients))
        .route("/providers", get(list_providers))
        // Grouped aggregates
        .route("/patients/firstname", get(patients_by_first_name))
        .route("/providers/specialty", get(providers_by_specialty))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::directory::{FirstNameGroup, Patient, Provider, QueryKind, SpecialtyGroup, Store};
use crate::error::StoreError;
use crate::metrics;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store every query runs against.
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Create new app state around a store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend())
            .finish()
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Error body: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Store error text, verbatim.
    pub error: String,
}

/// A failed query, rendered as HTTP 500.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Error text sent to the client.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.client_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Record metrics for a finished query and turn it into a response.
fn finish<T>(
    kind: QueryKind,
    start: Instant,
    result: Result<Vec<T>, StoreError>,
) -> Result<Json<Vec<T>>, ApiError> {
    match result {
        Ok(rows) => {
            metrics::record_query_success(kind, start, rows.len());
            Ok(Json(rows))
        }
        Err(e) => {
            metrics::record_query_failure(kind, start);
            warn!(query = %kind, route = kind.route(), "Returning 500: {}", e);
            Err(e.into())
        }
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `GET /patients`
pub async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let start = Instant::now();
    finish(QueryKind::Patients, start, state.store.patients().await)
}

/// `GET /providers`
pub async fn list_providers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Provider>>, ApiError> {
    let start = Instant::now();
    finish(QueryKind::Providers, start, state.store.providers().await)
}

/// `GET /patients/firstname`
pub async fn patients_by_first_name(
    State(state): State<AppState>,
) -> Result<Json<Vec<FirstNameGroup>>, ApiError> {
    let start = Instant::now();
    finish(
        QueryKind::PatientsByFirstName,
        start,
        state.store.patients_by_first_name().await,
    )
}

/// `GET /providers/specialty`
pub async fn providers_by_specialty(
    State(state): State<AppState>,
) -> Result<Json<Vec<SpecialtyGroup>>, ApiError> {
    let start = Instant::now();
    finish(
        QueryKind::ProvidersBySpecialty,
        start,
        state.store.providers_by_specialty().await,
    )
}

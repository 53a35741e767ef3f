//! HTTP API module: the four directory routes plus a health check.

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::create_router;

//! Read-only HTTP gateway over a clinic's `patients` and `providers` tables.
//!
//! Four GET routes each run one fixed statement against a shared MySQL
//! connection and return the rows as a JSON array:
//!
//! ```text
//! GET /patients             [{patient_id, first_name, last_name, date_of_birth}]
//! GET /providers            [{first_name, last_name, provider_specialty}]
//! GET /patients/firstname   [{first_name, count, details}]
//! GET /providers/specialty  [{provider_specialty, count, providers}]
//! ```
//!
//! Any store failure becomes HTTP 500 with `{"error": "<store message>"}`.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`directory`]: Row types, SQL, and the store implementations
//! - [`api`]: HTTP routes and handlers
//! - [`metrics`]: Query metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod utils;

pub use config::Config;
pub use error::{GatewayError, Result, StoreError};

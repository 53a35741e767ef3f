//! Unified error types for the gateway.

use thiserror::Error;

/// Unified error type for the gateway process.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`Store`](crate::directory::Store).
///
/// The `Display` output of the query-time variants is the store's own text,
/// so it can be handed to clients unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Initial connection could not be established.
    #[error("failed to connect to {location}: {reason}")]
    Connect {
        /// Store location (no credentials).
        location: String,
        /// Driver error text.
        reason: String,
    },

    /// Statement execution failed.
    #[error("{0}")]
    Query(String),

    /// The store never connected; carries the startup failure text.
    #[error("{0}")]
    NotConnected(String),
}

impl StoreError {
    /// Text reported to HTTP clients.
    pub fn client_message(&self) -> String {
        match self {
            StoreError::Connect { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}

impl From<mysql_async::Error> for StoreError {
    fn from(err: mysql_async::Error) -> Self {
        StoreError::Query(driver_message(err))
    }
}

/// Error text as the server reported it, or the driver's own description.
pub(crate) fn driver_message(err: mysql_async::Error) -> String {
    match err {
        mysql_async::Error::Server(server) => server.message,
        other => other.to_string(),
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;

//! Read access to the patients and providers tables.
//!
//! This module handles:
//! - Row types and grouping helpers
//! - The fixed SQL statements
//! - The MySQL-backed store
//! - An in-memory store for tests

pub mod memory;
pub mod mysql;
pub mod queries;
pub mod types;

use async_trait::async_trait;

use crate::error::StoreError;

pub use memory::{MemoryStore, MemoryStoreConfig};
pub use mysql::MysqlStore;
pub use queries::QueryKind;
pub use types::{FirstNameGroup, Patient, PatientId, Provider, SpecialtyGroup};

/// A relational store exposing the four directory queries.
///
/// Implementations must tolerate concurrent calls; each call issues exactly
/// one statement and never writes.
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// All patient rows, in store order.
    async fn patients(&self) -> Result<Vec<Patient>, StoreError>;

    /// All provider rows, in store order.
    async fn providers(&self) -> Result<Vec<Provider>, StoreError>;

    /// Patients grouped by first name.
    async fn patients_by_first_name(&self) -> Result<Vec<FirstNameGroup>, StoreError>;

    /// Providers grouped by specialty.
    async fn providers_by_specialty(&self) -> Result<Vec<SpecialtyGroup>, StoreError>;

    /// Round-trip to the store without touching the tables.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release the underlying connection. Later queries fail.
    async fn close(&self) -> Result<(), StoreError>;
}

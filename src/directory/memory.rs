//! In-memory store for unit testing and local runs.
//!
//! Grouping is computed in Rust with the same contract as the SQL
//! aggregates: members ordered by last name, joined with `", "`.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::types::{join_members, FirstNameGroup, Patient, Provider, SpecialtyGroup};
use super::Store;
use crate::error::StoreError;

/// Configuration for in-memory store behavior.
#[derive(Debug, Clone, Default)]
pub struct MemoryStoreConfig {
    /// When set, every query fails with this message.
    pub fail_with: Option<String>,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct Tables {
    patients: Vec<Patient>,
    providers: Vec<Provider>,
    closed: bool,
}

/// In-memory store holding both tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    config: MemoryStoreConfig,
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with custom configuration.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            tables: Arc::default(),
        }
    }

    /// A store where every query fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self::with_config(MemoryStoreConfig {
            fail_with: Some(message.to_string()),
            ..Default::default()
        })
    }

    /// Append a patient row.
    pub fn insert_patient(&self, patient: Patient) {
        self.write().patients.push(patient);
    }

    /// Append a provider row.
    pub fn insert_provider(&self, provider: Provider) {
        self.write().providers.push(provider);
    }

    /// Builder-style [`insert_patient`](Self::insert_patient).
    pub fn with_patient(self, patient: Patient) -> Self {
        self.insert_patient(patient);
        self
    }

    /// Builder-style [`insert_provider`](Self::insert_provider).
    pub fn with_provider(self, provider: Provider) -> Self {
        self.insert_provider(provider);
        self
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply latency and failure injection, then snapshot the tables.
    async fn snapshot<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(message) = &self.config.fail_with {
            return Err(StoreError::Query(message.clone()));
        }

        let tables = self.read();
        if tables.closed {
            return Err(StoreError::NotConnected("store is closed".to_string()));
        }

        Ok(f(&tables))
    }
}

/// Group rows by `key`, sort each group by last name, and join member strings.
///
/// Groups come back in ascending key order; a NULL key forms its own group.
fn group_rows<R, K, L, M>(
    rows: &[R],
    key: K,
    last_name: L,
    member: M,
) -> Vec<(Option<String>, i64, Option<String>)>
where
    K: Fn(&R) -> Option<String>,
    L: Fn(&R) -> Option<String>,
    M: Fn(&R) -> Option<String>,
{
    let mut groups: BTreeMap<Option<String>, Vec<&R>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(key, mut members)| {
            // stable, so equal last names keep insertion order
            members.sort_by_key(|row| last_name(*row));
            let count = members.len() as i64;
            let joined = join_members(members.into_iter().map(&member));
            (key, count, joined)
        })
        .collect()
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn patients(&self) -> Result<Vec<Patient>, StoreError> {
        self.snapshot(|t| t.patients.clone()).await
    }

    async fn providers(&self) -> Result<Vec<Provider>, StoreError> {
        self.snapshot(|t| t.providers.clone()).await
    }

    async fn patients_by_first_name(&self) -> Result<Vec<FirstNameGroup>, StoreError> {
        self.snapshot(|t| {
            group_rows(
                &t.patients,
                |p| p.first_name.clone(),
                |p| p.last_name.clone(),
                Patient::detail,
            )
            .into_iter()
            .map(|(first_name, count, details)| FirstNameGroup {
                first_name,
                count,
                details,
            })
            .collect()
        })
        .await
    }

    async fn providers_by_specialty(&self) -> Result<Vec<SpecialtyGroup>, StoreError> {
        self.snapshot(|t| {
            group_rows(
                &t.providers,
                |p| p.provider_specialty.clone(),
                |p| p.last_name.clone(),
                Provider::display_name,
            )
            .into_iter()
            .map(|(provider_specialty, count, providers)| SpecialtyGroup {
                provider_specialty,
                count,
                providers,
            })
            .collect()
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.snapshot(|_| ()).await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.write().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn groups_patients_by_first_name_ordered_by_last_name() {
        let store = MemoryStore::new()
            .with_patient(Patient::new(1, "Ann", "Lee", date("1990-01-01")))
            .with_patient(Patient::new(2, "Ann", "Kim", date("1985-05-05")));

        let groups = tokio_test::block_on(store.patients_by_first_name()).unwrap();

        assert_eq!(
            groups,
            vec![FirstNameGroup {
                first_name: Some("Ann".to_string()),
                count: 2,
                details: Some("Kim (1985-05-05), Lee (1990-01-01)".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn groups_providers_by_specialty() {
        let store = MemoryStore::new()
            .with_provider(Provider::new("Meredith", "Grey", "Surgery"))
            .with_provider(Provider::new("Gregory", "House", "Diagnostics"))
            .with_provider(Provider::new("Preston", "Burke", "Surgery"));

        let groups = store.providers_by_specialty().await.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].provider_specialty.as_deref(), Some("Diagnostics"));
        assert_eq!(groups[0].count, 1);
        assert_eq!(groups[1].provider_specialty.as_deref(), Some("Surgery"));
        assert_eq!(groups[1].count, 2);
        assert_eq!(
            groups[1].providers.as_deref(),
            Some("Preston Burke, Meredith Grey")
        );
    }

    #[tokio::test]
    async fn count_matches_member_segments() {
        let store = MemoryStore::new();
        for (id, last) in ["Zhu", "Adams", "Moss", "Adams"].iter().enumerate() {
            store.insert_patient(Patient::new(id as i64, "Sam", last, date("2001-02-03")));
        }

        let groups = store.patients_by_first_name().await.unwrap();
        let group = &groups[0];
        let details = group.details.as_deref().unwrap();

        assert_eq!(group.count, 4);
        assert_eq!(details.split(", ").count() as i64, group.count);
        assert!(details.starts_with("Adams (2001-02-03), Adams"));
        assert!(details.ends_with("Zhu (2001-02-03)"));
    }

    #[tokio::test]
    async fn empty_tables_return_empty_lists() {
        let store = MemoryStore::new();
        assert!(store.providers().await.unwrap().is_empty());
        assert!(store.providers_by_specialty().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_store_reports_message() {
        let store = MemoryStore::failing("Connection lost: The server closed the connection.");
        let err = store.patients().await.unwrap_err();
        assert_eq!(err.to_string(), "Connection lost: The server closed the connection.");
    }

    #[tokio::test]
    async fn closed_store_rejects_queries() {
        let store = MemoryStore::new();
        store.close().await.unwrap();
        assert!(matches!(store.patients().await, Err(StoreError::NotConnected(_))));
    }
}

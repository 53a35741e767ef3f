//! Tests against a real MySQL server.
//!
//! These require DB_HOST, DB_USER, DB_PASSWORD and DB_NAME pointing at a
//! database with the `patients` and `providers` tables.
//! Run with: cargo test --test mysql_live -- --ignored

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use clinic_gateway::config::Config;
use clinic_gateway::directory::{FirstNameGroup, MysqlStore, PatientId, SpecialtyGroup, Store};
use clinic_gateway::StoreError;

/// Session-local tables shadowing the real ones for the lifetime of the
/// connection. Nothing is written to the configured database.
const SCENARIO: &[&str] = &[
    "SET SESSION sql_mode = ''",
    "CREATE TEMPORARY TABLE patients (
        patient_id INT PRIMARY KEY,
        first_name VARCHAR(50),
        last_name VARCHAR(50),
        date_of_birth DATE
    )",
    "INSERT INTO patients VALUES
        (1, 'Ann', 'Lee', '1990-01-01'),
        (2, 'Ann', 'Kim', '1985-05-05'),
        (3, 'Zed', 'Moss', '0000-00-00')",
    "CREATE TEMPORARY TABLE providers (
        first_name VARCHAR(50),
        last_name VARCHAR(50),
        provider_specialty VARCHAR(50)
    )",
    "INSERT INTO providers VALUES
        ('Meredith', 'Grey', 'Surgery'),
        ('Preston', 'Burke', 'Surgery')",
];

/// Get a test config from environment.
fn test_config() -> Option<Config> {
    let config = Config::load().ok()?;
    config.validate().ok()?;
    Some(config)
}

#[tokio::test]
#[ignore = "requires DB_* environment"]
async fn test_connect_and_ping() {
    let config = match test_config() {
        Some(c) => c,
        None => {
            println!("Skipping: DB_* environment not set");
            return;
        }
    };

    let store = MysqlStore::connect(&config).await.expect("connect");
    assert!(store.is_connected().await);
    store.ping().await.expect("ping");
    store.close().await.expect("close");
    assert!(!store.is_connected().await);
}

#[tokio::test]
#[ignore = "requires DB_* environment"]
async fn test_grouped_counts_match_listing() {
    let config = match test_config() {
        Some(c) => c,
        None => {
            println!("Skipping: DB_* environment not set");
            return;
        }
    };

    let store = MysqlStore::connect(&config).await.expect("connect");

    let patients = store.patients().await.expect("patients");
    let groups = store.patients_by_first_name().await.expect("groups");
    let total: i64 = groups.iter().map(|g| g.count).sum();
    assert_eq!(total as usize, patients.len());

    let providers = store.providers().await.expect("providers");
    let groups = store.providers_by_specialty().await.expect("groups");
    let total: i64 = groups.iter().map(|g| g.count).sum();
    assert_eq!(total as usize, providers.len());

    store.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires DB_* environment"]
async fn test_queries_fail_after_close() {
    let config = match test_config() {
        Some(c) => c,
        None => {
            println!("Skipping: DB_* environment not set");
            return;
        }
    };

    let store = MysqlStore::connect(&config).await.expect("connect");
    store.close().await.expect("close");

    let err = store.providers().await.unwrap_err();
    assert!(matches!(err, StoreError::NotConnected(_)));
}

#[tokio::test]
#[ignore = "requires DB_* environment"]
async fn test_bad_credentials_fail_at_connect() {
    let config = match test_config() {
        Some(c) => c,
        None => {
            println!("Skipping: DB_* environment not set");
            return;
        }
    };

    let config = Config {
        db_password: format!("{}-wrong", config.db_password),
        ..config
    };

    let err = MysqlStore::connect(&config).await.unwrap_err();
    assert!(matches!(err, StoreError::Connect { .. }));
}

#[tokio::test]
#[ignore = "requires DB_* environment"]
async fn test_group_concat_scenario_on_temporary_tables() {
    let config = match test_config() {
        Some(c) => c,
        None => {
            println!("Skipping: DB_* environment not set");
            return;
        }
    };

    let opts = config.mysql_opts().init(SCENARIO.to_vec());
    let store = MysqlStore::connect_with(opts, config.db_location())
        .await
        .expect("connect");

    let mut groups = store.patients_by_first_name().await.expect("groups");
    groups.sort_by(|a, b| a.first_name.cmp(&b.first_name));
    assert_eq!(
        groups[0],
        FirstNameGroup {
            first_name: Some("Ann".to_string()),
            count: 2,
            details: Some("Kim (1985-05-05), Lee (1990-01-01)".to_string()),
        }
    );

    let specialties = store.providers_by_specialty().await.expect("specialties");
    assert_eq!(
        specialties,
        vec![SpecialtyGroup {
            provider_specialty: Some("Surgery".to_string()),
            count: 2,
            providers: Some("Preston Burke, Meredith Grey".to_string()),
        }]
    );

    let mut patients = store.patients().await.expect("patients");
    patients.sort_by_key(|p| p.last_name.clone());
    let dates: Vec<_> = patients.iter().map(|p| p.date_of_birth).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(1985, 5, 5),
            NaiveDate::from_ymd_opt(1990, 1, 1),
            None,
        ]
    );
    assert_eq!(patients[2].patient_id, Some(PatientId::Int(3)));

    store.close().await.expect("close");
}

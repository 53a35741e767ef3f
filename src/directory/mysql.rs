//! MySQL-backed store over a single long-lived connection.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder, Row, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use super::queries::QueryKind;
use super::types::{parse_date, FirstNameGroup, Patient, PatientId, Provider, SpecialtyGroup};
use super::Store;
use crate::config::Config;
use crate::error::{driver_message, StoreError};

/// Reported when a query arrives after [`Store::close`].
const CLOSED_MESSAGE: &str = "Can't add new command when connection is in closed state";

/// Store backed by one MySQL connection, shared by every request.
///
/// Access is serialized through an async mutex; a request holds it only for
/// the duration of its single statement.
#[derive(Debug)]
pub struct MysqlStore {
    conn: Mutex<Option<Conn>>,
    location: String,
    /// Startup failure text when running degraded.
    startup_error: Option<String>,
}

impl MysqlStore {
    /// Open the connection described by `config`.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        Self::connect_with(config.mysql_opts(), config.db_location()).await
    }

    /// Open a connection with explicit options. `location` is only used in
    /// logs and errors, so it must not carry credentials.
    pub async fn connect_with(opts: OptsBuilder, location: String) -> Result<Self, StoreError> {
        info!("Connecting to {}", location);

        let conn = Conn::new(opts)
            .await
            .map_err(|e| StoreError::Connect {
                location: location.clone(),
                reason: driver_message(e),
            })?;

        info!("Connected to {}", location);

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            location,
            startup_error: None,
        })
    }

    /// A store whose initial connection failed. Every query reports `err`.
    pub fn degraded(err: &StoreError) -> Self {
        let location = match err {
            StoreError::Connect { location, .. } => location.clone(),
            _ => String::new(),
        };

        Self {
            conn: Mutex::new(None),
            location,
            startup_error: Some(err.client_message()),
        }
    }

    /// Whether the store holds an open connection.
    pub async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    fn unavailable(&self) -> StoreError {
        StoreError::NotConnected(
            self.startup_error
                .clone()
                .unwrap_or_else(|| CLOSED_MESSAGE.to_string()),
        )
    }

    /// Run one statement and return its raw rows.
    async fn fetch(&self, kind: QueryKind) -> Result<Vec<Row>, StoreError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(|| self.unavailable())?;

        let rows: Vec<Row> = conn.query(kind.sql()).await.map_err(|e| {
            let err = StoreError::from(e);
            error!(query = %kind, "Query failed: {}", err);
            err
        })?;

        debug!(query = %kind, rows = rows.len(), "Query complete");
        Ok(rows)
    }
}

/// Column values of one result row, as the store sent them.
///
/// Decoding never fails: missing or NULL columns read as `None`, and
/// values that do not fit a typed field are passed through or nulled.
#[derive(Debug)]
struct Columns(Vec<Option<Value>>);

impl Columns {
    fn from_row(mut row: Row) -> Self {
        let values = (0..row.len())
            .map(|i| row.take::<Value, _>(i).filter(|v| *v != Value::NULL))
            .collect();
        Self(values)
    }

    #[cfg(test)]
    fn from_values(values: Vec<Value>) -> Self {
        Self(values.into_iter().map(|v| Some(v).filter(|v| *v != Value::NULL)).collect())
    }

    /// Column `index` rendered as text.
    fn text(&mut self, index: usize) -> Option<String> {
        self.0.get_mut(index).and_then(Option::take).and_then(value_text)
    }

    /// Column `index` as an aggregate count.
    fn count(&mut self, index: usize) -> i64 {
        self.text(index)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

/// Render a value the way the text protocol would have sent it.
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Value::Int(n) => Some(n.to_string()),
        Value::UInt(n) => Some(n.to_string()),
        Value::Float(n) => Some(n.to_string()),
        Value::Double(n) => Some(n.to_string()),
        Value::Date(year, month, day, 0, 0, 0, 0) => {
            Some(format!("{:04}-{:02}-{:02}", year, month, day))
        }
        Value::Date(year, month, day, hour, minute, second, _) => Some(format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            year, month, day, hour, minute, second
        )),
        Value::Time(negative, days, hours, minutes, seconds, _) => Some(format!(
            "{}{:02}:{:02}:{:02}",
            if negative { "-" } else { "" },
            days * 24 + u32::from(hours),
            minutes,
            seconds
        )),
    }
}

fn decode_patient(mut cols: Columns) -> Patient {
    let patient_id = cols.text(0).map(PatientId::from_text);
    let first_name = cols.text(1);
    let last_name = cols.text(2);

    let date_of_birth = cols.text(3).and_then(|raw| match parse_date(&raw) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(?patient_id, raw = %raw, "date_of_birth is not a calendar date: {}", e);
            None
        }
    });

    Patient {
        patient_id,
        first_name,
        last_name,
        date_of_birth,
    }
}

fn decode_provider(mut cols: Columns) -> Provider {
    Provider {
        first_name: cols.text(0),
        last_name: cols.text(1),
        provider_specialty: cols.text(2),
    }
}

fn decode_first_name_group(mut cols: Columns) -> FirstNameGroup {
    FirstNameGroup {
        first_name: cols.text(0),
        count: cols.count(1),
        details: cols.text(2),
    }
}

fn decode_specialty_group(mut cols: Columns) -> SpecialtyGroup {
    SpecialtyGroup {
        provider_specialty: cols.text(0),
        count: cols.count(1),
        providers: cols.text(2),
    }
}

#[async_trait]
impl Store for MysqlStore {
    fn backend(&self) -> &'static str {
        "mysql"
    }

    #[instrument(skip(self))]
    async fn patients(&self) -> Result<Vec<Patient>, StoreError> {
        let rows = self.fetch(QueryKind::Patients).await?;
        Ok(rows
            .into_iter()
            .map(|row| decode_patient(Columns::from_row(row)))
            .collect())
    }

    #[instrument(skip(self))]
    async fn providers(&self) -> Result<Vec<Provider>, StoreError> {
        let rows = self.fetch(QueryKind::Providers).await?;
        Ok(rows
            .into_iter()
            .map(|row| decode_provider(Columns::from_row(row)))
            .collect())
    }

    #[instrument(skip(self))]
    async fn patients_by_first_name(&self) -> Result<Vec<FirstNameGroup>, StoreError> {
        let rows = self.fetch(QueryKind::PatientsByFirstName).await?;
        Ok(rows
            .into_iter()
            .map(|row| decode_first_name_group(Columns::from_row(row)))
            .collect())
    }

    #[instrument(skip(self))]
    async fn providers_by_specialty(&self) -> Result<Vec<SpecialtyGroup>, StoreError> {
        let rows = self.fetch(QueryKind::ProvidersBySpecialty).await?;
        Ok(rows
            .into_iter()
            .map(|row| decode_specialty_group(Columns::from_row(row)))
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(|| self.unavailable())?;
        conn.ping().await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().await.take();

        match conn {
            Some(conn) => {
                conn.disconnect().await?;
                info!("Disconnected from {}", self.location);
            }
            None => debug!("Close requested with no open connection"),
        }

        Ok(())
    }
}

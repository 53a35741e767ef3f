//! Row types returned by the directory queries.

use chrono::NaiveDate;
use serde::Serialize;

/// Separator between members of a grouped aggregate.
pub const MEMBER_SEPARATOR: &str = ", ";

/// Date format used for `date_of_birth`, both in JSON and inside `details`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Patient identifier as the store returned it.
///
/// Numeric ids render as JSON numbers, anything else as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PatientId {
    /// Integer column value.
    Int(i64),
    /// Non-integer column value, passed through as text.
    Text(String),
}

impl PatientId {
    /// Classify a raw column value.
    pub fn from_text(raw: String) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => PatientId::Int(id),
            Err(_) => PatientId::Text(raw),
        }
    }
}

impl From<i64> for PatientId {
    fn from(id: i64) -> Self {
        PatientId::Int(id)
    }
}

/// A row of the `patients` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patient {
    /// Unique patient identifier.
    pub patient_id: Option<PatientId>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Date of birth, serialized as `YYYY-MM-DD`; `null` when the store
    /// holds NULL or a value that is not a calendar date (e.g. `0000-00-00`).
    pub date_of_birth: Option<NaiveDate>,
}

impl Patient {
    /// Create a patient row with all columns populated.
    pub fn new(
        patient_id: i64,
        first_name: &str,
        last_name: &str,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            date_of_birth: Some(date_of_birth),
        }
    }

    /// Member entry for `/patients/firstname`: `"last_name (date_of_birth)"`.
    ///
    /// `None` when either part is NULL, as the store's `CONCAT` would yield.
    pub fn detail(&self) -> Option<String> {
        let last_name = self.last_name.as_deref()?;
        let dob = self.date_of_birth?;
        Some(format!("{} ({})", last_name, dob.format(DATE_FORMAT)))
    }
}

/// A row of the `providers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provider {
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Specialty category.
    pub provider_specialty: Option<String>,
}

impl Provider {
    /// Create a provider row with all columns populated.
    pub fn new(first_name: &str, last_name: &str, provider_specialty: &str) -> Self {
        Self {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            provider_specialty: Some(provider_specialty.to_string()),
        }
    }

    /// Member entry for `/providers/specialty`: `"first_name last_name"`.
    pub fn display_name(&self) -> Option<String> {
        let first_name = self.first_name.as_deref()?;
        let last_name = self.last_name.as_deref()?;
        Some(format!("{} {}", first_name, last_name))
    }
}

/// Patients sharing a first name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirstNameGroup {
    /// Shared first name.
    pub first_name: Option<String>,
    /// Number of patients in the group.
    pub count: i64,
    /// `"last_name (date_of_birth)"` per member, ordered by last name.
    pub details: Option<String>,
}

/// Providers sharing a specialty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialtyGroup {
    /// Shared specialty.
    pub provider_specialty: Option<String>,
    /// Number of providers in the group.
    pub count: i64,
    /// `"first_name last_name"` per member, ordered by last name.
    pub providers: Option<String>,
}

/// Join member entries the way the store's string aggregate does.
///
/// NULL entries are skipped; an all-NULL group yields `None`.
pub fn join_members<I>(members: I) -> Option<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    let parts: Vec<String> = members.into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(MEMBER_SEPARATOR))
    }
}

/// Parse a `date_of_birth` column as returned by the store's text protocol.
pub fn parse_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    // DATETIME columns come back as "YYYY-MM-DD hh:mm:ss"
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
}

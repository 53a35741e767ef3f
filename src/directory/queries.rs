//! Fixed SQL statements, one per route.

use strum::{Display, EnumIter, IntoStaticStr};

/// List every patient.
pub const SELECT_PATIENTS: &str =
    "SELECT patient_id, first_name, last_name, date_of_birth FROM patients";

/// List every provider.
pub const SELECT_PROVIDERS: &str =
    "SELECT first_name, last_name, provider_specialty FROM providers";

/// Patients grouped by first name.
pub const GROUP_PATIENTS_BY_FIRST_NAME: &str = "\
SELECT first_name,
       COUNT(*) AS count,
       GROUP_CONCAT(CONCAT(last_name, ' (', date_of_birth, ')')
                    ORDER BY last_name SEPARATOR ', ') AS details
FROM patients
GROUP BY first_name";

/// Providers grouped by specialty.
pub const GROUP_PROVIDERS_BY_SPECIALTY: &str = "\
SELECT provider_specialty,
       COUNT(*) AS count,
       GROUP_CONCAT(CONCAT(first_name, ' ', last_name)
                    ORDER BY last_name SEPARATOR ', ') AS providers
FROM providers
GROUP BY provider_specialty";

/// The queries the gateway can run. Used as the metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum QueryKind {
    /// `GET /patients`
    Patients,
    /// `GET /providers`
    Providers,
    /// `GET /patients/firstname`
    PatientsByFirstName,
    /// `GET /providers/specialty`
    ProvidersBySpecialty,
}

impl QueryKind {
    /// SQL text executed for this query.
    pub fn sql(self) -> &'static str {
        match self {
            QueryKind::Patients => SELECT_PATIENTS,
            QueryKind::Providers => SELECT_PROVIDERS,
            QueryKind::PatientsByFirstName => GROUP_PATIENTS_BY_FIRST_NAME,
            QueryKind::ProvidersBySpecialty => GROUP_PROVIDERS_BY_SPECIALTY,
        }
    }

    /// HTTP path serving this query.
    pub fn route(self) -> &'static str {
        match self {
            QueryKind::Patients => "/patients",
            QueryKind::Providers => "/providers",
            QueryKind::PatientsByFirstName => "/patients/firstname",
            QueryKind::ProvidersBySpecialty => "/providers/specialty",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn labels_are_snake_case() {
        assert_eq!(QueryKind::PatientsByFirstName.to_string(), "patients_by_first_name");
        let label: &'static str = QueryKind::ProvidersBySpecialty.into();
        assert_eq!(label, "providers_by_specialty");
    }

    #[test]
    fn statements_are_read_only() {
        for kind in QueryKind::iter() {
            assert!(kind.sql().trim_start().starts_with("SELECT"), "{kind}");
        }
    }

    #[test]
    fn grouped_statements_keep_separator_and_order() {
        for kind in [QueryKind::PatientsByFirstName, QueryKind::ProvidersBySpecialty] {
            assert!(kind.sql().contains("ORDER BY last_name SEPARATOR ', '"));
            assert!(kind.sql().contains("COUNT(*) AS count"));
        }
    }

    #[test]
    fn routes_are_distinct() {
        let mut routes: Vec<_> = QueryKind::iter().map(QueryKind::route).collect();
        routes.sort();
        routes.dedup();
        assert_eq!(routes.len(), 4);
    }
}

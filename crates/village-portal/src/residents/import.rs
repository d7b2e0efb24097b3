use std::io::Read;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{ResidentProfile, ResidentRegistration, ResidentRole};
use crate::repository::RepositoryError;

#[derive(Debug)]
pub enum ResidentImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Storage(RepositoryError),
}

impl std::fmt::Display for ResidentImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResidentImportError::Io(err) => write!(f, "failed to read resident export: {}", err),
            ResidentImportError::Csv(err) => write!(f, "invalid resident CSV data: {}", err),
            ResidentImportError::Storage(err) => {
                write!(f, "could not store imported residents: {}", err)
            }
        }
    }
}

impl std::error::Error for ResidentImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResidentImportError::Io(err) => Some(err),
            ResidentImportError::Csv(err) => Some(err),
            ResidentImportError::Storage(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ResidentImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ResidentImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// One data row from a resident export; `line` is the 1-based line in the file.
#[derive(Debug)]
pub(crate) struct ImportRow {
    pub(crate) line: usize,
    pub(crate) registration: Result<ResidentRegistration, String>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub registered: usize,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ImportRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<ResidentRow>().enumerate() {
        let row = record?;
        rows.push(ImportRow {
            line: index + 2,
            registration: row.into_registration(),
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct ResidentRow {
    full_name: String,
    nic: String,
    date_of_birth: String,
    address: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    occupation: Option<String>,
}

impl ResidentRow {
    fn into_registration(self) -> Result<ResidentRegistration, String> {
        let date_of_birth = NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d")
            .map_err(|err| {
                format!(
                    "date_of_birth '{}' is not YYYY-MM-DD ({err})",
                    self.date_of_birth
                )
            })?;

        Ok(ResidentRegistration {
            profile: ResidentProfile {
                full_name: self.full_name,
                nic: self.nic.to_ascii_uppercase(),
                date_of_birth,
                address: self.address,
                phone: self.phone,
                email: self.email,
                occupation: self.occupation,
                emergency_contact: None,
                family_members: Vec::new(),
                conduct: None,
            },
            role: ResidentRole::Resident,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "full_name,nic,date_of_birth,address,phone,email,occupation\n";

    #[test]
    fn parses_rows_with_optional_columns() {
        let csv = format!(
            "{HEADER}Nimal Perera,851234567v,1985-04-12,12 Temple Road,,nimal@example.lk,Farmer\n"
        );
        let rows = parse_rows(Cursor::new(csv)).expect("csv parses");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 2);

        let registration = rows[0].registration.as_ref().expect("row converts");
        assert_eq!(registration.profile.nic, "851234567V");
        assert!(registration.profile.phone.is_none());
        assert_eq!(registration.profile.occupation.as_deref(), Some("Farmer"));
    }

    #[test]
    fn bad_dates_are_reported_per_row() {
        let csv = format!(
            "{HEADER}Kamala Silva,198512345678,12/04/1985,4 Lake View,,,\nSunil Fernando,901234567V,1990-01-01,7 Hill St,,,\n"
        );
        let rows = parse_rows(Cursor::new(csv)).expect("csv parses");
        assert_eq!(rows.len(), 2);
        let err = rows[0].registration.as_ref().expect_err("date rejected");
        assert!(err.contains("12/04/1985"));
        assert!(rows[1].registration.is_ok());
    }

    #[test]
    fn ragged_rows_abort_the_import() {
        let csv = format!("{HEADER}Only,Two\n");
        assert!(parse_rows(Cursor::new(csv)).is_err());
    }
}

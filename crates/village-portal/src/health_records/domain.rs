use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::residents::ResidentId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthRecordId(pub String);

impl fmt::Display for HealthRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the clinic is following: a pregnancy or a young child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HealthRecordKind {
    Maternal {
        expected_delivery: NaiveDate,
        pregnancy_number: u8,
    },
    Child {
        child_name: String,
        date_of_birth: NaiveDate,
        #[serde(default)]
        birth_weight_grams: Option<u32>,
    },
}

impl HealthRecordKind {
    /// Short label for clinic schedules.
    pub fn subject(&self) -> String {
        match self {
            Self::Maternal {
                pregnancy_number, ..
            } => format!("pregnancy #{pregnancy_number}"),
            Self::Child { child_name, .. } => child_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicVisit {
    pub visited_on: NaiveDate,
    #[serde(default)]
    pub weight_kg: Option<f32>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub next_visit: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: HealthRecordId,
    pub resident_id: ResidentId,
    pub kind: HealthRecordKind,
    pub visits: Vec<ClinicVisit>,
    pub created_at: DateTime<Utc>,
}

impl HealthRecord {
    /// Follow-up date booked at the most recent visit.
    pub fn next_visit(&self) -> Option<NaiveDate> {
        self.visits
            .iter()
            .max_by_key(|visit| visit.visited_on)
            .and_then(|visit| visit.next_visit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingVisit {
    pub record_id: HealthRecordId,
    pub resident_id: ResidentId,
    pub subject: String,
    pub due_on: NaiveDate,
}

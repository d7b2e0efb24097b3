use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::info;

use super::domain::{ClinicVisit, HealthRecord, HealthRecordId, HealthRecordKind, UpcomingVisit};
use super::repository::HealthRecordRepository;
use crate::clock::Clock;
use crate::repository::RepositoryError;
use crate::residents::{ResidentId, ResidentRepository};

static RECORD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Full-term pregnancy plus the two weeks clinics allow past the due date.
const MAX_WEEKS_TO_DELIVERY: i64 = 42;

fn next_record_id() -> HealthRecordId {
    let id = RECORD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    HealthRecordId(format!("hr-{id:06}"))
}

/// Maternal and child clinic records kept by the public health midwife.
pub struct HealthRecordService<H, R> {
    records: Arc<H>,
    residents: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<H, R> HealthRecordService<H, R>
where
    H: HealthRecordRepository + 'static,
    R: ResidentRepository + 'static,
{
    pub fn new(records: Arc<H>, residents: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            records,
            residents,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    pub fn open_record(
        &self,
        resident_id: &ResidentId,
        kind: HealthRecordKind,
    ) -> Result<HealthRecord, HealthRecordError> {
        if self.residents.fetch(resident_id)?.is_none() {
            return Err(HealthRecordError::ResidentNotFound(resident_id.clone()));
        }
        let now = self.clock.now();
        let kind = validate_kind(kind, now.date_naive())?;

        let record = HealthRecord {
            id: next_record_id(),
            resident_id: resident_id.clone(),
            kind,
            visits: Vec::new(),
            created_at: now,
        };
        let stored = self.records.insert(record)?;
        info!(record_id = %stored.id, resident_id = %stored.resident_id, "health record opened");
        Ok(stored)
    }

    /// Append a clinic visit. Visits cannot be dated in the future or before a child's birth.
    pub fn record_visit(
        &self,
        id: &HealthRecordId,
        visit: ClinicVisit,
        today: NaiveDate,
    ) -> Result<HealthRecord, HealthRecordError> {
        let mut record = self.get(id)?;

        if visit.visited_on > today {
            return Err(HealthRecordError::Validation(
                "visit date cannot be in the future".to_string(),
            ));
        }
        if let HealthRecordKind::Child { date_of_birth, .. } = &record.kind {
            if visit.visited_on < *date_of_birth {
                return Err(HealthRecordError::Validation(
                    "visit date cannot be before the child's date of birth".to_string(),
                ));
            }
        }
        if visit
            .weight_kg
            .is_some_and(|weight| weight.is_nan() || weight <= 0.0)
        {
            return Err(HealthRecordError::Validation(
                "weight_kg must be positive".to_string(),
            ));
        }
        if visit.next_visit.is_some_and(|next| next <= visit.visited_on) {
            return Err(HealthRecordError::Validation(
                "next_visit must fall after the visit date".to_string(),
            ));
        }

        record.visits.push(ClinicVisit {
            notes: visit.notes.trim().to_string(),
            ..visit
        });
        record.visits.sort_by_key(|visit| visit.visited_on);
        self.records.update(record.clone())?;
        info!(
            record_id = %record.id,
            visits = record.visits.len(),
            "clinic visit recorded"
        );
        Ok(record)
    }

    pub fn for_resident(
        &self,
        resident_id: &ResidentId,
    ) -> Result<Vec<HealthRecord>, HealthRecordError> {
        let mut records = self.records.for_resident(resident_id)?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    pub fn get(&self, id: &HealthRecordId) -> Result<HealthRecord, HealthRecordError> {
        self.records
            .fetch(id)?
            .ok_or_else(|| HealthRecordError::NotFound(id.clone()))
    }

    /// Follow-ups due between `today` and `today + within_days`, earliest first.
    pub fn upcoming_visits(
        &self,
        today: NaiveDate,
        within_days: u32,
    ) -> Result<Vec<UpcomingVisit>, HealthRecordError> {
        let horizon = today + Duration::days(i64::from(within_days));
        let mut upcoming: Vec<UpcomingVisit> = self
            .records
            .list()?
            .into_iter()
            .filter_map(|record| {
                let due_on = record.next_visit()?;
                (today..=horizon).contains(&due_on).then(|| UpcomingVisit {
                    subject: record.kind.subject(),
                    record_id: record.id,
                    resident_id: record.resident_id,
                    due_on,
                })
            })
            .collect();
        upcoming.sort_by(|a, b| {
            a.due_on
                .cmp(&b.due_on)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        Ok(upcoming)
    }
}

fn validate_kind(
    kind: HealthRecordKind,
    today: NaiveDate,
) -> Result<HealthRecordKind, HealthRecordError> {
    match kind {
        HealthRecordKind::Maternal {
            expected_delivery,
            pregnancy_number,
        } => {
            if pregnancy_number == 0 {
                return Err(HealthRecordError::Validation(
                    "pregnancy_number must be at least 1".to_string(),
                ));
            }
            let latest = today + Duration::weeks(MAX_WEEKS_TO_DELIVERY);
            if expected_delivery < today || expected_delivery > latest {
                return Err(HealthRecordError::Validation(format!(
                    "expected_delivery must fall between {today} and {latest}"
                )));
            }
            Ok(HealthRecordKind::Maternal {
                expected_delivery,
                pregnancy_number,
            })
        }
        HealthRecordKind::Child {
            child_name,
            date_of_birth,
            birth_weight_grams,
        } => {
            let child_name = child_name.trim().to_string();
            if child_name.is_empty() {
                return Err(HealthRecordError::Validation(
                    "child_name must not be empty".to_string(),
                ));
            }
            if date_of_birth > today {
                return Err(HealthRecordError::Validation(
                    "child date_of_birth cannot be in the future".to_string(),
                ));
            }
            if birth_weight_grams == Some(0) {
                return Err(HealthRecordError::Validation(
                    "birth_weight_grams must be positive".to_string(),
                ));
            }
            Ok(HealthRecordKind::Child {
                child_name,
                date_of_birth,
                birth_weight_grams,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HealthRecordError {
    #[error("resident {0} not found")]
    ResidentNotFound(ResidentId),
    #[error("health record {0} not found")]
    NotFound(HealthRecordId),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

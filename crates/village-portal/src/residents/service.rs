use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    CertificateFields, ProfileUpdate, ResidentId, ResidentRecord, ResidentRegistration,
};
use super::import::{parse_rows, ImportSummary, ResidentImportError, SkippedRow};
use super::repository::ResidentRepository;
use super::validation::{validate_profile, ValidationError};
use crate::clock::Clock;
use crate::notifications::{deliver, Notification, NotificationDispatcher, NotificationTemplate};
use crate::repository::RepositoryError;

static RESIDENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_resident_id() -> ResidentId {
    let id = RESIDENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ResidentId(format!("res-{id:06}"))
}

/// Service owning resident registration and profile maintenance.
pub struct ResidentDirectoryService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<R, N> ResidentDirectoryService<R, N>
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            notifier,
            clock,
        }
    }

    /// Validate and store a new resident, notifying them when an e-mail address is on file.
    pub fn register(
        &self,
        registration: ResidentRegistration,
    ) -> Result<ResidentRecord, DirectoryError> {
        let now = self.clock.now();
        let mut profile = registration.profile;
        profile.nic = profile.nic.trim().to_ascii_uppercase();
        validate_profile(&profile, now.date_naive())?;

        if self.repository.find_by_nic(&profile.nic)?.is_some() {
            return Err(DirectoryError::DuplicateNic(profile.nic));
        }

        let record = ResidentRecord {
            id: next_resident_id(),
            profile,
            role: registration.role,
            registered_at: now,
            certificate: CertificateFields::default(),
        };
        let stored = self.repository.insert(record)?;
        info!(resident_id = %stored.id, role = stored.role.label(), "resident registered");

        if stored.profile.email.is_some() {
            let notification =
                Notification::new(NotificationTemplate::ResidentRegistered, stored.id.clone())
                    .to_recipient(stored.profile.email.clone())
                    .with_detail("full_name", stored.profile.full_name.clone());
            deliver(self.notifier.as_ref(), notification);
        }

        Ok(stored)
    }

    pub fn get(&self, id: &ResidentId) -> Result<ResidentRecord, DirectoryError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }

    pub fn list(&self) -> Result<Vec<ResidentRecord>, DirectoryError> {
        let mut records = self.repository.list()?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    pub fn update_profile(
        &self,
        id: &ResidentId,
        update: ProfileUpdate,
    ) -> Result<ResidentRecord, DirectoryError> {
        let mut record = self.get(id)?;
        update.apply_to(&mut record.profile);
        validate_profile(&record.profile, self.clock.now().date_naive())?;

        self.repository.update(record.clone())?;
        info!(resident_id = %record.id, "resident profile updated");
        Ok(record)
    }

    pub fn remove(&self, id: &ResidentId) -> Result<(), DirectoryError> {
        self.get(id)?;
        self.repository.remove(id)?;
        info!(resident_id = %id, "resident removed");
        Ok(())
    }

    /// Register every row of a CSV export. Invalid or duplicate rows are skipped and reported;
    /// unreadable CSV or an unavailable store aborts the import.
    pub fn import<Rd: Read>(&self, reader: Rd) -> Result<ImportSummary, ResidentImportError> {
        let mut summary = ImportSummary::default();

        for row in parse_rows(reader)? {
            let registration = match row.registration {
                Ok(registration) => registration,
                Err(reason) => {
                    summary.skipped.push(SkippedRow {
                        line: row.line,
                        reason,
                    });
                    continue;
                }
            };

            match self.register(registration) {
                Ok(_) => summary.registered += 1,
                Err(DirectoryError::Storage(err)) => {
                    return Err(ResidentImportError::Storage(err));
                }
                Err(err) => summary.skipped.push(SkippedRow {
                    line: row.line,
                    reason: err.to_string(),
                }),
            }
        }

        if !summary.skipped.is_empty() {
            warn!(
                registered = summary.registered,
                skipped = summary.skipped.len(),
                "resident import skipped rows"
            );
        }
        Ok(summary)
    }
}

/// Error raised by the resident directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("resident {0} not found")]
    NotFound(ResidentId),
    #[error("a resident with NIC {0} is already registered")]
    DuplicateNic(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

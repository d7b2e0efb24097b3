use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::info;

use super::domain::{
    ApplicationId, WelfareApplication, WelfareDecision, WelfareProgram, WelfareStatus,
    WelfareSubmission,
};
use super::repository::WelfareRepository;
use crate::clock::Clock;
use crate::notifications::{deliver, Notification, NotificationDispatcher, NotificationTemplate};
use crate::repository::RepositoryError;
use crate::residents::{ResidentId, ResidentRepository};

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

const MAX_REPAYMENT_MONTHS: u8 = 60;
const MAX_NOTE_CHARS: usize = 500;

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("wf-{id:06}"))
}

/// Intake and officer review of Samurdhi and microfinance applications.
pub struct WelfareService<W, R, N> {
    applications: Arc<W>,
    residents: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<W, R, N> WelfareService<W, R, N>
where
    W: WelfareRepository + 'static,
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(
        applications: Arc<W>,
        residents: Arc<R>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            applications,
            residents,
            notifier,
            clock,
        }
    }

    pub fn submit(
        &self,
        resident_id: &ResidentId,
        submission: WelfareSubmission,
    ) -> Result<WelfareApplication, WelfareError> {
        if self.residents.fetch(resident_id)?.is_none() {
            return Err(WelfareError::ResidentNotFound(resident_id.clone()));
        }
        let submission = validate_submission(submission)?;

        let duplicate = self
            .applications
            .for_resident(resident_id)?
            .iter()
            .any(|existing| existing.program == submission.program && existing.status.is_open());
        if duplicate {
            return Err(WelfareError::DuplicateOpenApplication(submission.program));
        }

        let application = WelfareApplication {
            id: next_application_id(),
            resident_id: resident_id.clone(),
            program: submission.program,
            household_monthly_income: submission.household_monthly_income,
            household_size: submission.household_size,
            requested_amount: submission.requested_amount,
            purpose: submission.purpose,
            repayment_months: submission.repayment_months,
            status: WelfareStatus::Submitted,
            submitted_at: self.clock.now(),
            decided_at: None,
            decision_note: None,
        };
        let stored = self.applications.insert(application)?;
        info!(
            application_id = %stored.id,
            resident_id = %stored.resident_id,
            program = stored.program.label(),
            "welfare application submitted"
        );
        Ok(stored)
    }

    /// Approve or reject an open application and tell the resident.
    pub fn decide(
        &self,
        id: &ApplicationId,
        decision: WelfareDecision,
    ) -> Result<WelfareApplication, WelfareError> {
        let mut application = self.load(id)?;
        if !application.status.is_open() {
            return Err(WelfareError::AlreadyClosed(application.status));
        }
        let note = decision
            .note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());
        if note
            .as_ref()
            .is_some_and(|note| note.chars().count() > MAX_NOTE_CHARS)
        {
            return Err(WelfareError::Validation(format!(
                "note must be at most {MAX_NOTE_CHARS} characters"
            )));
        }

        application.status = if decision.approved {
            WelfareStatus::Approved
        } else {
            WelfareStatus::Rejected
        };
        application.decided_at = Some(self.clock.now());
        application.decision_note = note;
        self.applications.update(application.clone())?;
        info!(
            application_id = %application.id,
            status = application.status.label(),
            "welfare application decided"
        );

        let recipient = self
            .residents
            .fetch(&application.resident_id)?
            .and_then(|record| record.profile.email);
        let mut notification = Notification::new(
            NotificationTemplate::WelfareDecided,
            application.resident_id.clone(),
        )
        .to_recipient(recipient)
        .with_detail("application_id", application.id.0.clone())
        .with_detail("program", application.program.label())
        .with_detail("status", application.status.label());
        if let Some(note) = &application.decision_note {
            notification = notification.with_detail("note", note.clone());
        }
        deliver(self.notifier.as_ref(), notification);

        Ok(application)
    }

    /// Residents may pull back their own application while it is still open.
    pub fn withdraw(
        &self,
        id: &ApplicationId,
        resident_id: &ResidentId,
    ) -> Result<WelfareApplication, WelfareError> {
        let mut application = self.load(id)?;
        if &application.resident_id != resident_id {
            return Err(WelfareError::NotOwner);
        }
        if !application.status.is_open() {
            return Err(WelfareError::AlreadyClosed(application.status));
        }

        application.status = WelfareStatus::Withdrawn;
        application.decided_at = Some(self.clock.now());
        self.applications.update(application.clone())?;
        info!(application_id = %application.id, "welfare application withdrawn");
        Ok(application)
    }

    /// Applications of one resident, newest first.
    pub fn for_resident(
        &self,
        resident_id: &ResidentId,
    ) -> Result<Vec<WelfareApplication>, WelfareError> {
        let mut applications = self.applications.for_resident(resident_id)?;
        applications.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(applications)
    }

    /// Officer queue of open applications, oldest first.
    pub fn open(&self) -> Result<Vec<WelfareApplication>, WelfareError> {
        let mut applications: Vec<WelfareApplication> = self
            .applications
            .list()?
            .into_iter()
            .filter(|application| application.status.is_open())
            .collect();
        applications.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(applications)
    }

    fn load(&self, id: &ApplicationId) -> Result<WelfareApplication, WelfareError> {
        self.applications
            .fetch(id)?
            .ok_or_else(|| WelfareError::NotFound(id.clone()))
    }
}

fn validate_submission(
    mut submission: WelfareSubmission,
) -> Result<WelfareSubmission, WelfareError> {
    if submission.household_size == 0 {
        return Err(WelfareError::Validation(
            "household_size must be at least 1".to_string(),
        ));
    }
    submission.purpose = submission
        .purpose
        .map(|purpose| purpose.trim().to_string())
        .filter(|purpose| !purpose.is_empty());

    if submission.program == WelfareProgram::Microfinance {
        if !submission.requested_amount.is_some_and(|amount| amount > 0) {
            return Err(WelfareError::Validation(
                "microfinance applications need a requested_amount above zero".to_string(),
            ));
        }
        if submission.purpose.is_none() {
            return Err(WelfareError::Validation(
                "microfinance applications need a purpose".to_string(),
            ));
        }
        match submission.repayment_months {
            Some(months) if (1..=MAX_REPAYMENT_MONTHS).contains(&months) => {}
            _ => {
                return Err(WelfareError::Validation(format!(
                    "repayment_months must be between 1 and {MAX_REPAYMENT_MONTHS}"
                )))
            }
        }
    }

    Ok(submission)
}

#[derive(Debug, thiserror::Error)]
pub enum WelfareError {
    #[error("resident {0} not found")]
    ResidentNotFound(ResidentId),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("{0}")]
    Validation(String),
    #[error("an open {} application already exists", .0.label())]
    DuplicateOpenApplication(WelfareProgram),
    #[error("application is already {}", .0.label())]
    AlreadyClosed(WelfareStatus),
    #[error("application belongs to another resident")]
    NotOwner,
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

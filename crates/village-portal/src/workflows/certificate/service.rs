use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::document::{CertificateDocument, CertificateRenderer};
use super::state::{cooldown_days_left, render_status_badge, CertificateState};
use crate::clock::Clock;
use crate::config::{CertificateSettings, OfficeDetails};
use crate::notifications::{deliver, Notification, NotificationDispatcher, NotificationTemplate};
use crate::repository::RepositoryError;
use crate::residents::{ResidentId, ResidentRecord, ResidentRepository};

const MAX_REJECTION_REASON_CHARS: usize = 500;

/// Officer decision on a pending certificate request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateDecision {
    pub resident_id: ResidentId,
    pub approved: bool,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Sanitized certificate status returned to residents and officers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateStatusView {
    pub resident_id: ResidentId,
    pub full_name: String,
    pub state: CertificateState,
    pub badge: &'static str,
    pub request_date: Option<DateTime<Utc>>,
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reapply_in_days: Option<u32>,
}

/// Request/decide/cancel transitions over the certificate fields of a resident record.
pub struct CertificateWorkflowService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    settings: CertificateSettings,
    renderer: CertificateRenderer,
}

impl<R, N> CertificateWorkflowService<R, N>
where
    R: ResidentRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
        settings: CertificateSettings,
        office: OfficeDetails,
    ) -> Self {
        Self {
            repository,
            notifier,
            clock,
            settings,
            renderer: CertificateRenderer::new(office),
        }
    }

    /// Submit a request, or reapply once the cooldown after a rejection has elapsed.
    pub fn request(
        &self,
        resident_id: &ResidentId,
    ) -> Result<CertificateStatusView, CertificateError> {
        let mut record = self.load(resident_id)?;
        let now = self.clock.now();

        match CertificateState::of(&record.certificate) {
            CertificateState::Pending | CertificateState::Approved => {
                return Err(CertificateError::AlreadySubmitted);
            }
            CertificateState::Rejected => {
                if let Some(last_request) = record.certificate.request_date {
                    if let Some(days_left) =
                        cooldown_days_left(last_request, now, self.settings.cooldown())
                    {
                        return Err(CertificateError::CooldownActive { days_left });
                    }
                }
            }
            CertificateState::NotRequested => {}
        }

        let reapplied = record.certificate.approved == Some(false);
        let certificate = &mut record.certificate;
        certificate.requested = true;
        certificate.approved = None;
        certificate.rejection_reason = None;
        certificate.request_date = Some(now);
        certificate.requested_at = Some(now);

        self.repository.update(record.clone())?;
        info!(resident_id = %resident_id, reapplied, "certificate requested");
        Ok(self.view(&record, now))
    }

    /// Record an officer decision. A request must be outstanding.
    pub fn decide(
        &self,
        decision: CertificateDecision,
    ) -> Result<CertificateStatusView, CertificateError> {
        let mut record = self.load(&decision.resident_id)?;
        if !record.certificate.requested {
            return Err(CertificateError::NoActiveRequest);
        }

        let reason = normalize_reason(decision.rejection_reason)?;
        let now = self.clock.now();
        let before = record.certificate.clone();
        let previous = CertificateState::of(&before);

        record.certificate.approved = Some(decision.approved);
        record.certificate.rejection_reason = if decision.approved { None } else { reason };

        let state = CertificateState::of(&record.certificate);
        if record.certificate != before {
            self.repository.update(record.clone())?;
        }
        info!(
            resident_id = %record.id,
            from = previous.label(),
            to = state.label(),
            "certificate decision recorded"
        );

        if state != previous {
            self.notify_decision(&record);
        }
        Ok(self.view(&record, now))
    }

    /// Withdraw a pending request and reset the workflow.
    ///
    /// Decided requests cannot be withdrawn, so a rejection keeps its cooldown.
    pub fn cancel(
        &self,
        resident_id: &ResidentId,
    ) -> Result<CertificateStatusView, CertificateError> {
        let mut record = self.load(resident_id)?;
        if CertificateState::of(&record.certificate) != CertificateState::Pending {
            return Err(CertificateError::NothingToCancel);
        }

        let now = self.clock.now();
        let certificate = &mut record.certificate;
        certificate.requested = false;
        certificate.approved = None;
        certificate.request_date = None;
        certificate.rejection_reason = None;
        certificate.requested_at = Some(now);

        self.repository.update(record.clone())?;
        info!(resident_id = %resident_id, "certificate request cancelled");
        Ok(self.view(&record, now))
    }

    pub fn status(
        &self,
        resident_id: &ResidentId,
    ) -> Result<CertificateStatusView, CertificateError> {
        let record = self.load(resident_id)?;
        Ok(self.view(&record, self.clock.now()))
    }

    /// Outstanding requests, oldest first, for the officer review queue.
    pub fn queue(&self) -> Result<Vec<CertificateStatusView>, CertificateError> {
        let now = self.clock.now();
        let mut records: Vec<ResidentRecord> = self
            .repository
            .list()?
            .into_iter()
            .filter(|record| record.certificate.requested)
            .collect();
        records.sort_by(|a, b| {
            a.certificate
                .request_date
                .cmp(&b.certificate.request_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(records
            .iter()
            .map(|record| self.view(record, now))
            .collect())
    }

    /// Render the certificate; only approved residents are eligible.
    pub fn document(
        &self,
        resident_id: &ResidentId,
    ) -> Result<CertificateDocument, CertificateError> {
        let record = self.load(resident_id)?;
        if record.certificate.approved != Some(true) {
            return Err(CertificateError::NotApproved);
        }

        Ok(self
            .renderer
            .render(&record, self.clock.now().date_naive()))
    }

    fn load(&self, resident_id: &ResidentId) -> Result<ResidentRecord, CertificateError> {
        self.repository
            .fetch(resident_id)?
            .ok_or_else(|| CertificateError::NotFound(resident_id.clone()))
    }

    fn view(&self, record: &ResidentRecord, now: DateTime<Utc>) -> CertificateStatusView {
        let certificate = &record.certificate;
        let state = CertificateState::of(certificate);
        let badge = render_status_badge(certificate, now, self.settings.freshness_window());
        let reapply_in_days = match (state, certificate.request_date) {
            (CertificateState::Rejected, Some(last_request)) => {
                cooldown_days_left(last_request, now, self.settings.cooldown())
            }
            _ => None,
        };

        CertificateStatusView {
            resident_id: record.id.clone(),
            full_name: record.profile.full_name.clone(),
            state,
            badge: badge.label(),
            request_date: certificate.request_date,
            requested_at: certificate.requested_at,
            rejection_reason: certificate.rejection_reason.clone(),
            reapply_in_days,
        }
    }

    fn notify_decision(&self, record: &ResidentRecord) {
        let notification = match record.certificate.approved {
            Some(true) => {
                Notification::new(NotificationTemplate::CertificateApproved, record.id.clone())
            }
            _ => Notification::new(NotificationTemplate::CertificateRejected, record.id.clone())
                .with_detail(
                    "reason",
                    record
                        .certificate
                        .rejection_reason
                        .clone()
                        .unwrap_or_else(|| "not stated".to_string()),
                )
                .with_detail(
                    "reapply_after_days",
                    self.settings.cooldown_days.to_string(),
                ),
        };
        deliver(
            self.notifier.as_ref(),
            notification.to_recipient(record.profile.email.clone()),
        );
    }
}

fn normalize_reason(reason: Option<String>) -> Result<Option<String>, CertificateError> {
    let reason = reason
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    match reason {
        Some(value) if value.chars().count() > MAX_REJECTION_REASON_CHARS => {
            Err(CertificateError::ValidationFailed(format!(
                "rejection_reason must be at most {MAX_REJECTION_REASON_CHARS} characters"
            )))
        }
        other => Ok(other),
    }
}

/// Typed failures of the certificate workflow.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("resident {0} not found")]
    NotFound(ResidentId),
    #[error("a certificate request has already been submitted")]
    AlreadySubmitted,
    #[error("certificate was rejected recently; you can reapply in {days_left} day(s)")]
    CooldownActive { days_left: u32 },
    #[error("there is no certificate request to cancel")]
    NothingToCancel,
    #[error("no certificate request is awaiting a decision")]
    NoActiveRequest,
    #[error("certificate has not been approved")]
    NotApproved,
    #[error("{0}")]
    ValidationFailed(String),
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::residents::ResidentId;

/// Outbound message describing a state change a resident should hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: NotificationTemplate,
    pub resident_id: ResidentId,
    pub recipient: Option<String>,
    pub details: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(template: NotificationTemplate, resident_id: ResidentId) -> Self {
        Self {
            template,
            resident_id,
            recipient: None,
            details: BTreeMap::new(),
        }
    }

    pub fn to_recipient(mut self, recipient: Option<String>) -> Self {
        self.recipient = recipient;
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    ResidentRegistered,
    CertificateApproved,
    CertificateRejected,
    WelfareDecided,
}

impl NotificationTemplate {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ResidentRegistered => "resident_registered",
            Self::CertificateApproved => "certificate_approved",
            Self::CertificateRejected => "certificate_rejected",
            Self::WelfareDecided => "welfare_decided",
        }
    }
}

/// Transport for notifications (e-mail, SMS, in-app toast).
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Dispatcher that records notifications in the service log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDispatcher;

impl NotificationDispatcher for TracingDispatcher {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            template = notification.template.label(),
            resident_id = %notification.resident_id,
            recipient = notification.recipient.as_deref().unwrap_or("-"),
            details = ?notification.details,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Fire-and-forget delivery: failures are logged and never reach the caller.
pub(crate) fn deliver<N>(dispatcher: &N, notification: Notification)
where
    N: NotificationDispatcher + ?Sized,
{
    let template = notification.template;
    let resident_id = notification.resident_id.clone();
    if let Err(err) = dispatcher.dispatch(notification) {
        warn!(
            template = template.label(),
            resident_id = %resident_id,
            error = %err,
            "notification dropped"
        );
    }
}

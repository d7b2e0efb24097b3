//! Character certificate workflow.
//!
//! A resident requests a certificate, an officer approves or rejects it, and an approved resident
//! downloads the rendered document. After a rejection the resident waits out a cooldown before
//! requesting again. Two timestamps live on the record: `request_date` drives the cooldown and
//! `requested_at` drives the short-lived dashboard badges.

pub mod document;
pub mod router;
pub mod service;
pub mod state;

#[cfg(test)]
mod tests;

pub use document::{CertificateDocument, CertificateRenderer};
pub use router::certificate_router;
pub use service::{
    CertificateDecision, CertificateError, CertificateStatusView, CertificateWorkflowService,
};
pub use state::{cooldown_days_left, render_status_badge, CertificateBadge, CertificateState};

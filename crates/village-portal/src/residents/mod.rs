//! Resident directory: registration, profile maintenance, and CSV bulk import.
//!
//! Resident records also carry the certificate workflow fields; the directory creates them with
//! defaults and `workflows::certificate` owns every later mutation.

pub mod domain;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    CertificateFields, ConductAssessment, ConductRating, EmergencyContact, FamilyMember,
    ProfileUpdate, ResidentId, ResidentProfile, ResidentRecord, ResidentRegistration,
    ResidentRole, ResidentSummary,
};
pub use import::{ImportSummary, ResidentImportError, SkippedRow};
pub use repository::ResidentRepository;
pub use router::resident_router;
pub use service::{DirectoryError, ResidentDirectoryService};
pub use validation::ValidationError;

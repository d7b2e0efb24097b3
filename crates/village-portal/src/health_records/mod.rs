//! Maternal and child health records with clinic visit history.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{ClinicVisit, HealthRecord, HealthRecordId, HealthRecordKind, UpcomingVisit};
pub use repository::HealthRecordRepository;
pub use router::health_router;
pub use service::{HealthRecordError, HealthRecordService};

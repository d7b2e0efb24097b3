use super::domain::{HealthRecord, HealthRecordId};
use crate::repository::RepositoryError;
use crate::residents::ResidentId;

pub trait HealthRecordRepository: Send + Sync {
    fn insert(&self, record: HealthRecord) -> Result<HealthRecord, RepositoryError>;
    fn update(&self, record: HealthRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &HealthRecordId) -> Result<Option<HealthRecord>, RepositoryError>;
    fn for_resident(&self, resident_id: &ResidentId)
        -> Result<Vec<HealthRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<HealthRecord>, RepositoryError>;
}

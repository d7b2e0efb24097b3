use super::domain::{ResidentId, ResidentRecord};
use crate::repository::RepositoryError;

/// Storage abstraction for resident documents, including the certificate fields.
pub trait ResidentRepository: Send + Sync {
    fn insert(&self, record: ResidentRecord) -> Result<ResidentRecord, RepositoryError>;
    fn update(&self, record: ResidentRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ResidentId) -> Result<Option<ResidentRecord>, RepositoryError>;
    fn find_by_nic(&self, nic: &str) -> Result<Option<ResidentRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<ResidentRecord>, RepositoryError>;
    fn remove(&self, id: &ResidentId) -> Result<(), RepositoryError>;
}

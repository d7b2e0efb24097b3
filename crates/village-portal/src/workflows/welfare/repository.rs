use super::domain::{ApplicationId, WelfareApplication};
use crate::repository::RepositoryError;
use crate::residents::ResidentId;

/// Storage abstraction for welfare applications.
pub trait WelfareRepository: Send + Sync {
    fn insert(&self, application: WelfareApplication)
        -> Result<WelfareApplication, RepositoryError>;
    fn update(&self, application: WelfareApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<WelfareApplication>, RepositoryError>;
    fn for_resident(
        &self,
        resident_id: &ResidentId,
    ) -> Result<Vec<WelfareApplication>, RepositoryError>;
    fn list(&self) -> Result<Vec<WelfareApplication>, RepositoryError>;
}

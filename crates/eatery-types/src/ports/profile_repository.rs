use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::profile::Profile;
use crate::ports::order_repository::RepoError;

#[async_trait]
pub trait ProfileRepository: Send + Sync + 'static {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, RepoError>;
    /// Newest first.
    async fn list_profiles(&self) -> Result<Vec<Profile>, RepoError>;
    async fn upsert_profile(&self, profile: Profile) -> Result<Profile, RepoError>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<Profile>, RepoError>;
}

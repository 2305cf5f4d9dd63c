use async_trait::async_trait;

use crate::errors::Result;
use crate::profiles::profiles_model::{ProfileAggregate, ProfileUpdate};

/// Trait for profile aggregate repository operations
#[async_trait]
pub trait ProfileRepositoryTrait: Send + Sync {
    fn get_profile(&self, user_id: &str) -> Result<Option<ProfileAggregate>>;

    /// Creates the profile on first write, otherwise updates the user-owned fields.
    async fn upsert_profile(&self, profile: ProfileUpdate) -> Result<ProfileAggregate>;

    /// Every user that owns a profile or at least one position row.
    fn list_user_ids(&self) -> Result<Vec<String>>;

    /// Removes the profile together with all positions and snapshots of the user.
    async fn delete_user(&self, user_id: &str) -> Result<usize>;
}

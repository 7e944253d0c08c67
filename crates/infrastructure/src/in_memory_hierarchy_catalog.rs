use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use rostra_application::HierarchyCatalog;
use rostra_core::{AppResult, GroupId};
use rostra_domain::GroupProfile;

/// In-memory hierarchy catalog for tests and local development.
#[derive(Default)]
pub struct InMemoryHierarchyCatalog {
    profiles: RwLock<HashMap<GroupId, GroupProfile>>,
}

impl InMemoryHierarchyCatalog {
    /// Creates a catalog seeded with the given group profiles.
    #[must_use]
    pub fn with_profiles(profiles: Vec<GroupProfile>) -> Self {
        Self {
            profiles: RwLock::new(
                profiles
                    .into_iter()
                    .map(|profile| (profile.group_id, profile))
                    .collect(),
            ),
        }
    }

    /// Inserts or replaces a group profile.
    pub async fn set_profile(&self, profile: GroupProfile) {
        self.profiles.write().await.insert(profile.group_id, profile);
    }
}

#[async_trait]
impl HierarchyCatalog for InMemoryHierarchyCatalog {
    async fn group_profile(&self, group_id: GroupId) -> AppResult<Option<GroupProfile>> {
        Ok(self.profiles.read().await.get(&group_id).cloned())
    }
}

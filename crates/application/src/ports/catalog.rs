use async_trait::async_trait;

use rostra_core::{AppResult, GroupId};
use rostra_domain::GroupProfile;

/// Read-only port onto the hierarchy catalog.
///
/// The profile returned reflects the catalog at call time; callers must
/// not cache it across validations, since a group's assignable types can
/// change between a record's creation and a later check.
#[async_trait]
pub trait HierarchyCatalog: Send + Sync {
    /// Returns the group's current catalog profile, if the group exists.
    async fn group_profile(&self, group_id: GroupId) -> AppResult<Option<GroupProfile>>;
}

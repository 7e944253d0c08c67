//! Hierarchy catalog read model.

use rostra_core::GroupId;
use serde::{Deserialize, Serialize};

use crate::assignment::RoleTypeTag;

/// Per-group snapshot of the hierarchy catalog.
///
/// The catalog is the source of truth for which role types may be
/// assigned within a group. Validity is always checked against the
/// snapshot fetched at validation time; the set can change between a
/// record's creation and a later validation, and the current set governs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProfile {
    /// Group identity.
    pub group_id: GroupId,
    /// Display name of the group.
    pub name: String,
    /// Structural parent in the hierarchy, absent for root groups.
    pub parent_id: Option<GroupId>,
    /// Role types currently assignable within this group.
    pub assignable_types: Vec<RoleTypeTag>,
}

impl GroupProfile {
    /// Returns true when the group currently supports the role type.
    #[must_use]
    pub fn supports(&self, role_type: &RoleTypeTag) -> bool {
        self.assignable_types.contains(role_type)
    }
}

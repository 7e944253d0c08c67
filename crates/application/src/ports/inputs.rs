use chrono::NaiveDate;
use serde_json::{Map, Value};

use rostra_core::{GroupId, PersonId};
use rostra_domain::RoleTypeTag;

/// Caller-supplied fields for scheduling a role assignment.
///
/// References are optional so that validation can report every missing
/// piece at once instead of failing on the first.
#[derive(Debug, Clone, Default)]
pub struct ScheduleRoleInput {
    /// Person the assignment is for.
    pub person_id: Option<PersonId>,
    /// Group the assignment belongs to.
    pub group_id: Option<GroupId>,
    /// Date on which the assignment takes effect.
    pub effective_date: Option<NaiveDate>,
    /// Role type the assignment becomes upon conversion.
    pub target_role_type: Option<RoleTypeTag>,
    /// Optional free-text label carried through conversion.
    pub label: Option<String>,
    /// Optional deletion schedule carried through conversion.
    pub delete_on: Option<NaiveDate>,
    /// Free-form extra attributes carried through conversion.
    pub attrs: Map<String, Value>,
}

/// Caller-supplied fields for creating an active assignment directly.
#[derive(Debug, Clone)]
pub struct ActivateRoleInput {
    /// Person the assignment is for.
    pub person_id: PersonId,
    /// Group the assignment belongs to.
    pub group_id: GroupId,
    /// Role type to assign.
    pub role_type: RoleTypeTag,
    /// Optional free-text label.
    pub label: Option<String>,
    /// Optional deletion schedule.
    pub delete_on: Option<NaiveDate>,
    /// Free-form extra attributes.
    pub attrs: Map<String, Value>,
}

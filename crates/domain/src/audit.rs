//! Stable audit actions for the role assignment lifecycle.

use serde::{Deserialize, Serialize};

/// Audit actions emitted by application services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an active assignment is created.
    RoleCreated,
    /// Emitted when an active assignment is deleted.
    RoleDeleted,
    /// Emitted when an assignment is scheduled for a future date.
    RoleScheduled,
    /// Emitted when a pending scheduled assignment is corrected.
    RoleScheduleUpdated,
    /// Emitted when a pending scheduled assignment is cancelled.
    RoleScheduleCancelled,
    /// Emitted when a scheduled assignment converts to an active one.
    RoleConverted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "role.created",
            Self::RoleDeleted => "role.deleted",
            Self::RoleScheduled => "role.scheduled",
            Self::RoleScheduleUpdated => "role.schedule.updated",
            Self::RoleScheduleCancelled => "role.schedule.cancelled",
            Self::RoleConverted => "role.converted",
        }
    }
}

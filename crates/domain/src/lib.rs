//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod audit;
mod carry_forward;
mod catalog;
mod validation;

pub use assignment::{RoleAssignment, RoleKind, RoleTypeTag};
pub use audit::AuditAction;
pub use carry_forward::{CarryForwardPolicy, DEFAULT_EXCLUDED_ATTRS};
pub use catalog::GroupProfile;
pub use validation::{ScheduledRoleCandidate, ScheduledRoleViolation, validate_scheduled};

//! Ports consumed by the assignment and conversion services.

mod audit;
mod catalog;
mod hooks;
mod inputs;
mod store;

pub use audit::{AuditEvent, AuditRepository};
pub use catalog::HierarchyCatalog;
pub use hooks::{HookMode, LifecycleHooks};
pub use inputs::{ActivateRoleInput, ScheduleRoleInput};
pub use store::{RoleRecordStore, RoleRecordTransaction};

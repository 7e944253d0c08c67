//! Application services and ports.

#![forbid(unsafe_code)]

mod assignment_service;
mod conversion_service;
mod ports;

#[cfg(test)]
mod test_support;

pub use assignment_service::AssignmentService;
pub use conversion_service::ConversionService;
pub use ports::{
    ActivateRoleInput, AuditEvent, AuditRepository, HierarchyCatalog, HookMode, LifecycleHooks,
    RoleRecordStore, RoleRecordTransaction, ScheduleRoleInput,
};

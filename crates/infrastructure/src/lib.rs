//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_hierarchy_catalog;
mod in_memory_role_record_store;
mod postgres_audit_repository;
mod postgres_hierarchy_catalog;
mod postgres_role_record_store;
mod tracing_lifecycle_hooks;

pub use in_memory_hierarchy_catalog::InMemoryHierarchyCatalog;
pub use in_memory_role_record_store::InMemoryRoleRecordStore;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_hierarchy_catalog::PostgresHierarchyCatalog;
pub use postgres_role_record_store::PostgresRoleRecordStore;
pub use tracing_lifecycle_hooks::TracingLifecycleHooks;

use async_trait::async_trait;

use rostra_core::AppResult;
use rostra_domain::RoleAssignment;

/// Whether a store write fires the active lifecycle side effects.
///
/// Suppression is an explicit parameter rather than an implicit
/// skip-list so that tests can observe exactly which paths stay silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMode {
    /// Fire the side effects registered for the active lifecycle.
    Applied,
    /// Persist or remove the record without any side effects.
    Suppressed,
}

/// Side effects attached to the active assignment lifecycle.
///
/// Scheduled assignments never trigger these: a pending record is not
/// yet a real membership, so it must not propagate primary-group status
/// or toggle contact visibility.
#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// Fired after an active assignment is created; propagates primary
    /// group status to the person.
    async fn after_create_active(&self, record: &RoleAssignment) -> AppResult<()>;

    /// Fired after an active assignment is destroyed; resets the
    /// person's contact visibility.
    async fn after_destroy_active(&self, record: &RoleAssignment) -> AppResult<()>;
}

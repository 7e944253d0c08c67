use async_trait::async_trait;
use chrono::NaiveDate;

use rostra_core::{AppResult, RoleAssignmentId};
use rostra_domain::RoleAssignment;

use super::hooks::HookMode;

/// Port for role assignment record storage.
///
/// Deletion through [`soft_delete`](RoleRecordStore::soft_delete) only
/// marks the record; conversion purges its scheduled record through the
/// transactional [`RoleRecordTransaction::hard_delete_unhooked`], which
/// bypasses the marker entirely.
#[async_trait]
pub trait RoleRecordStore: Send + Sync {
    /// Finds a record by identity, soft-deleted records included.
    async fn find(&self, id: RoleAssignmentId) -> AppResult<Option<RoleAssignment>>;

    /// Persists a new record. `HookMode::Applied` fires the active
    /// lifecycle side effects for active records; scheduled records are
    /// always persisted with `HookMode::Suppressed`.
    async fn insert(&self, record: RoleAssignment, hooks: HookMode) -> AppResult<RoleAssignment>;

    /// Replaces an existing record's attributes in place.
    async fn update(&self, record: RoleAssignment) -> AppResult<RoleAssignment>;

    /// Marks a record as deleted without removing it. Hook mode governs
    /// the active-destroy side effects exactly as for create.
    async fn soft_delete(&self, id: RoleAssignmentId, hooks: HookMode) -> AppResult<()>;

    /// Enumerates live scheduled records whose effective date is on or
    /// before `as_of`, ordered by effective date ascending then identity
    /// ascending. Restartable and finite; the trigger uses this to pick
    /// conversion candidates deterministically.
    async fn due_for_conversion(&self, as_of: NaiveDate) -> AppResult<Vec<RoleAssignment>>;

    /// Counts every record, soft-deleted ones included. Conversion
    /// leaves this count unchanged: one hard delete offset by one
    /// create.
    async fn count_all_including_deleted(&self) -> AppResult<u64>;

    /// Opens a transaction for the conversion exchange.
    async fn begin(&self) -> AppResult<Box<dyn RoleRecordTransaction>>;
}

/// One storage transaction with guaranteed commit-or-rollback.
///
/// Both operations are unhooked: the records moving through a conversion
/// are not yet (or no longer) real memberships and must not perturb
/// group-wide derived state.
#[async_trait]
pub trait RoleRecordTransaction: Send {
    /// Persists a record without firing lifecycle side effects.
    async fn create_unhooked(&mut self, record: RoleAssignment) -> AppResult<RoleAssignment>;

    /// Permanently removes a record, bypassing the soft-delete marker.
    /// Fails when the record no longer exists, which a concurrently
    /// retrying caller treats as "already converted".
    async fn hard_delete_unhooked(&mut self, id: RoleAssignmentId) -> AppResult<()>;

    /// Commits all staged writes atomically.
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// Discards all staged writes.
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

use async_trait::async_trait;

use rostra_core::{AppResult, GroupId, PersonId};
use rostra_domain::AuditAction;

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Person the affected assignment belongs to.
    pub person_id: PersonId,
    /// Group the affected assignment belongs to.
    pub group_id: GroupId,
    /// Affected role assignment identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

//! The deferred role-type conversion engine.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use rostra_core::{AppError, AppResult, RoleAssignmentId};
use rostra_domain::{AuditAction, CarryForwardPolicy, RoleAssignment};

use crate::ports::{AuditEvent, AuditRepository, RoleRecordStore};

/// Transactionally replaces one scheduled assignment with one active
/// assignment carrying forward its substantive data.
///
/// The engine does not own the clock: an external trigger decides when
/// to run and enumerates candidates through
/// [`due_for_conversion`](ConversionService::due_for_conversion). The
/// engine never retries either; a failed conversion leaves the
/// scheduled record intact and the next sweep picks it up again.
pub struct ConversionService {
    store: Arc<dyn RoleRecordStore>,
    audit_repository: Arc<dyn AuditRepository>,
    carry_forward: CarryForwardPolicy,
}

impl ConversionService {
    /// Creates the engine with the default carry-forward policy.
    pub fn new(
        store: Arc<dyn RoleRecordStore>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self::with_policy(store, audit_repository, CarryForwardPolicy::default())
    }

    /// Creates the engine with a custom carry-forward policy.
    pub fn with_policy(
        store: Arc<dyn RoleRecordStore>,
        audit_repository: Arc<dyn AuditRepository>,
        carry_forward: CarryForwardPolicy,
    ) -> Self {
        Self {
            store,
            audit_repository,
            carry_forward,
        }
    }

    /// Enumerates scheduled assignments due on or before `as_of`,
    /// ordered by effective date ascending then identity ascending.
    pub async fn due_for_conversion(&self, as_of: NaiveDate) -> AppResult<Vec<RoleAssignment>> {
        self.store.due_for_conversion(as_of).await
    }

    /// Converts one scheduled assignment into an active one.
    ///
    /// The new record and the hard delete of the old one commit in a
    /// single transaction; on any failure the whole exchange rolls back
    /// and the scheduled record is guaranteed intact. A record that no
    /// longer exists as scheduled yields [`AppError::NotFound`], which a
    /// concurrently retrying trigger treats as "already converted".
    pub async fn convert(&self, id: RoleAssignmentId) -> AppResult<RoleAssignment> {
        let scheduled = self
            .store
            .find(id)
            .await?
            .filter(RoleAssignment::is_scheduled)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "role assignment '{id}' no longer exists as scheduled"
                ))
            })?;

        let replacement = self
            .carry_forward
            .replacement_for(&scheduled, Utc::now())?;

        let mut transaction = self.store.begin().await?;

        let created = match transaction.create_unhooked(replacement).await {
            Ok(created) => created,
            Err(error) => {
                transaction.rollback().await.ok();
                return Err(AppError::Conversion(format!(
                    "failed to persist the converted assignment for '{id}': {error}"
                )));
            }
        };

        if let Err(error) = transaction.hard_delete_unhooked(scheduled.id).await {
            transaction.rollback().await.ok();
            return Err(AppError::Conversion(format!(
                "failed to purge scheduled assignment '{id}': {error}"
            )));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Conversion(format!(
                "failed to commit conversion of '{id}': {error}"
            ))
        })?;

        // Past this point the exchange is durable; audit failures are
        // internal errors, never `Conversion`, whatever category the
        // repository reports.
        self.audit_repository
            .append_event(AuditEvent {
                action: AuditAction::RoleConverted,
                person_id: created.person_id,
                group_id: created.group_id,
                resource_id: created.id.to_string(),
                detail: Some(format!(
                    "converted '{}' into '{}' as {}",
                    scheduled.id, created.id, created.role_type
                )),
            })
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to record the conversion of '{id}' after commit: {error}"
                ))
            })?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests;

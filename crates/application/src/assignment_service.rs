//! Lifecycle of role assignments outside conversion.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use rostra_core::{AppError, AppResult, GroupId, RoleAssignmentId};
use rostra_domain::{
    AuditAction, RoleAssignment, RoleKind, RoleTypeTag, ScheduledRoleCandidate,
    validate_scheduled,
};

use crate::ports::{
    ActivateRoleInput, AuditEvent, AuditRepository, HierarchyCatalog, HookMode, RoleRecordStore,
    ScheduleRoleInput,
};

/// Manages active assignments and the pending life of scheduled ones.
///
/// Scheduled records are created, corrected, and cancelled here with
/// lifecycle hooks suppressed throughout; the hooked paths exist only
/// for active assignments. Conversion itself lives in
/// [`ConversionService`](crate::ConversionService).
pub struct AssignmentService {
    store: Arc<dyn RoleRecordStore>,
    catalog: Arc<dyn HierarchyCatalog>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AssignmentService {
    /// Creates the service over the given ports.
    pub fn new(
        store: Arc<dyn RoleRecordStore>,
        catalog: Arc<dyn HierarchyCatalog>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            store,
            catalog,
            audit_repository,
        }
    }

    /// Schedules a role assignment to take effect on a future date.
    ///
    /// The candidate is validated against the catalog snapshot fetched
    /// now; every violated invariant is reported in one error. The
    /// record is persisted with hooks suppressed.
    pub async fn create_scheduled(
        &self,
        input: ScheduleRoleInput,
        as_of: NaiveDate,
    ) -> AppResult<RoleAssignment> {
        let (person_id, group_id, effective_date, target_role_type) =
            self.validated_scheduled_fields(&input, as_of).await?;

        let mut record = RoleAssignment::new_scheduled(
            person_id,
            group_id,
            target_role_type,
            effective_date,
            Utc::now(),
        );
        record.label = input.label;
        record.delete_on = input.delete_on;
        record.attrs = input.attrs;
        record.strip_reserved_attrs();

        let record = self.store.insert(record, HookMode::Suppressed).await?;

        self.audit_repository
            .append_event(AuditEvent {
                action: AuditAction::RoleScheduled,
                person_id: record.person_id,
                group_id: record.group_id,
                resource_id: record.id.to_string(),
                detail: Some(record.describe()),
            })
            .await?;

        Ok(record)
    }

    /// Corrects a pending scheduled assignment's fields.
    ///
    /// The full rule set is re-checked against the catalog as it stands
    /// now, not as it stood when the record was created.
    pub async fn update_scheduled(
        &self,
        id: RoleAssignmentId,
        input: ScheduleRoleInput,
        as_of: NaiveDate,
    ) -> AppResult<RoleAssignment> {
        let existing = self.pending_scheduled(id).await?;

        let (person_id, group_id, effective_date, target_role_type) =
            self.validated_scheduled_fields(&input, as_of).await?;

        let mut updated = RoleAssignment {
            id: existing.id,
            person_id,
            group_id,
            role_type: target_role_type.clone(),
            kind: RoleKind::Scheduled,
            label: input.label,
            delete_on: input.delete_on,
            created_at: existing.created_at,
            deleted_at: None,
            effective_date: Some(effective_date),
            target_role_type: Some(target_role_type),
            attrs: input.attrs,
        };
        updated.strip_reserved_attrs();

        let updated = self.store.update(updated).await?;

        self.audit_repository
            .append_event(AuditEvent {
                action: AuditAction::RoleScheduleUpdated,
                person_id: updated.person_id,
                group_id: updated.group_id,
                resource_id: updated.id.to_string(),
                detail: Some(updated.describe()),
            })
            .await?;

        Ok(updated)
    }

    /// Cancels a pending scheduled assignment.
    ///
    /// This is the ordinary deletion path, unrelated to conversion: the
    /// record is soft-deleted and stays in history, and no lifecycle
    /// side effects fire.
    pub async fn cancel_scheduled(&self, id: RoleAssignmentId) -> AppResult<()> {
        let record = self.pending_scheduled(id).await?;

        self.store.soft_delete(id, HookMode::Suppressed).await?;

        self.audit_repository
            .append_event(AuditEvent {
                action: AuditAction::RoleScheduleCancelled,
                person_id: record.person_id,
                group_id: record.group_id,
                resource_id: record.id.to_string(),
                detail: Some(record.describe()),
            })
            .await?;

        Ok(())
    }

    /// Creates an active assignment with lifecycle hooks applied.
    pub async fn create_active(&self, input: ActivateRoleInput) -> AppResult<RoleAssignment> {
        let profile = self.group_profile(input.group_id).await?;
        if !profile.supports(&input.role_type) {
            return Err(AppError::Validation(format!(
                "role type '{}' is not assignable within group '{}'",
                input.role_type, profile.name
            )));
        }

        let mut record = RoleAssignment::new_active(
            input.person_id,
            input.group_id,
            input.role_type,
            Utc::now(),
        );
        record.label = input.label;
        record.delete_on = input.delete_on;
        record.attrs = input.attrs;
        record.strip_reserved_attrs();

        let record = self.store.insert(record, HookMode::Applied).await?;

        self.audit_repository
            .append_event(AuditEvent {
                action: AuditAction::RoleCreated,
                person_id: record.person_id,
                group_id: record.group_id,
                resource_id: record.id.to_string(),
                detail: Some(record.describe()),
            })
            .await?;

        Ok(record)
    }

    /// Soft-deletes an active assignment with lifecycle hooks applied.
    pub async fn delete_active(&self, id: RoleAssignmentId) -> AppResult<()> {
        let record = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role assignment '{id}' not found")))?;

        if record.kind != RoleKind::Active || record.is_soft_deleted() {
            return Err(AppError::Conflict(format!(
                "role assignment '{id}' is not an active assignment"
            )));
        }

        self.store.soft_delete(id, HookMode::Applied).await?;

        self.audit_repository
            .append_event(AuditEvent {
                action: AuditAction::RoleDeleted,
                person_id: record.person_id,
                group_id: record.group_id,
                resource_id: record.id.to_string(),
                detail: Some(record.describe()),
            })
            .await?;

        Ok(())
    }

    async fn pending_scheduled(&self, id: RoleAssignmentId) -> AppResult<RoleAssignment> {
        let record = self
            .store
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role assignment '{id}' not found")))?;

        if !record.is_scheduled() || record.is_soft_deleted() {
            return Err(AppError::Conflict(format!(
                "role assignment '{id}' is not a pending scheduled assignment"
            )));
        }

        Ok(record)
    }

    /// Runs the full validity check and unpacks the candidate fields.
    async fn validated_scheduled_fields(
        &self,
        input: &ScheduleRoleInput,
        as_of: NaiveDate,
    ) -> AppResult<(
        rostra_core::PersonId,
        GroupId,
        NaiveDate,
        RoleTypeTag,
    )> {
        let assignable_types = match input.group_id {
            Some(group_id) => Some(self.group_profile(group_id).await?.assignable_types),
            None => None,
        };

        let candidate = ScheduledRoleCandidate {
            person_id: input.person_id,
            group_id: input.group_id,
            effective_date: input.effective_date,
            target_role_type: input.target_role_type.clone(),
        };

        let violations =
            validate_scheduled(&candidate, assignable_types.as_deref(), as_of);
        if !violations.is_empty() {
            let messages: Vec<String> = violations
                .iter()
                .map(ToString::to_string)
                .collect();
            return Err(AppError::Validation(messages.join("; ")));
        }

        let (
            Some(person_id),
            Some(group_id),
            Some(effective_date),
            Some(target_role_type),
        ) = (
            candidate.person_id,
            candidate.group_id,
            candidate.effective_date,
            candidate.target_role_type,
        )
        else {
            return Err(AppError::Internal(
                "validated scheduled candidate is missing fields".to_owned(),
            ));
        };

        Ok((person_id, group_id, effective_date, target_role_type))
    }

    async fn group_profile(
        &self,
        group_id: GroupId,
    ) -> AppResult<rostra_domain::GroupProfile> {
        self.catalog
            .group_profile(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("group '{group_id}' not found")))
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::postgres::PgExecutor;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use rostra_application::{HookMode, LifecycleHooks, RoleRecordStore, RoleRecordTransaction};
use rostra_core::{AppError, AppResult, GroupId, PersonId, RoleAssignmentId};
use rostra_domain::{RoleAssignment, RoleKind, RoleTypeTag};

/// PostgreSQL-backed role record store.
pub struct PostgresRoleRecordStore {
    pool: PgPool,
    hooks: Arc<dyn LifecycleHooks>,
}

impl PostgresRoleRecordStore {
    /// Creates a store with the provided connection pool and lifecycle
    /// hooks.
    #[must_use]
    pub fn new(pool: PgPool, hooks: Arc<dyn LifecycleHooks>) -> Self {
        Self { pool, hooks }
    }
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    id: Uuid,
    person_id: Uuid,
    group_id: Uuid,
    role_type: String,
    kind: String,
    label: Option<String>,
    delete_on: Option<NaiveDate>,
    effective_date: Option<NaiveDate>,
    target_role_type: Option<String>,
    attrs: Value,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl RoleAssignmentRow {
    fn into_domain(self) -> AppResult<RoleAssignment> {
        let kind = RoleKind::parse(self.kind.as_str())?;

        let (effective_date, target_role_type) = match (kind, self.effective_date, self.target_role_type) {
            (RoleKind::Scheduled, Some(effective_date), Some(target_role_type)) => {
                (Some(effective_date), Some(RoleTypeTag::new(target_role_type)?))
            }
            (RoleKind::Active, None, None) => (None, None),
            _ => {
                return Err(AppError::Internal(format!(
                    "role assignment '{}' has inconsistent scheduled columns",
                    self.id
                )));
            }
        };

        let attrs = match self.attrs {
            Value::Object(attrs) => attrs,
            Value::Null => serde_json::Map::new(),
            _ => {
                return Err(AppError::Internal(format!(
                    "role assignment '{}' has a non-object attrs column",
                    self.id
                )));
            }
        };

        Ok(RoleAssignment {
            id: RoleAssignmentId::from_uuid(self.id),
            person_id: PersonId::from_uuid(self.person_id),
            group_id: GroupId::from_uuid(self.group_id),
            role_type: RoleTypeTag::new(self.role_type)?,
            kind,
            label: self.label,
            delete_on: self.delete_on,
            created_at: self.created_at,
            deleted_at: self.deleted_at,
            effective_date,
            target_role_type,
            attrs,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    id,
    person_id,
    group_id,
    role_type,
    kind,
    label,
    delete_on,
    effective_date,
    target_role_type,
    attrs,
    created_at,
    deleted_at
"#;

async fn insert_record<'e, E>(executor: E, record: &RoleAssignment) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO role_assignments (
            id,
            person_id,
            group_id,
            role_type,
            kind,
            label,
            delete_on,
            effective_date,
            target_role_type,
            attrs,
            created_at,
            deleted_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(record.id.as_uuid())
    .bind(record.person_id.as_uuid())
    .bind(record.group_id.as_uuid())
    .bind(record.role_type.as_str())
    .bind(record.kind.as_str())
    .bind(record.label.as_deref())
    .bind(record.delete_on)
    .bind(record.effective_date)
    .bind(
        record
            .target_role_type
            .as_ref()
            .map(RoleTypeTag::as_str),
    )
    .bind(Value::Object(record.attrs.clone()))
    .bind(record.created_at)
    .bind(record.deleted_at)
    .execute(executor)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to insert role assignment '{}': {error}",
            record.id
        ))
    })?;

    Ok(())
}

#[async_trait]
impl RoleRecordStore for PostgresRoleRecordStore {
    async fn find(&self, id: RoleAssignmentId) -> AppResult<Option<RoleAssignment>> {
        let row = sqlx::query_as::<_, RoleAssignmentRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM role_assignments
            WHERE id = $1
            "#
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load role assignment '{id}': {error}"))
        })?;

        row.map(RoleAssignmentRow::into_domain).transpose()
    }

    async fn insert(&self, record: RoleAssignment, hooks: HookMode) -> AppResult<RoleAssignment> {
        insert_record(&self.pool, &record).await?;

        if hooks == HookMode::Applied && record.kind == RoleKind::Active {
            self.hooks.after_create_active(&record).await?;
        }

        Ok(record)
    }

    async fn update(&self, record: RoleAssignment) -> AppResult<RoleAssignment> {
        let result = sqlx::query(
            r#"
            UPDATE role_assignments
            SET
                person_id = $2,
                group_id = $3,
                role_type = $4,
                kind = $5,
                label = $6,
                delete_on = $7,
                effective_date = $8,
                target_role_type = $9,
                attrs = $10,
                deleted_at = $11
            WHERE id = $1
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.person_id.as_uuid())
        .bind(record.group_id.as_uuid())
        .bind(record.role_type.as_str())
        .bind(record.kind.as_str())
        .bind(record.label.as_deref())
        .bind(record.delete_on)
        .bind(record.effective_date)
        .bind(
            record
                .target_role_type
                .as_ref()
                .map(RoleTypeTag::as_str),
        )
        .bind(Value::Object(record.attrs.clone()))
        .bind(record.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to update role assignment '{}': {error}",
                record.id
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role assignment '{}' not found",
                record.id
            )));
        }

        Ok(record)
    }

    async fn soft_delete(&self, id: RoleAssignmentId, hooks: HookMode) -> AppResult<()> {
        let record = self
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role assignment '{id}' not found")))?;

        let result = sqlx::query(
            r#"
            UPDATE role_assignments
            SET deleted_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to soft-delete role assignment '{id}': {error}"
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "role assignment '{id}' is already deleted"
            )));
        }

        if hooks == HookMode::Applied && record.kind == RoleKind::Active {
            self.hooks.after_destroy_active(&record).await?;
        }

        Ok(())
    }

    async fn due_for_conversion(&self, as_of: NaiveDate) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM role_assignments
            WHERE kind = 'scheduled'
              AND deleted_at IS NULL
              AND effective_date <= $1
            ORDER BY effective_date ASC, id ASC
            "#
        ))
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to enumerate scheduled assignments due on '{as_of}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(RoleAssignmentRow::into_domain)
            .collect()
    }

    async fn count_all_including_deleted(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM role_assignments
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to count role assignments: {error}"))
        })?;

        u64::try_from(count).map_err(|error| {
            AppError::Internal(format!("role assignment count out of range: {error}"))
        })
    }

    async fn begin(&self) -> AppResult<Box<dyn RoleRecordTransaction>> {
        let transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start role record transaction: {error}"
            ))
        })?;

        Ok(Box::new(PostgresRoleRecordTransaction { transaction }))
    }
}

struct PostgresRoleRecordTransaction {
    transaction: Transaction<'static, Postgres>,
}

#[async_trait]
impl RoleRecordTransaction for PostgresRoleRecordTransaction {
    async fn create_unhooked(&mut self, record: RoleAssignment) -> AppResult<RoleAssignment> {
        insert_record(&mut *self.transaction, &record).await?;
        Ok(record)
    }

    async fn hard_delete_unhooked(&mut self, id: RoleAssignmentId) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM role_assignments
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&mut *self.transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to hard-delete role assignment '{id}': {error}"
            ))
        })?;

        // Zero rows means a concurrent conversion already purged it;
        // the caller rolls back and treats the record as converted.
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "role assignment '{id}' no longer exists"
            )));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit role record transaction: {error}"))
        })
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.transaction.rollback().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to roll back role record transaction: {error}"
            ))
        })
    }
}

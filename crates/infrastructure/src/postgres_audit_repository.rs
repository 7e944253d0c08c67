use async_trait::async_trait;
use sqlx::PgPool;

use rostra_application::{AuditEvent, AuditRepository};
use rostra_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_audit_events (
                action,
                person_id,
                group_id,
                resource_id,
                detail
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.action.as_str())
        .bind(event.person_id.as_uuid())
        .bind(event.group_id.as_uuid())
        .bind(event.resource_id)
        .bind(event.detail)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }
}

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use rostra_application::HierarchyCatalog;
use rostra_core::{AppError, AppResult, GroupId};
use rostra_domain::{GroupProfile, RoleTypeTag};

/// PostgreSQL-backed hierarchy catalog reader.
#[derive(Clone)]
pub struct PostgresHierarchyCatalog {
    pool: PgPool,
}

impl PostgresHierarchyCatalog {
    /// Creates a catalog reader with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    parent_id: Option<Uuid>,
}

#[async_trait]
impl HierarchyCatalog for PostgresHierarchyCatalog {
    async fn group_profile(&self, group_id: GroupId) -> AppResult<Option<GroupProfile>> {
        let group = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT id, name, parent_id
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(group_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load group '{group_id}': {error}"))
        })?;

        let Some(group) = group else {
            return Ok(None);
        };

        let role_types: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT role_type
            FROM group_role_types
            WHERE group_id = $1
            ORDER BY role_type ASC
            "#,
        )
        .bind(group_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load role types for group '{group_id}': {error}"
            ))
        })?;

        let assignable_types = role_types
            .into_iter()
            .map(RoleTypeTag::new)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Some(GroupProfile {
            group_id: GroupId::from_uuid(group.id),
            name: group.name,
            parent_id: group.parent_id.map(GroupId::from_uuid),
            assignable_types,
        }))
    }
}

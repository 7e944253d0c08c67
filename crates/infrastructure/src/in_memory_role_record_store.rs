use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use rostra_application::{HookMode, LifecycleHooks, RoleRecordStore, RoleRecordTransaction};
use rostra_core::{AppError, AppResult, RoleAssignmentId};
use rostra_domain::{RoleAssignment, RoleKind};

type Records = Arc<Mutex<BTreeMap<RoleAssignmentId, RoleAssignment>>>;

/// In-memory role record store for tests and local development.
///
/// Transactions stage their writes and apply them under one lock at
/// commit, so the conversion exchange is atomic here exactly as it is
/// against Postgres.
pub struct InMemoryRoleRecordStore {
    records: Records,
    hooks: Arc<dyn LifecycleHooks>,
}

impl InMemoryRoleRecordStore {
    /// Creates an empty store firing the given lifecycle hooks.
    #[must_use]
    pub fn new(hooks: Arc<dyn LifecycleHooks>) -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
            hooks,
        }
    }
}

#[async_trait]
impl RoleRecordStore for InMemoryRoleRecordStore {
    async fn find(&self, id: RoleAssignmentId) -> AppResult<Option<RoleAssignment>> {
        Ok(self.records.lock().await.get(&id).cloned())
    }

    async fn insert(&self, record: RoleAssignment, hooks: HookMode) -> AppResult<RoleAssignment> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.id) {
            return Err(AppError::Conflict(format!(
                "role assignment '{}' already exists",
                record.id
            )));
        }

        records.insert(record.id, record.clone());
        drop(records);

        if hooks == HookMode::Applied && record.kind == RoleKind::Active {
            self.hooks.after_create_active(&record).await?;
        }

        Ok(record)
    }

    async fn update(&self, record: RoleAssignment) -> AppResult<RoleAssignment> {
        let mut records = self.records.lock().await;
        if !records.contains_key(&record.id) {
            return Err(AppError::NotFound(format!(
                "role assignment '{}' not found",
                record.id
            )));
        }

        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn soft_delete(&self, id: RoleAssignmentId, hooks: HookMode) -> AppResult<()> {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("role assignment '{id}' not found")))?;

        if record.deleted_at.is_some() {
            return Err(AppError::Conflict(format!(
                "role assignment '{id}' is already deleted"
            )));
        }

        record.deleted_at = Some(Utc::now());
        let record = record.clone();
        drop(records);

        if hooks == HookMode::Applied && record.kind == RoleKind::Active {
            self.hooks.after_destroy_active(&record).await?;
        }

        Ok(())
    }

    async fn due_for_conversion(&self, as_of: NaiveDate) -> AppResult<Vec<RoleAssignment>> {
        let records = self.records.lock().await;
        let mut due: Vec<RoleAssignment> = records
            .values()
            .filter(|record| {
                record.is_scheduled()
                    && !record.is_soft_deleted()
                    && record
                        .effective_date
                        .is_some_and(|effective_date| effective_date <= as_of)
            })
            .cloned()
            .collect();

        due.sort_by_key(|record| (record.effective_date, record.id));

        Ok(due)
    }

    async fn count_all_including_deleted(&self) -> AppResult<u64> {
        Ok(self.records.lock().await.len() as u64)
    }

    async fn begin(&self) -> AppResult<Box<dyn RoleRecordTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            records: self.records.clone(),
            staged: Vec::new(),
        }))
    }
}

enum StagedWrite {
    Create(RoleAssignment),
    HardDelete(RoleAssignmentId),
}

struct InMemoryTransaction {
    records: Records,
    staged: Vec<StagedWrite>,
}

#[async_trait]
impl RoleRecordTransaction for InMemoryTransaction {
    async fn create_unhooked(&mut self, record: RoleAssignment) -> AppResult<RoleAssignment> {
        if self.records.lock().await.contains_key(&record.id) {
            return Err(AppError::Conflict(format!(
                "role assignment '{}' already exists",
                record.id
            )));
        }

        self.staged.push(StagedWrite::Create(record.clone()));
        Ok(record)
    }

    async fn hard_delete_unhooked(&mut self, id: RoleAssignmentId) -> AppResult<()> {
        if !self.records.lock().await.contains_key(&id) {
            return Err(AppError::Conflict(format!(
                "role assignment '{id}' no longer exists"
            )));
        }

        self.staged.push(StagedWrite::HardDelete(id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut records = self.records.lock().await;

        // Re-verify every staged write under the lock before applying
        // any; a concurrent commit may have won the race since staging.
        for write in &self.staged {
            match write {
                StagedWrite::Create(record) => {
                    if records.contains_key(&record.id) {
                        return Err(AppError::Conflict(format!(
                            "role assignment '{}' already exists",
                            record.id
                        )));
                    }
                }
                StagedWrite::HardDelete(id) => {
                    if !records.contains_key(id) {
                        return Err(AppError::Conflict(format!(
                            "role assignment '{id}' no longer exists"
                        )));
                    }
                }
            }
        }

        for write in self.staged {
            match write {
                StagedWrite::Create(record) => {
                    records.insert(record.id, record);
                }
                StagedWrite::HardDelete(id) => {
                    records.remove(&id);
                }
            }
        }

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

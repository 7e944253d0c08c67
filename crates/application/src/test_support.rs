//! Shared fakes for application service tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use rostra_core::{AppError, AppResult, GroupId, RoleAssignmentId};
use rostra_domain::{GroupProfile, RoleAssignment, RoleKind};

use crate::ports::{
    AuditEvent, AuditRepository, HierarchyCatalog, HookMode, LifecycleHooks, RoleRecordStore,
    RoleRecordTransaction,
};

#[derive(Default)]
pub(crate) struct FakeHierarchyCatalog {
    profiles: Mutex<HashMap<GroupId, GroupProfile>>,
}

impl FakeHierarchyCatalog {
    pub(crate) fn with_profiles(profiles: Vec<GroupProfile>) -> Self {
        Self {
            profiles: Mutex::new(
                profiles
                    .into_iter()
                    .map(|profile| (profile.group_id, profile))
                    .collect(),
            ),
        }
    }

    /// Replaces a group's profile, simulating a catalog change between
    /// a record's creation and a later validation.
    pub(crate) async fn set_profile(&self, profile: GroupProfile) {
        self.profiles.lock().await.insert(profile.group_id, profile);
    }
}

#[async_trait]
impl HierarchyCatalog for FakeHierarchyCatalog {
    async fn group_profile(&self, group_id: GroupId) -> AppResult<Option<GroupProfile>> {
        Ok(self.profiles.lock().await.get(&group_id).cloned())
    }
}

#[derive(Default)]
pub(crate) struct RecordingAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
    append_failures: Mutex<u32>,
}

impl RecordingAuditRepository {
    pub(crate) async fn fail_next_appends(&self, count: u32) {
        *self.append_failures.lock().await = count;
    }
}

#[async_trait]
impl AuditRepository for RecordingAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        let mut failures = self.append_failures.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(AppError::Conflict(
                "simulated audit sink failure".to_owned(),
            ));
        }
        drop(failures);

        self.events.lock().await.push(event);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingLifecycleHooks {
    pub(crate) created: Mutex<Vec<RoleAssignmentId>>,
    pub(crate) destroyed: Mutex<Vec<RoleAssignmentId>>,
}

#[async_trait]
impl LifecycleHooks for RecordingLifecycleHooks {
    async fn after_create_active(&self, record: &RoleAssignment) -> AppResult<()> {
        self.created.lock().await.push(record.id);
        Ok(())
    }

    async fn after_destroy_active(&self, record: &RoleAssignment) -> AppResult<()> {
        self.destroyed.lock().await.push(record.id);
        Ok(())
    }
}

pub(crate) struct FakeRoleRecordStore {
    records: Arc<Mutex<BTreeMap<RoleAssignmentId, RoleAssignment>>>,
    hooks: Arc<RecordingLifecycleHooks>,
    pub(crate) create_failures: Arc<Mutex<u32>>,
}

impl FakeRoleRecordStore {
    pub(crate) fn new(hooks: Arc<RecordingLifecycleHooks>) -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
            hooks,
            create_failures: Arc::new(Mutex::new(0)),
        }
    }

    pub(crate) async fn fail_next_creates(&self, count: u32) {
        *self.create_failures.lock().await = count;
    }
}

#[async_trait]
impl RoleRecordStore for FakeRoleRecordStore {
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
        let record = records.get_mut(&id).ok_or_else(|| {
            AppError::NotFound(format!("role assignment '{id}' not found"))
        })?;

        record.deleted_at = Some(chrono::Utc::now());
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
        Ok(Box::new(FakeTransaction {
            records: self.records.clone(),
            create_failures: self.create_failures.clone(),
            staged: Vec::new(),
        }))
    }
}

enum StagedWrite {
    Create(RoleAssignment),
    HardDelete(RoleAssignmentId),
}

pub(crate) struct FakeTransaction {
    records: Arc<Mutex<BTreeMap<RoleAssignmentId, RoleAssignment>>>,
    create_failures: Arc<Mutex<u32>>,
    staged: Vec<StagedWrite>,
}

#[async_trait]
impl RoleRecordTransaction for FakeTransaction {
    async fn create_unhooked(&mut self, record: RoleAssignment) -> AppResult<RoleAssignment> {
        let mut failures = self.create_failures.lock().await;
        if *failures > 0 {
            *failures -= 1;
            return Err(AppError::Internal(
                "simulated storage failure on create".to_owned(),
            ));
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

        // All-or-nothing: verify every staged write before applying any.
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

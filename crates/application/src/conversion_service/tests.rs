use std::sync::Arc;

use chrono::NaiveDate;

use rostra_core::{AppError, GroupId, PersonId};
use rostra_domain::{AuditAction, GroupProfile, RoleKind, RoleTypeTag};

use crate::assignment_service::AssignmentService;
use crate::ports::{HookMode, RoleRecordStore, ScheduleRoleInput};
use crate::test_support::{
    FakeHierarchyCatalog, FakeRoleRecordStore, RecordingAuditRepository, RecordingLifecycleHooks,
};

use super::ConversionService;

fn tag(value: &str) -> RoleTypeTag {
    RoleTypeTag::new(value).unwrap_or_else(|_| unreachable!())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| unreachable!())
}

struct Harness {
    assignments: AssignmentService,
    conversions: ConversionService,
    store: Arc<FakeRoleRecordStore>,
    hooks: Arc<RecordingLifecycleHooks>,
    audit: Arc<RecordingAuditRepository>,
    group_id: GroupId,
    person_id: PersonId,
}

fn harness() -> Harness {
    let group_id = GroupId::new();
    let person_id = PersonId::new();
    let hooks = Arc::new(RecordingLifecycleHooks::default());
    let store = Arc::new(FakeRoleRecordStore::new(hooks.clone()));
    let catalog = Arc::new(FakeHierarchyCatalog::with_profiles(vec![GroupProfile {
        group_id,
        name: "Top Group".to_owned(),
        parent_id: None,
        assignable_types: vec![tag("Member"), tag("Leader")],
    }]));
    let audit = Arc::new(RecordingAuditRepository::default());
    let assignments = AssignmentService::new(store.clone(), catalog, audit.clone());
    let conversions = ConversionService::new(store.clone(), audit.clone());

    Harness {
        assignments,
        conversions,
        store,
        hooks,
        audit,
        group_id,
        person_id,
    }
}

async fn schedule_leader(harness: &Harness) -> rostra_domain::RoleAssignment {
    let mut attrs = serde_json::Map::new();
    attrs.insert(
        "cost_center".to_owned(),
        serde_json::Value::String("ops".to_owned()),
    );

    let record = harness
        .assignments
        .create_scheduled(
            ScheduleRoleInput {
                person_id: Some(harness.person_id),
                group_id: Some(harness.group_id),
                effective_date: Some(date(2023, 11, 4)),
                target_role_type: Some(tag("Leader")),
                label: Some("test".to_owned()),
                delete_on: NaiveDate::from_ymd_opt(2024, 2, 1),
                attrs,
            },
            date(2023, 11, 3),
        )
        .await;
    assert!(record.is_ok());
    record.unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn convert_exchanges_the_scheduled_record_for_one_active_record() {
    let harness = harness();
    let scheduled = schedule_leader(&harness).await;

    let before = harness.store.count_all_including_deleted().await;
    assert!(before.is_ok());

    let converted = harness.conversions.convert(scheduled.id).await;
    assert!(converted.is_ok());
    let converted = converted.unwrap_or_else(|_| unreachable!());

    assert_eq!(converted.kind, RoleKind::Active);
    assert_eq!(converted.role_type, tag("Leader"));
    assert_eq!(converted.person_id, harness.person_id);
    assert_eq!(converted.group_id, harness.group_id);

    let removed = harness.store.find(scheduled.id).await;
    assert!(removed.is_ok());
    assert!(removed.unwrap_or_default().is_none());

    let remaining = harness
        .conversions
        .due_for_conversion(date(2024, 1, 1))
        .await;
    assert!(remaining.is_ok());
    assert!(remaining.unwrap_or_default().is_empty());

    let after = harness.store.count_all_including_deleted().await;
    assert!(after.is_ok());
    assert_eq!(before.unwrap_or_default(), after.unwrap_or_default());
}

#[tokio::test]
async fn convert_carries_every_attribute_except_the_excluded_set() {
    let harness = harness();
    let scheduled = schedule_leader(&harness).await;

    let converted = harness.conversions.convert(scheduled.id).await;
    assert!(converted.is_ok());
    let converted = converted.unwrap_or_else(|_| unreachable!());

    assert_eq!(converted.label, Some("test".to_owned()));
    assert_eq!(converted.delete_on, NaiveDate::from_ymd_opt(2024, 2, 1));
    assert_eq!(
        converted.attrs.get("cost_center"),
        Some(&serde_json::Value::String("ops".to_owned()))
    );

    assert_ne!(converted.id, scheduled.id);
    assert!(converted.effective_date.is_none());
    assert!(converted.target_role_type.is_none());
    assert!(converted.created_at > scheduled.created_at);
}

#[tokio::test]
async fn convert_a_second_time_fails_distinguishably() {
    let harness = harness();
    let scheduled = schedule_leader(&harness).await;

    let first = harness.conversions.convert(scheduled.id).await;
    assert!(first.is_ok());

    let second = harness.conversions.convert(scheduled.id).await;
    assert!(matches!(second, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn convert_rolls_back_when_the_create_step_fails() {
    let harness = harness();
    let scheduled = schedule_leader(&harness).await;
    harness.store.fail_next_creates(1).await;

    let result = harness.conversions.convert(scheduled.id).await;
    assert!(matches!(result, Err(AppError::Conversion(_))));

    // The scheduled record is intact and retrievable afterwards.
    let stored = harness.store.find(scheduled.id).await;
    assert!(stored.is_ok());
    assert_eq!(stored.unwrap_or_default(), Some(scheduled.clone()));

    let count = harness.store.count_all_including_deleted().await;
    assert!(count.is_ok());
    assert_eq!(count.unwrap_or_default(), 1);

    // The next sweep retries naturally.
    let retried = harness.conversions.convert(scheduled.id).await;
    assert!(retried.is_ok());
}

#[tokio::test]
async fn convert_never_fires_lifecycle_hooks() {
    let harness = harness();
    let scheduled = schedule_leader(&harness).await;

    let converted = harness.conversions.convert(scheduled.id).await;
    assert!(converted.is_ok());

    assert!(harness.hooks.created.lock().await.is_empty());
    assert!(harness.hooks.destroyed.lock().await.is_empty());
}

#[tokio::test]
async fn audit_failure_after_commit_surfaces_as_internal() {
    let harness = harness();
    let scheduled = schedule_leader(&harness).await;
    harness.audit.fail_next_appends(1).await;

    let result = harness.conversions.convert(scheduled.id).await;
    assert!(matches!(result, Err(AppError::Internal(_))));

    // The exchange itself is durable; only the audit append failed.
    let removed = harness.store.find(scheduled.id).await;
    assert!(removed.is_ok());
    assert!(removed.unwrap_or_default().is_none());

    let count = harness.store.count_all_including_deleted().await;
    assert!(count.is_ok());
    assert_eq!(count.unwrap_or_default(), 1);
}

#[tokio::test]
async fn convert_appends_an_audit_event_after_commit() {
    let harness = harness();
    let scheduled = schedule_leader(&harness).await;

    let converted = harness.conversions.convert(scheduled.id).await;
    assert!(converted.is_ok());

    let events = harness.audit.events.lock().await;
    let last = events.last();
    assert!(last.is_some_and(|event| event.action == AuditAction::RoleConverted));
}

#[tokio::test]
async fn due_for_conversion_orders_by_effective_date_then_identity() {
    let harness = harness();

    let mut records = Vec::new();
    for effective in [date(2023, 11, 6), date(2023, 11, 4), date(2023, 11, 4)] {
        let record = rostra_domain::RoleAssignment::new_scheduled(
            harness.person_id,
            harness.group_id,
            tag("Member"),
            effective,
            chrono::Utc::now(),
        );
        let inserted = harness
            .store
            .insert(record.clone(), HookMode::Suppressed)
            .await;
        assert!(inserted.is_ok());
        records.push(record);
    }

    // One future and one soft-deleted record stay out of the sweep.
    let future = rostra_domain::RoleAssignment::new_scheduled(
        harness.person_id,
        harness.group_id,
        tag("Member"),
        date(2023, 12, 1),
        chrono::Utc::now(),
    );
    assert!(
        harness
            .store
            .insert(future, HookMode::Suppressed)
            .await
            .is_ok()
    );
    let cancelled = schedule_leader(&harness).await;
    assert!(
        harness
            .store
            .soft_delete(cancelled.id, HookMode::Suppressed)
            .await
            .is_ok()
    );

    let due = harness.conversions.due_for_conversion(date(2023, 11, 6)).await;
    assert!(due.is_ok());
    let due = due.unwrap_or_default();
    assert_eq!(due.len(), 3);

    let mut same_day: Vec<_> = records
        .iter()
        .filter(|record| record.effective_date == Some(date(2023, 11, 4)))
        .map(|record| record.id)
        .collect();
    same_day.sort();
    assert_eq!(due[0].id, same_day[0]);
    assert_eq!(due[1].id, same_day[1]);
    assert_eq!(due[2].effective_date, Some(date(2023, 11, 6)));
}

#[tokio::test]
async fn scheduled_leader_scenario_end_to_end() {
    let harness = harness();
    let scheduled = schedule_leader(&harness).await;

    assert_eq!(scheduled.describe(), "Leader (from 04.11.2023)");

    let due = harness.conversions.due_for_conversion(date(2023, 11, 4)).await;
    assert!(due.is_ok());
    let due = due.unwrap_or_default();
    assert_eq!(due.len(), 1);

    let converted = harness.conversions.convert(due[0].id).await;
    assert!(converted.is_ok());
    let converted = converted.unwrap_or_else(|_| unreachable!());
    assert_eq!(converted.person_id, harness.person_id);
    assert_eq!(converted.role_type, tag("Leader"));
    assert_eq!(converted.kind, RoleKind::Active);

    let remaining = harness
        .conversions
        .due_for_conversion(date(2024, 1, 1))
        .await;
    assert!(remaining.is_ok());
    assert!(remaining.unwrap_or_default().is_empty());
}

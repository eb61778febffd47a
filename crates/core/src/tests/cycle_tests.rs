// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{admin_ctx, member_ctx, ongoing_cycle, test_cause, FakeCycleStore};
use crate::cycles::CycleRepository;
use crate::error::EngineError;
use crate::ports::StoreError;
use hero_cycle_domain::{
    CycleStatus, DomainError, NominationPeriod, SkillId,
};
use time::macros::{date, datetime};

fn repository(store: &FakeCycleStore) -> CycleRepository<FakeCycleStore> {
    CycleRepository::new(store.clone(), "Europe/Paris")
}

#[tokio::test]
async fn test_schedule_requires_admin() {
    let store = FakeCycleStore::new();
    let mut repo = repository(&store);

    let result = repo
        .schedule_next_cycle(
            &member_ctx("emp-1"),
            test_cause(),
            SkillId::new("skill-leadership"),
            date!(2026 - 03 - 01),
            NominationPeriod::Monthly,
        )
        .await;

    assert!(matches!(result, Err(EngineError::Unauthorized { .. })));
    assert_eq!(store.put_calls(), 0);
}

#[tokio::test]
async fn test_schedule_derives_window_in_program_timezone() {
    let store = FakeCycleStore::new();
    let mut repo = repository(&store);

    let recorded = repo
        .schedule_next_cycle(
            &admin_ctx("admin-1"),
            test_cause(),
            SkillId::new("skill-leadership"),
            date!(2026 - 03 - 01),
            NominationPeriod::Monthly,
        )
        .await
        .unwrap();

    let cycle = recorded.value;
    assert_eq!(cycle.status, CycleStatus::Next);
    // 2026-03-01 00:01 in Paris (UTC+1) is 2026-02-28 23:01 UTC
    assert_eq!(cycle.start_date, datetime!(2026 - 02 - 28 23:01:00 UTC));
    // End date is start + 1 month - 1 day, at the last second of the day
    // in Paris (UTC+2 after the March DST switch)
    assert_eq!(cycle.end_date, datetime!(2026 - 03 - 31 21:59:59 UTC));
    // Validation window closes seven days after the end date
    assert_eq!(
        cycle.validation_end_date,
        datetime!(2026 - 04 - 07 21:59:59 UTC)
    );
}

#[tokio::test]
async fn test_schedule_rejects_overlap_with_ongoing_cycle() {
    let store = FakeCycleStore::new();
    store.set_ongoing(Some(ongoing_cycle("cycle-ongoing")));
    let mut repo = repository(&store);

    // The ongoing cycle runs through 2026-01-31; a next cycle starting
    // mid-January must be rejected
    let result = repo
        .schedule_next_cycle(
            &admin_ctx("admin-1"),
            test_cause(),
            SkillId::new("skill-teamwork"),
            date!(2026 - 01 - 20),
            NominationPeriod::Monthly,
        )
        .await;

    assert!(matches!(
        result,
        Err(EngineError::Validation(DomainError::CycleOverlap { .. }))
    ));
    assert_eq!(store.put_calls(), 0);
}

#[tokio::test]
async fn test_schedule_allows_start_after_ongoing_end() {
    let store = FakeCycleStore::new();
    store.set_ongoing(Some(ongoing_cycle("cycle-ongoing")));
    let mut repo = repository(&store);

    let result = repo
        .schedule_next_cycle(
            &admin_ctx("admin-1"),
            test_cause(),
            SkillId::new("skill-teamwork"),
            date!(2026 - 02 - 01),
            NominationPeriod::Monthly,
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(store.put_calls(), 1);
}

#[tokio::test]
async fn test_schedule_overwrites_existing_next_cycle() {
    let store = FakeCycleStore::new();
    let mut repo = repository(&store);
    let admin = admin_ctx("admin-1");

    repo.schedule_next_cycle(
        &admin,
        test_cause(),
        SkillId::new("skill-leadership"),
        date!(2026 - 03 - 01),
        NominationPeriod::Monthly,
    )
    .await
    .unwrap();

    let second = repo
        .schedule_next_cycle(
            &admin,
            test_cause(),
            SkillId::new("skill-teamwork"),
            date!(2026 - 04 - 01),
            NominationPeriod::BiMonthly,
        )
        .await
        .unwrap();

    let next = store.next_cycle_row().unwrap();
    assert_eq!(next, second.value);
    assert_eq!(next.skill_id, SkillId::new("skill-teamwork"));
    assert_eq!(next.period, NominationPeriod::BiMonthly);
}

#[tokio::test]
async fn test_schedule_audit_event_names_the_action() {
    let store = FakeCycleStore::new();
    let mut repo = repository(&store);

    let recorded = repo
        .schedule_next_cycle(
            &admin_ctx("admin-1"),
            test_cause(),
            SkillId::new("skill-leadership"),
            date!(2026 - 03 - 01),
            NominationPeriod::Monthly,
        )
        .await
        .unwrap();

    assert_eq!(recorded.audit_event.action.name, "ScheduleNextCycle");
    assert_eq!(recorded.audit_event.actor.actor_type, "admin");
    assert_eq!(
        recorded.audit_event.cycle_id,
        Some(recorded.value.cycle_id)
    );
}

#[tokio::test]
async fn test_delete_ongoing_requires_admin() {
    let store = FakeCycleStore::new();
    store.set_ongoing(Some(ongoing_cycle("cycle-ongoing")));
    let mut repo = repository(&store);

    let result = repo
        .delete_ongoing_cycle(&member_ctx("emp-1"), test_cause())
        .await;

    assert!(matches!(result, Err(EngineError::Unauthorized { .. })));
    assert!(store.ongoing_row().is_some());
}

#[tokio::test]
async fn test_delete_ongoing_clears_the_cycle() {
    let store = FakeCycleStore::new();
    store.set_ongoing(Some(ongoing_cycle("cycle-ongoing")));
    let mut repo = repository(&store);

    let recorded = repo
        .delete_ongoing_cycle(&admin_ctx("admin-1"), test_cause())
        .await
        .unwrap();

    assert!(recorded.value);
    assert!(store.ongoing_row().is_none());
    assert_eq!(recorded.audit_event.action.name, "ClearOngoingCycle");
}

#[tokio::test]
async fn test_delete_ongoing_is_idempotent() {
    let store = FakeCycleStore::new();
    let mut repo = repository(&store);

    let recorded = repo
        .delete_ongoing_cycle(&admin_ctx("admin-1"), test_cause())
        .await
        .unwrap();

    assert!(!recorded.value);
}

#[tokio::test]
async fn test_reads_retry_transient_failures() {
    let store = FakeCycleStore::new();
    store.set_ongoing(Some(ongoing_cycle("cycle-ongoing")));
    store.fail_next_ongoing(&StoreError::Unavailable(String::from("timeout")), 1);
    let repo = repository(&store);

    let cycle = repo.ongoing_cycle().await.unwrap();

    assert!(cycle.is_some());
    assert_eq!(store.ongoing_calls(), 2);
}

#[tokio::test]
async fn test_reads_give_up_after_bounded_retries() {
    let store = FakeCycleStore::new();
    store.fail_next_ongoing(&StoreError::Unavailable(String::from("timeout")), 5);
    let repo = repository(&store);

    let result = repo.ongoing_cycle().await;

    assert!(matches!(result, Err(EngineError::Transient { .. })));
    assert_eq!(store.ongoing_calls(), 3);
}

#[tokio::test]
async fn test_mutations_are_never_retried() {
    let store = FakeCycleStore::new();
    store.fail_next_put(&StoreError::Unavailable(String::from("timeout")), 1);
    let mut repo = repository(&store);

    let result = repo
        .schedule_next_cycle(
            &admin_ctx("admin-1"),
            test_cause(),
            SkillId::new("skill-leadership"),
            date!(2026 - 03 - 01),
            NominationPeriod::Monthly,
        )
        .await;

    assert!(matches!(result, Err(EngineError::Transient { .. })));
    // Exactly one attempt: a retried mutation could duplicate its side
    // effect
    assert_eq!(store.put_calls(), 1);
}

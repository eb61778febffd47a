// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::MemoryStore;
use hero_cycle::ports::Caller;
use hero_cycle::{EngineConfig, WorkflowEngine};
use hero_cycle_audit::Cause;
use hero_cycle_domain::{CapabilityTag, Cycle, CycleId, CycleStatus, EmployeeId, NominationPeriod, Profile, SkillId};
use time::OffsetDateTime;
use time::macros::datetime;

pub type StoreEngine =
    WorkflowEngine<MemoryStore, MemoryStore, MemoryStore, MemoryStore, MemoryStore>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

pub fn engine_over(store: &MemoryStore) -> StoreEngine {
    WorkflowEngine::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        EngineConfig::default(),
    )
}

pub fn caller(id: &str) -> Caller {
    Caller {
        id: EmployeeId::new(id),
        email: format!("{id}@example.test"),
    }
}

pub fn cause() -> Cause {
    Cause::new(String::from("req-1"), String::from("Test request"))
}

pub fn tags(labels: &[&str]) -> Vec<CapabilityTag> {
    labels.iter().map(|label| CapabilityTag::new(label)).collect()
}

pub fn profile(id: &str, first_name: &str, last_name: &str, department: &str) -> Profile {
    Profile {
        employee_id: EmployeeId::new(id),
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        department: department.to_owned(),
        avatar_url: None,
    }
}

/// A completed January 2026 cycle row for direct seeding.
pub fn completed_cycle(id: &str, end_date: OffsetDateTime) -> Cycle {
    Cycle {
        cycle_id: CycleId::new(id),
        status: CycleStatus::Completed,
        skill_id: SkillId::new("skill-leadership"),
        period: NominationPeriod::Monthly,
        start_date: datetime!(2026 - 01 - 01 00:01:00 UTC),
        end_date,
        validation_end_date: end_date + time::Duration::days(7),
    }
}

// The March 2026 cycle scheduled in the lifecycle tests runs
// 2026-02-28T23:01Z .. 2026-03-31T21:59:59Z (Paris wall clock), with the
// validation window closing 2026-04-07T21:59:59Z.

pub const fn mid_cycle() -> OffsetDateTime {
    datetime!(2026 - 03 - 15 12:00:00 UTC)
}

pub const fn during_validation() -> OffsetDateTime {
    datetime!(2026 - 04 - 02 12:00:00 UTC)
}

pub const fn after_validation() -> OffsetDateTime {
    datetime!(2026 - 04 - 10 12:00:00 UTC)
}

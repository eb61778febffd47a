// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! In-memory fakes for the collaborator ports, with fault injection and
//! call counting for retry/rollback assertions.

use crate::gate::CallerContext;
use crate::ports::{
    Caller, ChangeEvent, CycleStore, IdentityService, NewCycle, NewNomination, NewValidation,
    NominationStore, ProfileDirectory, StoreError, ValidationStore,
};
use hero_cycle_audit::Cause;
use hero_cycle_domain::{
    CapabilityTag, Cycle, CycleId, CycleStatus, EmployeeId, Nomination, NominationId,
    NominationPeriod, Profile, Role, SkillId, Validation, ValidationId,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::broadcast;

pub fn test_cause() -> Cause {
    Cause::new(String::from("req-1"), String::from("Test request"))
}

pub fn tags(labels: &[&str]) -> Vec<CapabilityTag> {
    labels.iter().map(|label| CapabilityTag::new(label)).collect()
}

pub fn caller(id: &str) -> Caller {
    Caller {
        id: EmployeeId::new(id),
        email: format!("{id}@example.test"),
    }
}

pub fn member_ctx(id: &str) -> CallerContext {
    CallerContext::authenticated(caller(id), vec![Role::Member])
}

pub fn approver_ctx(id: &str) -> CallerContext {
    CallerContext::authenticated(caller(id), vec![Role::Approver])
}

pub fn admin_ctx(id: &str) -> CallerContext {
    CallerContext::authenticated(caller(id), vec![Role::Admin])
}

/// An ongoing January 2026 cycle.
pub fn ongoing_cycle(id: &str) -> Cycle {
    Cycle {
        cycle_id: CycleId::new(id),
        status: CycleStatus::Ongoing,
        skill_id: SkillId::new("skill-leadership"),
        period: NominationPeriod::Monthly,
        start_date: datetime!(2026 - 01 - 01 00:01:00 UTC),
        end_date: datetime!(2026 - 01 - 31 23:59:59 UTC),
        validation_end_date: datetime!(2026 - 02 - 07 23:59:59 UTC),
    }
}

/// The same cycle after completion.
pub fn completed_cycle(id: &str) -> Cycle {
    Cycle {
        status: CycleStatus::Completed,
        ..ongoing_cycle(id)
    }
}

pub const fn during_nomination() -> OffsetDateTime {
    datetime!(2026 - 01 - 15 12:00:00 UTC)
}

pub const fn during_validation() -> OffsetDateTime {
    datetime!(2026 - 02 - 03 12:00:00 UTC)
}

pub const fn after_validation() -> OffsetDateTime {
    datetime!(2026 - 02 - 10 12:00:00 UTC)
}

// ---------------------------------------------------------------------------
// Identity fake

pub struct FakeIdentity {
    caller: Option<Caller>,
    roles: Vec<String>,
    fail_caller: RefCell<VecDeque<StoreError>>,
    fail_roles: RefCell<VecDeque<StoreError>>,
    caller_calls: RefCell<u32>,
}

impl FakeIdentity {
    pub fn anonymous() -> Self {
        Self {
            caller: None,
            roles: Vec::new(),
            fail_caller: RefCell::new(VecDeque::new()),
            fail_roles: RefCell::new(VecDeque::new()),
            caller_calls: RefCell::new(0),
        }
    }

    pub fn signed_in(id: &str, roles: &[&str]) -> Self {
        Self {
            caller: Some(caller(id)),
            roles: roles.iter().map(|role| (*role).to_owned()).collect(),
            fail_caller: RefCell::new(VecDeque::new()),
            fail_roles: RefCell::new(VecDeque::new()),
            caller_calls: RefCell::new(0),
        }
    }

    pub fn fail_caller_with(&self, err: &StoreError, times: usize) {
        let mut queue = self.fail_caller.borrow_mut();
        for _ in 0..times {
            queue.push_back(err.clone());
        }
    }

    pub fn fail_roles_with(&self, err: &StoreError, times: usize) {
        let mut queue = self.fail_roles.borrow_mut();
        for _ in 0..times {
            queue.push_back(err.clone());
        }
    }

    pub fn caller_calls(&self) -> u32 {
        *self.caller_calls.borrow()
    }
}

impl IdentityService for FakeIdentity {
    async fn current_caller(&self) -> Result<Option<Caller>, StoreError> {
        *self.caller_calls.borrow_mut() += 1;
        if let Some(err) = self.fail_caller.borrow_mut().pop_front() {
            return Err(err);
        }
        Ok(self.caller.clone())
    }

    async fn role_assignments(&self, _employee_id: &EmployeeId) -> Result<Vec<String>, StoreError> {
        if let Some(err) = self.fail_roles.borrow_mut().pop_front() {
            return Err(err);
        }
        Ok(self.roles.clone())
    }
}

// ---------------------------------------------------------------------------
// Cycle store fake

#[derive(Default)]
struct CycleInner {
    ongoing: Option<Cycle>,
    next: Option<Cycle>,
    completed: Option<Cycle>,
    fail_ongoing: VecDeque<StoreError>,
    fail_put: VecDeque<StoreError>,
    ongoing_calls: u32,
    put_calls: u32,
    seq: u32,
}

#[derive(Clone)]
pub struct FakeCycleStore {
    inner: Rc<RefCell<CycleInner>>,
    tx: broadcast::Sender<ChangeEvent>,
}

impl FakeCycleStore {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self {
            inner: Rc::new(RefCell::new(CycleInner::default())),
            tx,
        }
    }

    pub fn set_ongoing(&self, cycle: Option<Cycle>) {
        self.inner.borrow_mut().ongoing = cycle;
    }

    pub fn set_completed(&self, cycle: Option<Cycle>) {
        self.inner.borrow_mut().completed = cycle;
    }

    pub fn next_cycle_row(&self) -> Option<Cycle> {
        self.inner.borrow().next.clone()
    }

    pub fn ongoing_row(&self) -> Option<Cycle> {
        self.inner.borrow().ongoing.clone()
    }

    pub fn fail_next_ongoing(&self, err: &StoreError, times: usize) {
        let mut inner = self.inner.borrow_mut();
        for _ in 0..times {
            inner.fail_ongoing.push_back(err.clone());
        }
    }

    pub fn fail_next_put(&self, err: &StoreError, times: usize) {
        let mut inner = self.inner.borrow_mut();
        for _ in 0..times {
            inner.fail_put.push_back(err.clone());
        }
    }

    pub fn ongoing_calls(&self) -> u32 {
        self.inner.borrow().ongoing_calls
    }

    pub fn put_calls(&self) -> u32 {
        self.inner.borrow().put_calls
    }
}

impl CycleStore for FakeCycleStore {
    async fn ongoing_cycle(&self) -> Result<Option<Cycle>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.ongoing_calls += 1;
        if let Some(err) = inner.fail_ongoing.pop_front() {
            return Err(err);
        }
        Ok(inner.ongoing.clone())
    }

    async fn next_cycle(&self) -> Result<Option<Cycle>, StoreError> {
        Ok(self.inner.borrow().next.clone())
    }

    async fn latest_completed_cycle(&self) -> Result<Option<Cycle>, StoreError> {
        Ok(self.inner.borrow().completed.clone())
    }

    async fn put_next_cycle(&self, cycle: NewCycle) -> Result<Cycle, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.put_calls += 1;
        if let Some(err) = inner.fail_put.pop_front() {
            return Err(err);
        }
        inner.seq += 1;
        let row = Cycle {
            cycle_id: CycleId::new(&format!("cycle-{}", inner.seq)),
            status: CycleStatus::Next,
            skill_id: cycle.skill_id,
            period: cycle.period,
            start_date: cycle.start_date,
            end_date: cycle.end_date,
            validation_end_date: cycle.validation_end_date,
        };
        inner.next = Some(row.clone());
        let _ = self.tx.send(ChangeEvent::Cycles);
        Ok(row)
    }

    async fn clear_ongoing_cycle(&self) -> Result<(), StoreError> {
        self.inner.borrow_mut().ongoing = None;
        let _ = self.tx.send(ChangeEvent::Cycles);
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Nomination store fake

#[derive(Default)]
struct NominationInner {
    rows: Vec<Nomination>,
    fail_insert: VecDeque<StoreError>,
    fail_delete: VecDeque<StoreError>,
    fail_list: VecDeque<StoreError>,
    insert_calls: u32,
    delete_calls: u32,
    list_calls: u32,
    seq: u32,
}

#[derive(Clone)]
pub struct FakeNominationStore {
    inner: Rc<RefCell<NominationInner>>,
    tx: broadcast::Sender<ChangeEvent>,
}

impl FakeNominationStore {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self {
            inner: Rc::new(RefCell::new(NominationInner::default())),
            tx,
        }
    }

    /// Seeds a nomination row directly, bypassing the engine.
    pub fn seed(&self, cycle_id: &str, voter: &str, nominee: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.seq += 1;
        let seq = inner.seq;
        inner.rows.push(Nomination {
            nomination_id: NominationId::new(&format!("nom-{seq}")),
            cycle_id: CycleId::new(cycle_id),
            voter_id: EmployeeId::new(voter),
            nominee_id: EmployeeId::new(nominee),
            tags: tags(&["Leadership"]),
            justification: String::from("Great work"),
            remarks: None,
            created_at: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(i64::from(seq)),
        });
    }

    pub fn rows(&self) -> Vec<Nomination> {
        self.inner.borrow().rows.clone()
    }

    pub fn fail_next_insert(&self, err: &StoreError, times: usize) {
        let mut inner = self.inner.borrow_mut();
        for _ in 0..times {
            inner.fail_insert.push_back(err.clone());
        }
    }

    pub fn fail_next_delete(&self, err: &StoreError, times: usize) {
        let mut inner = self.inner.borrow_mut();
        for _ in 0..times {
            inner.fail_delete.push_back(err.clone());
        }
    }

    pub fn fail_next_list(&self, err: &StoreError, times: usize) {
        let mut inner = self.inner.borrow_mut();
        for _ in 0..times {
            inner.fail_list.push_back(err.clone());
        }
    }

    pub fn insert_calls(&self) -> u32 {
        self.inner.borrow().insert_calls
    }

    pub fn list_calls(&self) -> u32 {
        self.inner.borrow().list_calls
    }
}

impl NominationStore for FakeNominationStore {
    async fn insert(&self, nomination: NewNomination) -> Result<Nomination, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.insert_calls += 1;
        if let Some(err) = inner.fail_insert.pop_front() {
            return Err(err);
        }
        if inner.rows.iter().any(|row| {
            row.cycle_id == nomination.cycle_id && row.voter_id == nomination.voter_id
        }) {
            return Err(StoreError::Conflict {
                constraint: String::from("nominations_cycle_voter_unique"),
            });
        }
        inner.seq += 1;
        let seq = inner.seq;
        let row = Nomination {
            nomination_id: NominationId::new(&format!("nom-{seq}")),
            cycle_id: nomination.cycle_id,
            voter_id: nomination.voter_id,
            nominee_id: nomination.nominee_id,
            tags: nomination.tags,
            justification: nomination.justification,
            remarks: nomination.remarks,
            created_at: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(i64::from(seq)),
        };
        inner.rows.push(row.clone());
        let _ = self.tx.send(ChangeEvent::Nominations);
        Ok(row)
    }

    async fn delete_for_voter(
        &self,
        cycle_id: &CycleId,
        voter_id: &EmployeeId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.delete_calls += 1;
        if let Some(err) = inner.fail_delete.pop_front() {
            return Err(err);
        }
        let before = inner.rows.len();
        inner
            .rows
            .retain(|row| !(row.cycle_id == *cycle_id && row.voter_id == *voter_id));
        if inner.rows.len() == before {
            return Err(StoreError::NotFound(format!(
                "no nomination for voter {voter_id} in cycle {cycle_id}"
            )));
        }
        let _ = self.tx.send(ChangeEvent::Nominations);
        Ok(())
    }

    async fn list_for_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Nomination>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.list_calls += 1;
        if let Some(err) = inner.fail_list.pop_front() {
            return Err(err);
        }
        Ok(inner
            .rows
            .iter()
            .filter(|row| row.cycle_id == *cycle_id)
            .cloned()
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Validation store fake

#[derive(Default)]
struct ValidationInner {
    rows: Vec<Validation>,
    fail_insert: VecDeque<StoreError>,
    fail_delete: VecDeque<StoreError>,
    insert_calls: u32,
    delete_calls: u32,
    seq: u32,
}

#[derive(Clone)]
pub struct FakeValidationStore {
    inner: Rc<RefCell<ValidationInner>>,
    tx: broadcast::Sender<ChangeEvent>,
}

impl FakeValidationStore {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(16);
        Self {
            inner: Rc::new(RefCell::new(ValidationInner::default())),
            tx,
        }
    }

    /// Seeds a validation row directly, bypassing the engine.
    pub fn seed(&self, cycle_id: &str, validator: &str, nominee: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.seq += 1;
        let seq = inner.seq;
        inner.rows.push(Validation {
            validation_id: ValidationId::new(&format!("val-{seq}")),
            cycle_id: CycleId::new(cycle_id),
            validator_id: EmployeeId::new(validator),
            nominee_id: EmployeeId::new(nominee),
            created_at: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(i64::from(seq)),
        });
    }

    pub fn rows(&self) -> Vec<Validation> {
        self.inner.borrow().rows.clone()
    }

    pub fn fail_next_insert(&self, err: &StoreError, times: usize) {
        let mut inner = self.inner.borrow_mut();
        for _ in 0..times {
            inner.fail_insert.push_back(err.clone());
        }
    }

    pub fn fail_next_delete(&self, err: &StoreError, times: usize) {
        let mut inner = self.inner.borrow_mut();
        for _ in 0..times {
            inner.fail_delete.push_back(err.clone());
        }
    }

    pub fn insert_calls(&self) -> u32 {
        self.inner.borrow().insert_calls
    }

    pub fn delete_calls(&self) -> u32 {
        self.inner.borrow().delete_calls
    }
}

impl ValidationStore for FakeValidationStore {
    async fn insert(&self, validation: NewValidation) -> Result<Validation, StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.insert_calls += 1;
        if let Some(err) = inner.fail_insert.pop_front() {
            return Err(err);
        }
        if inner.rows.iter().any(|row| {
            row.cycle_id == validation.cycle_id && row.validator_id == validation.validator_id
        }) {
            return Err(StoreError::Conflict {
                constraint: String::from("validations_cycle_validator_unique"),
            });
        }
        inner.seq += 1;
        let seq = inner.seq;
        let row = Validation {
            validation_id: ValidationId::new(&format!("val-{seq}")),
            cycle_id: validation.cycle_id,
            validator_id: validation.validator_id,
            nominee_id: validation.nominee_id,
            created_at: OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(i64::from(seq)),
        };
        inner.rows.push(row.clone());
        let _ = self.tx.send(ChangeEvent::Validations);
        Ok(row)
    }

    async fn delete_for_validator(
        &self,
        cycle_id: &CycleId,
        validator_id: &EmployeeId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.delete_calls += 1;
        if let Some(err) = inner.fail_delete.pop_front() {
            return Err(err);
        }
        let before = inner.rows.len();
        inner
            .rows
            .retain(|row| !(row.cycle_id == *cycle_id && row.validator_id == *validator_id));
        if inner.rows.len() == before {
            return Err(StoreError::NotFound(format!(
                "no validation for validator {validator_id} in cycle {cycle_id}"
            )));
        }
        let _ = self.tx.send(ChangeEvent::Validations);
        Ok(())
    }

    async fn list_for_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Validation>, StoreError> {
        Ok(self
            .inner
            .borrow()
            .rows
            .iter()
            .filter(|row| row.cycle_id == *cycle_id)
            .cloned()
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Profile directory fake

#[derive(Clone, Default)]
pub struct FakeProfileDirectory {
    profiles: Rc<RefCell<Vec<Profile>>>,
}

impl FakeProfileDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, id: &str, first_name: &str, last_name: &str, department: &str) {
        self.profiles.borrow_mut().push(Profile {
            employee_id: EmployeeId::new(id),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            department: department.to_owned(),
            avatar_url: None,
        });
    }
}

impl ProfileDirectory for FakeProfileDirectory {
    async fn profile_by_id(&self, employee_id: &EmployeeId) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .profiles
            .borrow()
            .iter()
            .find(|profile| &profile.employee_id == employee_id)
            .cloned())
    }
}

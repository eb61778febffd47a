// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! In-memory reference store for the Hero Cycle workflow engine.
//!
//! Implements every collaborator port over plain collections behind a
//! mutex, with `tokio::sync::broadcast` change feeds and JSON snapshot
//! import/export. It is the backend for all integration tests and the
//! template for real adapters.
//!
//! ## Invariants enforced
//!
//! - At most one cycle is `Next` and at most one is `Ongoing`
//! - One nomination per `(cycle, voter)` and one validation per
//!   `(cycle, validator)`; violations return [`StoreError::Conflict`]
//! - At most one winner per cycle
//!
//! ## Scheduler simulation
//!
//! The `Next → Ongoing` transition is driven by an external scheduler in
//! production. [`MemoryStore::begin_scheduled_cycle`] and
//! [`MemoryStore::complete_ongoing_cycle`] stand in for that scheduler in
//! tests.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod snapshot;

#[cfg(test)]
mod tests;

pub use snapshot::StoreSnapshot;

use hero_cycle::ports::{
    Caller, ChangeEvent, CycleStore, IdentityService, NewCycle, NewNomination, NewValidation,
    NominationStore, ProfileDirectory, StoreError, ValidationStore,
};
use hero_cycle_domain::{
    Cycle, CycleId, CycleStatus, EmployeeId, Nomination, NominationId, Profile, Validation,
    ValidationId, Winner,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Buffered change events per subscriber; slow subscribers drop the
/// oldest events and must re-fetch anyway.
const EVENT_BUFFER_SIZE: usize = 64;

#[derive(Default)]
struct Inner {
    caller: Option<Caller>,
    roles: HashMap<String, Vec<String>>,
    cycles: Vec<Cycle>,
    nominations: Vec<Nomination>,
    validations: Vec<Validation>,
    profiles: Vec<Profile>,
    winners: Vec<Winner>,
    seq: u64,
}

impl Inner {
    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{prefix}-{}", self.seq)
    }
}

/// Shared in-memory store handle.
///
/// Cloning is cheap; all clones observe the same state. Every engine
/// component receives its own clone.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            tx,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend(String::from("store lock poisoned")))
    }

    fn notify(&self, event: ChangeEvent) {
        // No receivers is fine; events are informational only
        let _ = self.tx.send(event);
    }

    /// Signs a caller in and remembers their role assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn sign_in(&self, caller: Caller, roles: &[&str]) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.roles.insert(
            caller.id.value().to_owned(),
            roles.iter().map(|role| (*role).to_owned()).collect(),
        );
        debug!("signed in {} with roles {roles:?}", caller.id);
        inner.caller = Some(caller);
        Ok(())
    }

    /// Signs the current caller out.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn sign_out(&self) -> Result<(), StoreError> {
        self.lock()?.caller = None;
        Ok(())
    }

    /// Adds or replaces a display profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn upsert_profile(&self, profile: Profile) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner
            .profiles
            .retain(|existing| existing.employee_id != profile.employee_id);
        inner.profiles.push(profile);
        Ok(())
    }

    /// Seeds a cycle row directly. Test and bootstrap support.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn seed_cycle(&self, cycle: Cycle) -> Result<(), StoreError> {
        self.lock()?.cycles.push(cycle);
        self.notify(ChangeEvent::Cycles);
        Ok(())
    }

    /// Promotes the `Next` cycle to `Ongoing` (scheduler stand-in).
    ///
    /// # Errors
    ///
    /// Returns an error if no `Next` cycle exists or a cycle is already
    /// `Ongoing`.
    pub fn begin_scheduled_cycle(&self) -> Result<Cycle, StoreError> {
        let mut inner = self.lock()?;
        if inner
            .cycles
            .iter()
            .any(|cycle| cycle.status == CycleStatus::Ongoing)
        {
            return Err(StoreError::Conflict {
                constraint: String::from("single_ongoing_cycle"),
            });
        }
        let next = inner
            .cycles
            .iter_mut()
            .find(|cycle| cycle.status == CycleStatus::Next)
            .ok_or_else(|| StoreError::NotFound(String::from("no next cycle scheduled")))?;
        if !next.status.can_transition_to(CycleStatus::Ongoing) {
            return Err(StoreError::Backend(format!(
                "cycle {} cannot transition to ongoing",
                next.cycle_id
            )));
        }
        next.status = CycleStatus::Ongoing;
        let started = next.clone();
        drop(inner);
        info!("cycle {} is now ongoing", started.cycle_id);
        self.notify(ChangeEvent::Cycles);
        Ok(started)
    }

    /// Completes the `Ongoing` cycle (scheduler stand-in).
    ///
    /// # Errors
    ///
    /// Returns an error if no cycle is `Ongoing`.
    pub fn complete_ongoing_cycle(&self) -> Result<Cycle, StoreError> {
        let mut inner = self.lock()?;
        let ongoing = inner
            .cycles
            .iter_mut()
            .find(|cycle| cycle.status == CycleStatus::Ongoing)
            .ok_or_else(|| StoreError::NotFound(String::from("no ongoing cycle")))?;
        ongoing.status = CycleStatus::Completed;
        let completed = ongoing.clone();
        drop(inner);
        info!("cycle {} completed", completed.cycle_id);
        self.notify(ChangeEvent::Cycles);
        Ok(completed)
    }

    /// Records the resolved winner of a cycle. One winner per cycle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the cycle already has a
    /// winner.
    pub fn record_winner(
        &self,
        cycle_id: &CycleId,
        nominee_id: &EmployeeId,
        decided_at: OffsetDateTime,
    ) -> Result<Winner, StoreError> {
        let mut inner = self.lock()?;
        if inner
            .winners
            .iter()
            .any(|winner| &winner.cycle_id == cycle_id)
        {
            return Err(StoreError::Conflict {
                constraint: String::from("one_winner_per_cycle"),
            });
        }
        let winner = Winner {
            cycle_id: cycle_id.clone(),
            nominee_id: nominee_id.clone(),
            decided_at,
        };
        inner.winners.push(winner.clone());
        info!("recorded winner {nominee_id} for cycle {cycle_id}");
        Ok(winner)
    }

    /// Returns the winner of a cycle, if resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn winner_for_cycle(&self, cycle_id: &CycleId) -> Result<Option<Winner>, StoreError> {
        Ok(self
            .lock()?
            .winners
            .iter()
            .find(|winner| &winner.cycle_id == cycle_id)
            .cloned())
    }
}

impl IdentityService for MemoryStore {
    async fn current_caller(&self) -> Result<Option<Caller>, StoreError> {
        Ok(self.lock()?.caller.clone())
    }

    async fn role_assignments(&self, employee_id: &EmployeeId) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()?
            .roles
            .get(employee_id.value())
            .cloned()
            .unwrap_or_default())
    }
}

impl CycleStore for MemoryStore {
    async fn ongoing_cycle(&self) -> Result<Option<Cycle>, StoreError> {
        Ok(self
            .lock()?
            .cycles
            .iter()
            .find(|cycle| cycle.status == CycleStatus::Ongoing)
            .cloned())
    }

    async fn next_cycle(&self) -> Result<Option<Cycle>, StoreError> {
        Ok(self
            .lock()?
            .cycles
            .iter()
            .find(|cycle| cycle.status == CycleStatus::Next)
            .cloned())
    }

    async fn latest_completed_cycle(&self) -> Result<Option<Cycle>, StoreError> {
        Ok(self
            .lock()?
            .cycles
            .iter()
            .filter(|cycle| cycle.status == CycleStatus::Completed)
            .max_by_key(|cycle| cycle.end_date)
            .cloned())
    }

    async fn put_next_cycle(&self, cycle: NewCycle) -> Result<Cycle, StoreError> {
        let mut inner = self.lock()?;
        let cycle_id = CycleId::new(&inner.next_id("cycle"));
        let row = Cycle {
            cycle_id,
            status: CycleStatus::Next,
            skill_id: cycle.skill_id,
            period: cycle.period,
            start_date: cycle.start_date,
            end_date: cycle.end_date,
            validation_end_date: cycle.validation_end_date,
        };
        // Creates or overwrites: at most one next cycle
        inner
            .cycles
            .retain(|existing| existing.status != CycleStatus::Next);
        inner.cycles.push(row.clone());
        drop(inner);
        debug!("scheduled next cycle {}", row.cycle_id);
        self.notify(ChangeEvent::Cycles);
        Ok(row)
    }

    async fn clear_ongoing_cycle(&self) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let before = inner.cycles.len();
        inner
            .cycles
            .retain(|cycle| cycle.status != CycleStatus::Ongoing);
        if inner.cycles.len() == before {
            return Err(StoreError::NotFound(String::from("no ongoing cycle")));
        }
        drop(inner);
        self.notify(ChangeEvent::Cycles);
        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl NominationStore for MemoryStore {
    async fn insert(&self, nomination: NewNomination) -> Result<Nomination, StoreError> {
        let mut inner = self.lock()?;
        if inner.nominations.iter().any(|row| {
            row.cycle_id == nomination.cycle_id && row.voter_id == nomination.voter_id
        }) {
            return Err(StoreError::Conflict {
                constraint: String::from("nominations_cycle_voter_unique"),
            });
        }
        let nomination_id = NominationId::new(&inner.next_id("nom"));
        let row = Nomination {
            nomination_id,
            cycle_id: nomination.cycle_id,
            voter_id: nomination.voter_id,
            nominee_id: nomination.nominee_id,
            tags: nomination.tags,
            justification: nomination.justification,
            remarks: nomination.remarks,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.nominations.push(row.clone());
        drop(inner);
        debug!("inserted nomination {}", row.nomination_id.value());
        self.notify(ChangeEvent::Nominations);
        Ok(row)
    }

    async fn delete_for_voter(
        &self,
        cycle_id: &CycleId,
        voter_id: &EmployeeId,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let before = inner.nominations.len();
        inner
            .nominations
            .retain(|row| !(row.cycle_id == *cycle_id && row.voter_id == *voter_id));
        if inner.nominations.len() == before {
            return Err(StoreError::NotFound(format!(
                "no nomination for voter {voter_id} in cycle {cycle_id}"
            )));
        }
        drop(inner);
        self.notify(ChangeEvent::Nominations);
        Ok(())
    }

    async fn list_for_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Nomination>, StoreError> {
        Ok(self
            .lock()?
            .nominations
            .iter()
            .filter(|row| row.cycle_id == *cycle_id)
            .cloned()
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl ValidationStore for MemoryStore {
    async fn insert(&self, validation: NewValidation) -> Result<Validation, StoreError> {
        let mut inner = self.lock()?;
        if inner.validations.iter().any(|row| {
            row.cycle_id == validation.cycle_id && row.validator_id == validation.validator_id
        }) {
            return Err(StoreError::Conflict {
                constraint: String::from("validations_cycle_validator_unique"),
            });
        }
        let validation_id = ValidationId::new(&inner.next_id("val"));
        let row = Validation {
            validation_id,
            cycle_id: validation.cycle_id,
            validator_id: validation.validator_id,
            nominee_id: validation.nominee_id,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.validations.push(row.clone());
        drop(inner);
        debug!("inserted validation {}", row.validation_id.value());
        self.notify(ChangeEvent::Validations);
        Ok(row)
    }

    async fn delete_for_validator(
        &self,
        cycle_id: &CycleId,
        validator_id: &EmployeeId,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let before = inner.validations.len();
        inner
            .validations
            .retain(|row| !(row.cycle_id == *cycle_id && row.validator_id == *validator_id));
        if inner.validations.len() == before {
            return Err(StoreError::NotFound(format!(
                "no validation for validator {validator_id} in cycle {cycle_id}"
            )));
        }
        drop(inner);
        self.notify(ChangeEvent::Validations);
        Ok(())
    }

    async fn list_for_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Validation>, StoreError> {
        Ok(self
            .lock()?
            .validations
            .iter()
            .filter(|row| row.cycle_id == *cycle_id)
            .cloned()
            .collect())
    }

    fn changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl ProfileDirectory for MemoryStore {
    async fn profile_by_id(&self, employee_id: &EmployeeId) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .lock()?
            .profiles
            .iter()
            .find(|profile| &profile.employee_id == employee_id)
            .cloned())
    }
}

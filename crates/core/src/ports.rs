// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Collaborator ports consumed by the workflow engine.
//!
//! The engine owns no authoritative state. Identity, cycles, nominations,
//! validations, and profiles live behind these traits, backed in
//! production by a hosted persistence-and-identity service and in tests
//! by the in-memory reference store.
//!
//! All ports are `async` and dispatched statically. Store handles are
//! expected to be cheap to clone; each engine component holds its own.
//!
//! Change feeds are read-only, non-authoritative notifications: receiving
//! an event obliges the consumer to re-fetch the affected ledger, never
//! to merge incrementally.

#![allow(async_fn_in_trait)]

use hero_cycle_domain::{
    CapabilityTag, Cycle, CycleId, EmployeeId, Nomination, NominationPeriod, Profile, SkillId,
    Validation,
};
use time::OffsetDateTime;
use tokio::sync::broadcast;

/// Transport-level errors returned by the collaborator ports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint was violated.
    #[error("unique constraint violated: {constraint}")]
    Conflict {
        /// The constraint that was violated.
        constraint: String,
    },
    /// The referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),
    /// The backing store is temporarily unreachable.
    #[error("backing store unavailable: {0}")]
    Unavailable(String),
    /// The backing store failed in a non-transient way.
    #[error("backing store failure: {0}")]
    Backend(String),
}

/// A change notification pushed by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The cycle table changed (scheduled, advanced, or cleared).
    Cycles,
    /// The nomination ledger changed.
    Nominations,
    /// The validation ledger changed.
    Validations,
}

/// The authenticated caller as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// The caller's employee id.
    pub id: EmployeeId,
    /// The caller's email address.
    pub email: String,
}

/// A nomination as submitted, before the store assigns its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNomination {
    /// The cycle the nomination belongs to.
    pub cycle_id: CycleId,
    /// The voting employee.
    pub voter_id: EmployeeId,
    /// The nominated employee.
    pub nominee_id: EmployeeId,
    /// The selected capability tags.
    pub tags: Vec<CapabilityTag>,
    /// The free-text justification.
    pub justification: String,
    /// Optional additional remarks.
    pub remarks: Option<String>,
}

/// A validation as submitted, before the store assigns its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewValidation {
    /// The cycle the validation belongs to.
    pub cycle_id: CycleId,
    /// The confirming validator.
    pub validator_id: EmployeeId,
    /// The confirmed finalist.
    pub nominee_id: EmployeeId,
}

/// A cycle as scheduled, before the store assigns its identity.
///
/// The store creates the cycle with status `Next`, replacing any existing
/// `Next` cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCycle {
    /// The skill rewarded during the cycle.
    pub skill_id: SkillId,
    /// The nomination period length.
    pub period: NominationPeriod,
    /// When the nomination window opens.
    pub start_date: OffsetDateTime,
    /// When the nomination window closes.
    pub end_date: OffsetDateTime,
    /// When the validation window closes.
    pub validation_end_date: OffsetDateTime,
}

/// Resolves the current caller and their role assignments.
pub trait IdentityService {
    /// Returns the authenticated caller, or `None` when unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity service cannot be reached.
    async fn current_caller(&self) -> Result<Option<Caller>, StoreError>;

    /// Returns the role names assigned to an employee.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity service cannot be reached.
    async fn role_assignments(&self, employee_id: &EmployeeId) -> Result<Vec<String>, StoreError>;
}

/// Abstract store of nomination cycles.
pub trait CycleStore {
    /// Returns the single `Ongoing` cycle, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn ongoing_cycle(&self) -> Result<Option<Cycle>, StoreError>;

    /// Returns the single `Next` cycle, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn next_cycle(&self) -> Result<Option<Cycle>, StoreError>;

    /// Returns the most recently ended `Completed` cycle, or `None`.
    ///
    /// Older completed cycles are not reachable through this interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn latest_completed_cycle(&self) -> Result<Option<Cycle>, StoreError>;

    /// Creates or overwrites the `Next` cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects or cannot record the cycle.
    async fn put_next_cycle(&self, cycle: NewCycle) -> Result<Cycle, StoreError>;

    /// Clears the `Ongoing` cycle, returning the system to the
    /// "no active cycle" state.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or no ongoing
    /// cycle exists.
    async fn clear_ongoing_cycle(&self) -> Result<(), StoreError>;

    /// Subscribes to cycle change notifications.
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Abstract store of nominations.
pub trait NominationStore {
    /// Inserts a nomination and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the voter already holds a
    /// nomination in the cycle, or another error if the store cannot be
    /// reached.
    async fn insert(&self, nomination: NewNomination) -> Result<Nomination, StoreError>;

    /// Deletes the voter's nomination in the cycle, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such row exists, or another
    /// error if the store cannot be reached.
    async fn delete_for_voter(
        &self,
        cycle_id: &CycleId,
        voter_id: &EmployeeId,
    ) -> Result<(), StoreError>;

    /// Returns all nominations of the cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn list_for_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Nomination>, StoreError>;

    /// Subscribes to nomination change notifications.
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Abstract store of validations.
pub trait ValidationStore {
    /// Inserts a validation and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the validator already holds a
    /// validation in the cycle, or another error if the store cannot be
    /// reached.
    async fn insert(&self, validation: NewValidation) -> Result<Validation, StoreError>;

    /// Deletes the validator's validation in the cycle, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such row exists, or another
    /// error if the store cannot be reached.
    async fn delete_for_validator(
        &self,
        cycle_id: &CycleId,
        validator_id: &EmployeeId,
    ) -> Result<(), StoreError>;

    /// Returns all validations of the cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached.
    async fn list_for_cycle(&self, cycle_id: &CycleId) -> Result<Vec<Validation>, StoreError>;

    /// Subscribes to validation change notifications.
    fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// Read-only directory of employee display profiles.
pub trait ProfileDirectory {
    /// Returns the profile of an employee, or `None` if unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be reached.
    async fn profile_by_id(&self, employee_id: &EmployeeId) -> Result<Option<Profile>, StoreError>;
}

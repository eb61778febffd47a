// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Nomination ledger with an optimistic local cache.
//!
//! The cache mirrors the nomination rows of one cycle and is the single
//! source of truth for every consumer of this ledger. Mutations update
//! the cache only after (or alongside) the store call and roll it back to
//! the exact pre-call state on any failure. A change notification must be
//! answered with [`NominationLedger::refresh`], which re-fetches the full
//! scope rather than merging incrementally.
//!
//! Mutations take `&mut self`: a second mutation on this ledger cannot
//! start while one is in flight.

use crate::Recorded;
use crate::error::EngineError;
use crate::gate::CallerContext;
use crate::ports::{Caller, NewNomination, NominationStore, StoreError};
use crate::retry::with_read_retry;
use hero_cycle_audit::{Action, AuditEvent, Cause, StateSnapshot};
use hero_cycle_domain::{
    CapabilityTag, Cycle, CycleId, DomainError, EmployeeId, Nomination, validate_nomination_input,
};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Optimistic ledger of one cycle's nominations.
pub struct NominationLedger<S> {
    store: S,
    cycle_id: Option<CycleId>,
    cache: Vec<Nomination>,
}

impl<S: NominationStore> NominationLedger<S> {
    /// Creates an empty, unscoped ledger over a nomination store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            cycle_id: None,
            cache: Vec::new(),
        }
    }

    /// Returns the cycle this ledger is scoped to, if loaded.
    #[must_use]
    pub fn cycle_id(&self) -> Option<&CycleId> {
        self.cycle_id.as_ref()
    }

    /// Returns the cached nominations.
    #[must_use]
    pub fn nominations(&self) -> &[Nomination] {
        &self.cache
    }

    /// Returns the voter's nomination in the loaded cycle, if any.
    #[must_use]
    pub fn nomination_for(&self, voter_id: &EmployeeId) -> Option<&Nomination> {
        self.cache
            .iter()
            .find(|nomination| &nomination.voter_id == voter_id)
    }

    /// Scopes the ledger to a cycle and fetches its nominations.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the store stays unreachable
    /// after bounded retry.
    pub async fn load(&mut self, cycle_id: &CycleId) -> Result<(), EngineError> {
        let rows: Vec<Nomination> =
            with_read_retry("list_nominations", || self.store.list_for_cycle(cycle_id)).await?;
        debug!("loaded {} nomination(s) for cycle {cycle_id}", rows.len());
        self.cycle_id = Some(cycle_id.clone());
        self.cache = rows;
        Ok(())
    }

    /// Re-fetches the full loaded scope, replacing the cache.
    ///
    /// Called in response to a change notification. A ledger that has not
    /// been loaded yet is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the store stays unreachable
    /// after bounded retry.
    pub async fn refresh(&mut self) -> Result<(), EngineError> {
        let Some(cycle_id) = self.cycle_id.clone() else {
            return Ok(());
        };
        self.load(&cycle_id).await
    }

    /// Returns all nominations of a cycle, loading the scope if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the store stays unreachable
    /// after bounded retry.
    pub async fn list_for_cycle(
        &mut self,
        cycle_id: &CycleId,
    ) -> Result<Vec<Nomination>, EngineError> {
        if self.cycle_id.as_ref() != Some(cycle_id) {
            self.load(cycle_id).await?;
        }
        Ok(self.cache.clone())
    }

    /// Submits the caller's nomination for `nominee_id`.
    ///
    /// One nomination per voter per cycle: if the caller already holds
    /// one, the call is rejected and they must [`withdraw`] first.
    /// The cache is unchanged when any step fails.
    ///
    /// [`withdraw`]: NominationLedger::withdraw
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller lacks `can_nominate`
    /// - The cycle's nomination window is not open at `now`
    /// - The input fails domain validation
    /// - The caller already holds a nomination in this cycle
    /// - The store rejects the insert
    #[allow(clippy::too_many_arguments)]
    pub async fn submit(
        &mut self,
        ctx: &CallerContext,
        cause: Cause,
        cycle: &Cycle,
        now: OffsetDateTime,
        nominee_id: EmployeeId,
        tags: Vec<CapabilityTag>,
        justification: String,
        remarks: Option<String>,
    ) -> Result<Recorded<Nomination>, EngineError> {
        let voter: &Caller = self.require_nominator(ctx, "SubmitNomination")?;
        let voter_id: EmployeeId = voter.id.clone();

        if !cycle.nomination_open(now) {
            return Err(EngineError::Validation(
                DomainError::NominationWindowClosed {
                    cycle_id: cycle.cycle_id.clone(),
                },
            ));
        }

        validate_nomination_input(&tags, &justification, remarks.as_deref())?;

        if self.cycle_id.as_ref() != Some(&cycle.cycle_id) {
            self.load(&cycle.cycle_id).await?;
        }

        if self.nomination_for(&voter_id).is_some() {
            return Err(EngineError::Conflict {
                message: format!(
                    "Voter {voter_id} already holds a nomination in cycle {}; withdraw it first",
                    cycle.cycle_id
                ),
            });
        }

        let before: StateSnapshot = self.snapshot(&cycle.cycle_id);

        // Mutations are never retried; the cache is untouched on failure
        let nomination: Nomination = self
            .store
            .insert(NewNomination {
                cycle_id: cycle.cycle_id.clone(),
                voter_id: voter_id.clone(),
                nominee_id,
                tags,
                justification,
                remarks,
            })
            .await
            .map_err(EngineError::from)?;

        self.cache.push(nomination.clone());
        info!(
            "recorded nomination {} ({voter_id} -> {}) in cycle {}",
            nomination.nomination_id.value(),
            nomination.nominee_id,
            cycle.cycle_id
        );

        let after: StateSnapshot = self.snapshot(&cycle.cycle_id);
        let action: Action = Action::new(
            String::from("SubmitNomination"),
            Some(format!("Nominated {} in cycle {}", nomination.nominee_id, cycle.cycle_id)),
        );
        let audit_event: AuditEvent = AuditEvent::new(
            ctx.actor(),
            cause,
            action,
            before,
            after,
            Some(cycle.cycle_id.clone()),
        );

        Ok(Recorded {
            value: nomination,
            audit_event,
        })
    }

    /// Withdraws the caller's nomination in the cycle.
    ///
    /// Idempotent: when no nomination exists the call succeeds with
    /// `false` and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller lacks `can_nominate`
    /// - The cycle's nomination window is not open at `now`
    /// - The store rejects the delete
    pub async fn withdraw(
        &mut self,
        ctx: &CallerContext,
        cause: Cause,
        cycle: &Cycle,
        now: OffsetDateTime,
    ) -> Result<Recorded<bool>, EngineError> {
        let voter: &Caller = self.require_nominator(ctx, "WithdrawNomination")?;
        let voter_id: EmployeeId = voter.id.clone();

        if !cycle.nomination_open(now) {
            return Err(EngineError::Validation(
                DomainError::NominationWindowClosed {
                    cycle_id: cycle.cycle_id.clone(),
                },
            ));
        }

        if self.cycle_id.as_ref() != Some(&cycle.cycle_id) {
            self.load(&cycle.cycle_id).await?;
        }

        let before: StateSnapshot = self.snapshot(&cycle.cycle_id);

        if self.nomination_for(&voter_id).is_none() {
            debug!("no nomination to withdraw for {voter_id} in cycle {}", cycle.cycle_id);
            let action: Action = Action::new(
                String::from("WithdrawNomination"),
                Some(String::from("No nomination to withdraw")),
            );
            let audit_event: AuditEvent = AuditEvent::new(
                ctx.actor(),
                cause,
                action,
                before.clone(),
                before,
                Some(cycle.cycle_id.clone()),
            );
            return Ok(Recorded {
                value: false,
                audit_event,
            });
        }

        // Optimistic removal with exact rollback on failure
        let rollback: Vec<Nomination> = self.cache.clone();
        self.cache
            .retain(|nomination| nomination.voter_id != voter_id);

        match self
            .store
            .delete_for_voter(&cycle.cycle_id, &voter_id)
            .await
        {
            Ok(()) => {}
            // The row was already gone remotely; the withdrawal stands
            Err(StoreError::NotFound(_)) => {}
            Err(err) => {
                warn!("withdraw failed for {voter_id}: {err}; rolling back cache");
                self.cache = rollback;
                return Err(EngineError::from(err));
            }
        }

        info!("withdrew nomination of {voter_id} in cycle {}", cycle.cycle_id);

        let after: StateSnapshot = self.snapshot(&cycle.cycle_id);
        let action: Action = Action::new(
            String::from("WithdrawNomination"),
            Some(format!("Withdrew nomination of {voter_id}")),
        );
        let audit_event: AuditEvent = AuditEvent::new(
            ctx.actor(),
            cause,
            action,
            before,
            after,
            Some(cycle.cycle_id.clone()),
        );

        Ok(Recorded {
            value: true,
            audit_event,
        })
    }

    /// Checks the nominate capability and returns the resolved caller.
    fn require_nominator<'a>(
        &self,
        ctx: &'a CallerContext,
        action: &str,
    ) -> Result<&'a Caller, EngineError> {
        if !ctx.capabilities.can_nominate {
            return Err(EngineError::Unauthorized {
                action: action.to_owned(),
                required_role: String::from("Member"),
            });
        }
        ctx.caller.as_ref().ok_or_else(|| EngineError::Unauthorized {
            action: action.to_owned(),
            required_role: String::from("Member"),
        })
    }

    fn snapshot(&self, cycle_id: &CycleId) -> StateSnapshot {
        StateSnapshot::new(format!(
            "cycle={},nominations_count={}",
            cycle_id.value(),
            self.cache.len()
        ))
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Workflow engine facade.
//!
//! Wires the gate, cycle repository, and both ledgers into the cycle
//! workflow: the repository supplies the active or completed cycle, the
//! nomination ledger collects votes scoped to it, the ranking engine
//! computes standings, the validation ledger collects confirmations
//! scoped to the finalists, and winner resolution finalizes the result
//! once the window closes.
//!
//! The engine never reads the wall clock and never runs timers; every
//! time-sensitive operation takes `now` from the caller and reacts to
//! the cycle state it is told.

use crate::Recorded;
use crate::cycles::CycleRepository;
use crate::error::EngineError;
use crate::gate::{CallerContext, resolve_caller};
use crate::nominations::NominationLedger;
use crate::ports::{
    ChangeEvent, CycleStore, IdentityService, NominationStore, ProfileDirectory, ValidationStore,
};
use crate::retry::with_read_retry;
use crate::validations::{ValidationLedger, ValidationOutcome};
use hero_cycle_audit::Cause;
use hero_cycle_domain::{
    CapabilityTag, Cycle, DomainError, EmployeeId, Nomination, NominationPeriod, Profile, SkillId,
    Standings, TieBreakPolicy, WinnerResolution, rank, resolve_winner, tally_validations,
};
use std::collections::HashMap;
use time::OffsetDateTime;
use tracing::debug;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// The program's declared IANA timezone, used to resolve scheduled
    /// cycle boundaries.
    pub timezone: String,
    /// Tie-break policy applied when ranking nominees.
    pub tie_break: TieBreakPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: String::from("Europe/Paris"),
            tie_break: TieBreakPolicy::default(),
        }
    }
}

/// The assembled nomination cycle workflow engine.
///
/// Each store parameter is a cheap-clone handle onto the backing
/// collaborator; the engine holds one handle per component.
pub struct WorkflowEngine<I, C, N, V, P> {
    identity: I,
    profiles: P,
    config: EngineConfig,
    ctx: CallerContext,
    /// Cycle lifecycle queries and administrative scheduling.
    pub cycles: CycleRepository<C>,
    /// The ongoing or reviewed cycle's nominations.
    pub nominations: NominationLedger<N>,
    /// The reviewed cycle's validations.
    pub validations: ValidationLedger<V>,
}

impl<I, C, N, V, P> WorkflowEngine<I, C, N, V, P>
where
    I: IdentityService,
    C: CycleStore,
    N: NominationStore,
    V: ValidationStore,
    P: ProfileDirectory,
{
    /// Assembles an engine over the collaborator handles.
    ///
    /// The engine starts fail-closed; call [`sign_in`](Self::sign_in) to
    /// resolve the caller.
    #[must_use]
    pub fn new(
        identity: I,
        cycle_store: C,
        nomination_store: N,
        validation_store: V,
        profiles: P,
        config: EngineConfig,
    ) -> Self {
        let cycles: CycleRepository<C> = CycleRepository::new(cycle_store, &config.timezone);
        Self {
            identity,
            profiles,
            config,
            ctx: CallerContext::fail_closed(),
            cycles,
            nominations: NominationLedger::new(nomination_store),
            validations: ValidationLedger::new(validation_store),
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the resolved caller context.
    #[must_use]
    pub const fn caller(&self) -> &CallerContext {
        &self.ctx
    }

    /// Resolves the current caller through the identity port.
    ///
    /// Fail-closed: on any identity failure the context denies
    /// everything.
    pub async fn sign_in(&mut self) -> &CallerContext {
        self.ctx = resolve_caller(&self.identity).await;
        &self.ctx
    }

    /// Returns the ongoing cycle and scopes the nomination ledger to it.
    ///
    /// # Errors
    ///
    /// Returns `Validation(NoOngoingCycle)` when no cycle is ongoing, or
    /// a transient error if the store stays unreachable.
    pub async fn open_nomination(&mut self) -> Result<Cycle, EngineError> {
        let cycle: Cycle = self
            .cycles
            .ongoing_cycle()
            .await?
            .ok_or(EngineError::Validation(DomainError::NoOngoingCycle))?;
        self.nominations.load(&cycle.cycle_id).await?;
        Ok(cycle)
    }

    /// Returns the latest completed cycle and scopes both ledgers to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller lacks `can_review`, no completed
    /// cycle exists, or the store stays unreachable.
    pub async fn open_review(&mut self) -> Result<Cycle, EngineError> {
        if !self.ctx.capabilities.can_review {
            return Err(EngineError::Unauthorized {
                action: String::from("OpenReview"),
                required_role: String::from("Approver"),
            });
        }
        let cycle: Cycle = self
            .cycles
            .latest_completed_cycle()
            .await?
            .ok_or(EngineError::Validation(DomainError::NoCompletedCycle))?;
        self.nominations.load(&cycle.cycle_id).await?;
        self.validations.load(&cycle.cycle_id).await?;
        Ok(cycle)
    }

    /// Computes the current standings from the loaded ledgers.
    #[must_use]
    pub fn standings(&self) -> Standings {
        let caller_id: Option<&EmployeeId> = self.ctx.caller.as_ref().map(|caller| &caller.id);
        rank(
            self.nominations.nominations(),
            self.validations.validations(),
            caller_id,
            self.config.tie_break,
        )
    }

    /// Fetches display profiles for every nominee in the standings.
    ///
    /// Nominees unknown to the directory are simply absent from the map.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the directory stays
    /// unreachable after bounded retry.
    pub async fn profiles_for(
        &self,
        standings: &Standings,
    ) -> Result<HashMap<EmployeeId, Profile>, EngineError> {
        let mut profiles: HashMap<EmployeeId, Profile> = HashMap::new();
        for standing in standings.finalists.iter().chain(standings.others.iter()) {
            let nominee_id: &EmployeeId = &standing.nominee_id;
            let profile: Option<Profile> =
                with_read_retry("profile_by_id", || self.profiles.profile_by_id(nominee_id))
                    .await?;
            if let Some(profile) = profile {
                profiles.insert(nominee_id.clone(), profile);
            }
        }
        Ok(profiles)
    }

    /// Submits the caller's nomination in the ongoing cycle.
    ///
    /// # Errors
    ///
    /// See [`NominationLedger::submit`]; additionally returns
    /// `Validation(NoOngoingCycle)` when no cycle is ongoing.
    pub async fn submit_nomination(
        &mut self,
        cause: Cause,
        now: OffsetDateTime,
        nominee_id: EmployeeId,
        tags: Vec<CapabilityTag>,
        justification: String,
        remarks: Option<String>,
    ) -> Result<Recorded<Nomination>, EngineError> {
        let cycle: Cycle = self
            .cycles
            .ongoing_cycle()
            .await?
            .ok_or(EngineError::Validation(DomainError::NoOngoingCycle))?;
        self.nominations
            .submit(
                &self.ctx,
                cause,
                &cycle,
                now,
                nominee_id,
                tags,
                justification,
                remarks,
            )
            .await
    }

    /// Withdraws the caller's nomination in the ongoing cycle.
    ///
    /// # Errors
    ///
    /// See [`NominationLedger::withdraw`]; additionally returns
    /// `Validation(NoOngoingCycle)` when no cycle is ongoing.
    pub async fn withdraw_nomination(
        &mut self,
        cause: Cause,
        now: OffsetDateTime,
    ) -> Result<Recorded<bool>, EngineError> {
        let cycle: Cycle = self
            .cycles
            .ongoing_cycle()
            .await?
            .ok_or(EngineError::Validation(DomainError::NoOngoingCycle))?;
        self.nominations
            .withdraw(&self.ctx, cause, &cycle, now)
            .await
    }

    /// Confirms a finalist of the latest completed cycle.
    ///
    /// Finalist membership is computed from the current standings before
    /// the confirmation is applied.
    ///
    /// # Errors
    ///
    /// See [`ValidationLedger::confirm`]; additionally returns
    /// `Validation(NoCompletedCycle)` when no completed cycle exists.
    pub async fn confirm_finalist(
        &mut self,
        cause: Cause,
        now: OffsetDateTime,
        nominee_id: EmployeeId,
    ) -> Result<Recorded<ValidationOutcome>, EngineError> {
        let cycle: Cycle = self
            .cycles
            .latest_completed_cycle()
            .await?
            .ok_or(EngineError::Validation(DomainError::NoCompletedCycle))?;
        if self.nominations.cycle_id() != Some(&cycle.cycle_id) {
            self.nominations.load(&cycle.cycle_id).await?;
        }
        let finalists: Vec<EmployeeId> = self.standings().finalist_ids();
        self.validations
            .confirm(&self.ctx, cause, &cycle, now, nominee_id, &finalists)
            .await
    }

    /// Resolves the winner of the latest completed cycle.
    ///
    /// Pure with respect to the loaded ledgers: the winner is the
    /// finalist with the highest validation count; ties are surfaced.
    /// Writing the winner row remains the backing collaborator's job.
    ///
    /// # Errors
    ///
    /// Returns an error if no completed cycle exists, the validation
    /// window is still open at `now`, or the store stays unreachable.
    pub async fn resolve_current_winner(
        &mut self,
        now: OffsetDateTime,
    ) -> Result<WinnerResolution, EngineError> {
        let cycle: Cycle = self
            .cycles
            .latest_completed_cycle()
            .await?
            .ok_or(EngineError::Validation(DomainError::NoCompletedCycle))?;
        if !cycle.is_resolved(now) {
            return Err(EngineError::Validation(
                DomainError::ValidationWindowStillOpen {
                    cycle_id: cycle.cycle_id,
                },
            ));
        }

        if self.nominations.cycle_id() != Some(&cycle.cycle_id) {
            self.nominations.load(&cycle.cycle_id).await?;
        }
        if self.validations.cycle_id() != Some(&cycle.cycle_id) {
            self.validations.load(&cycle.cycle_id).await?;
        }

        let finalists: Vec<EmployeeId> = self.standings().finalist_ids();
        let counts: Vec<(EmployeeId, usize)> = tally_validations(self.validations.validations());
        Ok(resolve_winner(&finalists, &counts))
    }

    /// Reacts to a change notification from the backing store.
    ///
    /// The affected ledger is re-fetched in full; there is no incremental
    /// merge. A cycle change carries no ledger of its own; consumers
    /// re-open their view to pick up the new scope.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the re-fetch stays
    /// unreachable after bounded retry.
    pub async fn handle_change(&mut self, event: ChangeEvent) -> Result<(), EngineError> {
        match event {
            ChangeEvent::Nominations => self.nominations.refresh().await,
            ChangeEvent::Validations => self.validations.refresh().await,
            ChangeEvent::Cycles => {
                debug!("cycle change notification; views should be re-opened");
                Ok(())
            }
        }
    }

    /// Schedules (or reschedules) the next cycle.
    ///
    /// # Errors
    ///
    /// See [`CycleRepository::schedule_next_cycle`].
    pub async fn schedule_next_cycle(
        &mut self,
        cause: Cause,
        skill_id: SkillId,
        start_date: time::Date,
        period: NominationPeriod,
    ) -> Result<Recorded<Cycle>, EngineError> {
        self.cycles
            .schedule_next_cycle(&self.ctx, cause, skill_id, start_date, period)
            .await
    }

    /// Clears the ongoing cycle.
    ///
    /// # Errors
    ///
    /// See [`CycleRepository::delete_ongoing_cycle`].
    pub async fn delete_ongoing_cycle(
        &mut self,
        cause: Cause,
    ) -> Result<Recorded<bool>, EngineError> {
        self.cycles.delete_ongoing_cycle(&self.ctx, cause).await
    }
}

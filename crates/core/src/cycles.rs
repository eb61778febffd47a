// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Cycle repository: lifecycle queries and administrative scheduling.
//!
//! Cycle rows are owned by the cycle store; this component adds
//! capability gating, window derivation, and overlap enforcement. Reads
//! go to the store on every call (with bounded retry); there is no local
//! cycle cache to go stale.

use crate::Recorded;
use crate::error::EngineError;
use crate::gate::CallerContext;
use crate::ports::{CycleStore, NewCycle};
use crate::retry::with_read_retry;
use hero_cycle_audit::{Action, AuditEvent, Cause, StateSnapshot};
use hero_cycle_domain::{
    Cycle, DomainError, NominationPeriod, SkillId, resolve_cycle_window,
};
use tracing::{info, warn};

/// Query and mutation surface over the cycle store.
pub struct CycleRepository<S> {
    store: S,
    timezone: String,
}

impl<S: CycleStore> CycleRepository<S> {
    /// Creates a repository over a cycle store.
    ///
    /// # Arguments
    ///
    /// * `store` - The backing cycle store handle
    /// * `timezone` - The program's declared IANA timezone, used to
    ///   resolve scheduled cycle boundaries
    #[must_use]
    pub fn new(store: S, timezone: &str) -> Self {
        Self {
            store,
            timezone: timezone.to_owned(),
        }
    }

    /// Returns the single `Ongoing` cycle, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the store stays unreachable
    /// after bounded retry.
    pub async fn ongoing_cycle(&self) -> Result<Option<Cycle>, EngineError> {
        with_read_retry("ongoing_cycle", || self.store.ongoing_cycle())
            .await
            .map_err(EngineError::from)
    }

    /// Returns the single `Next` cycle, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the store stays unreachable
    /// after bounded retry.
    pub async fn next_cycle(&self) -> Result<Option<Cycle>, EngineError> {
        with_read_retry("next_cycle", || self.store.next_cycle())
            .await
            .map_err(EngineError::from)
    }

    /// Returns the most recently ended `Completed` cycle, or `None`.
    ///
    /// Older completed cycles are not reachable; the review surface only
    /// ever considers the immediately preceding cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the store stays unreachable
    /// after bounded retry.
    pub async fn latest_completed_cycle(&self) -> Result<Option<Cycle>, EngineError> {
        with_read_retry("latest_completed_cycle", || {
            self.store.latest_completed_cycle()
        })
        .await
        .map_err(EngineError::from)
    }

    /// Schedules (or reschedules) the `Next` cycle.
    ///
    /// The end date is derived as `start + period - 1 day`; the
    /// validation window closes seven days after the end date. A start
    /// date on or before the ongoing cycle's end date is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller lacks `can_administer`
    /// - The window cannot be resolved (bad timezone, date overflow)
    /// - The requested start overlaps the ongoing cycle
    /// - The store rejects the write
    pub async fn schedule_next_cycle(
        &mut self,
        ctx: &CallerContext,
        cause: Cause,
        skill_id: SkillId,
        start_date: time::Date,
        period: NominationPeriod,
    ) -> Result<Recorded<Cycle>, EngineError> {
        if !ctx.capabilities.can_administer {
            return Err(EngineError::Unauthorized {
                action: String::from("ScheduleNextCycle"),
                required_role: String::from("Admin"),
            });
        }

        let window = resolve_cycle_window(start_date, period, &self.timezone)?;

        // Overlap enforcement: the next cycle may not begin before the
        // ongoing one has ended. Compared at date granularity, matching
        // how cycles are scheduled.
        if let Some(ongoing) = self.ongoing_cycle().await? {
            if start_date <= ongoing.end_date.date() {
                return Err(EngineError::Validation(DomainError::CycleOverlap {
                    requested_start: start_date.to_string(),
                    ongoing_end: ongoing.end_date.date().to_string(),
                }));
            }
        }

        let previous_next: Option<Cycle> = self.next_cycle().await?;

        // Mutations are never retried
        let cycle: Cycle = self
            .store
            .put_next_cycle(NewCycle {
                skill_id: skill_id.clone(),
                period,
                start_date: window.start,
                end_date: window.end,
                validation_end_date: window.validation_end,
            })
            .await
            .map_err(EngineError::from)?;

        info!(
            "scheduled next cycle {} (skill {}, {period}, {start_date} .. {})",
            cycle.cycle_id,
            skill_id.value(),
            cycle.end_date.date()
        );

        let before: StateSnapshot = StateSnapshot::new(format!(
            "next_cycle={}",
            previous_next
                .as_ref()
                .map_or("none", |cycle| cycle.cycle_id.value())
        ));
        let after: StateSnapshot =
            StateSnapshot::new(format!("next_cycle={}", cycle.cycle_id.value()));
        let action: Action = Action::new(
            String::from("ScheduleNextCycle"),
            Some(format!(
                "Scheduled {period} cycle for skill '{}' starting {start_date}",
                skill_id.value()
            )),
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
            value: cycle,
            audit_event,
        })
    }

    /// Clears the `Ongoing` cycle, returning the program to the
    /// "no active cycle" state. Irreversible.
    ///
    /// Idempotent: when no cycle is ongoing, nothing is written and the
    /// returned value is `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller lacks `can_administer` or the store
    /// rejects the write.
    pub async fn delete_ongoing_cycle(
        &mut self,
        ctx: &CallerContext,
        cause: Cause,
    ) -> Result<Recorded<bool>, EngineError> {
        if !ctx.capabilities.can_administer {
            return Err(EngineError::Unauthorized {
                action: String::from("ClearOngoingCycle"),
                required_role: String::from("Admin"),
            });
        }

        let ongoing: Option<Cycle> = self.ongoing_cycle().await?;
        let Some(ongoing) = ongoing else {
            let snapshot: StateSnapshot = StateSnapshot::new(String::from("ongoing_cycle=none"));
            let action: Action = Action::new(
                String::from("ClearOngoingCycle"),
                Some(String::from("No ongoing cycle to clear")),
            );
            let audit_event: AuditEvent = AuditEvent::new(
                ctx.actor(),
                cause,
                action,
                snapshot.clone(),
                snapshot,
                None,
            );
            return Ok(Recorded {
                value: false,
                audit_event,
            });
        };

        self.store
            .clear_ongoing_cycle()
            .await
            .map_err(EngineError::from)?;

        warn!("cleared ongoing cycle {}", ongoing.cycle_id);

        let before: StateSnapshot = StateSnapshot::new(format!(
            "ongoing_cycle={}",
            ongoing.cycle_id.value()
        ));
        let after: StateSnapshot = StateSnapshot::new(String::from("ongoing_cycle=none"));
        let action: Action = Action::new(
            String::from("ClearOngoingCycle"),
            Some(format!("Cleared ongoing cycle {}", ongoing.cycle_id)),
        );
        let audit_event: AuditEvent = AuditEvent::new(
            ctx.actor(),
            cause,
            action,
            before,
            after,
            Some(ongoing.cycle_id),
        );

        Ok(Recorded {
            value: true,
            audit_event,
        })
    }
}

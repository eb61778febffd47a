// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Validation ledger with an optimistic local cache.
//!
//! One validation per validator per cycle. Confirming the validator's
//! current choice again withdraws it (toggle); confirming a different
//! finalist replaces the prior validation.
//!
//! The replace is the only two-step sequence in the workflow: delete the
//! old row, insert the new one. The store offers no atomic primitive, so
//! the sequence is wrapped in a compensating transaction: if the insert
//! fails after the delete succeeded, the original row is re-inserted
//! before the error is surfaced. If compensation itself fails, the ledger
//! reports an integrity error instructing the caller to re-attempt; it
//! never silently drops state. In every failure mode the cache is
//! restored to its exact pre-call contents.

use crate::Recorded;
use crate::error::EngineError;
use crate::gate::CallerContext;
use crate::ports::{Caller, NewValidation, StoreError, ValidationStore};
use crate::retry::with_read_retry;
use hero_cycle_audit::{Action, AuditEvent, Cause, StateSnapshot};
use hero_cycle_domain::{Cycle, CycleId, DomainError, EmployeeId, Validation};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

/// The effect a confirm call had on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// A new validation was recorded.
    Confirmed(Validation),
    /// The validator's existing validation was withdrawn (toggle).
    Withdrawn {
        /// The finalist whose confirmation was withdrawn.
        nominee_id: EmployeeId,
    },
    /// The validator's validation moved to a different finalist.
    Replaced {
        /// The previously confirmed finalist.
        previous: EmployeeId,
        /// The newly recorded validation.
        current: Validation,
    },
}

/// Optimistic ledger of one cycle's validations.
pub struct ValidationLedger<S> {
    store: S,
    cycle_id: Option<CycleId>,
    cache: Vec<Validation>,
}

impl<S: ValidationStore> ValidationLedger<S> {
    /// Creates an empty, unscoped ledger over a validation store.
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

    /// Returns the cached validations.
    #[must_use]
    pub fn validations(&self) -> &[Validation] {
        &self.cache
    }

    /// Number of validations currently recorded for a nominee.
    #[must_use]
    pub fn count_for(&self, nominee_id: &EmployeeId) -> usize {
        self.cache
            .iter()
            .filter(|validation| &validation.nominee_id == nominee_id)
            .count()
    }

    /// The finalist the validator currently has confirmed, or `None`.
    #[must_use]
    pub fn validator_choice(&self, validator_id: &EmployeeId) -> Option<&EmployeeId> {
        self.cache
            .iter()
            .find(|validation| &validation.validator_id == validator_id)
            .map(|validation| &validation.nominee_id)
    }

    /// Scopes the ledger to a cycle and fetches its validations.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transient`] if the store stays unreachable
    /// after bounded retry.
    pub async fn load(&mut self, cycle_id: &CycleId) -> Result<(), EngineError> {
        let rows: Vec<Validation> =
            with_read_retry("list_validations", || self.store.list_for_cycle(cycle_id)).await?;
        debug!("loaded {} validation(s) for cycle {cycle_id}", rows.len());
        self.cycle_id = Some(cycle_id.clone());
        self.cache = rows;
        Ok(())
    }

    /// Re-fetches the full loaded scope, replacing the cache.
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

    /// Confirms a finalist, with toggle and replace semantics.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The caller lacks `can_validate`
    /// - The cycle's validation window is not open at `now`
    /// - `nominee_id` is not among `finalists`
    /// - The store rejects a write ([`EngineError::Integrity`] when a
    ///   failed replace could not be compensated)
    pub async fn confirm(
        &mut self,
        ctx: &CallerContext,
        cause: Cause,
        cycle: &Cycle,
        now: OffsetDateTime,
        nominee_id: EmployeeId,
        finalists: &[EmployeeId],
    ) -> Result<Recorded<ValidationOutcome>, EngineError> {
        let validator: &Caller = self.require_validator(ctx)?;
        let validator_id: EmployeeId = validator.id.clone();

        if !cycle.validation_open(now) {
            return Err(EngineError::Validation(
                DomainError::ValidationWindowClosed {
                    cycle_id: cycle.cycle_id.clone(),
                },
            ));
        }

        if !finalists.contains(&nominee_id) {
            return Err(EngineError::Validation(DomainError::NotAFinalist {
                nominee_id,
            }));
        }

        if self.cycle_id.as_ref() != Some(&cycle.cycle_id) {
            self.load(&cycle.cycle_id).await?;
        }

        let before: StateSnapshot = self.snapshot(&cycle.cycle_id);
        let existing: Option<Validation> = self
            .cache
            .iter()
            .find(|validation| validation.validator_id == validator_id)
            .cloned();

        let outcome: ValidationOutcome = match existing {
            Some(current) if current.nominee_id == nominee_id => {
                self.toggle_off(cycle, &validator_id, current.nominee_id)
                    .await?
            }
            Some(previous) => {
                self.replace(cycle, &validator_id, previous, nominee_id)
                    .await?
            }
            None => self.insert_new(cycle, &validator_id, nominee_id).await?,
        };

        let after: StateSnapshot = self.snapshot(&cycle.cycle_id);
        let action: Action = Action::new(
            String::from("ConfirmFinalist"),
            Some(outcome_details(&outcome, &validator_id)),
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
            value: outcome,
            audit_event,
        })
    }

    /// Withdraws the validator's current confirmation (toggle off).
    async fn toggle_off(
        &mut self,
        cycle: &Cycle,
        validator_id: &EmployeeId,
        nominee_id: EmployeeId,
    ) -> Result<ValidationOutcome, EngineError> {
        let rollback: Vec<Validation> = self.cache.clone();
        self.cache
            .retain(|validation| &validation.validator_id != validator_id);

        match self
            .store
            .delete_for_validator(&cycle.cycle_id, validator_id)
            .await
        {
            Ok(()) => {}
            // Already absent remotely; the withdrawal stands
            Err(StoreError::NotFound(_)) => {}
            Err(err) => {
                warn!("validation withdrawal failed for {validator_id}: {err}; rolling back cache");
                self.cache = rollback;
                return Err(EngineError::from(err));
            }
        }

        info!("withdrew validation of {validator_id} for {nominee_id} in cycle {}", cycle.cycle_id);
        Ok(ValidationOutcome::Withdrawn { nominee_id })
    }

    /// Records a first confirmation for the validator.
    async fn insert_new(
        &mut self,
        cycle: &Cycle,
        validator_id: &EmployeeId,
        nominee_id: EmployeeId,
    ) -> Result<ValidationOutcome, EngineError> {
        // The cache is untouched until the insert succeeds
        let validation: Validation = self
            .store
            .insert(NewValidation {
                cycle_id: cycle.cycle_id.clone(),
                validator_id: validator_id.clone(),
                nominee_id,
            })
            .await
            .map_err(EngineError::from)?;

        self.cache.push(validation.clone());
        info!(
            "recorded validation {} ({validator_id} -> {}) in cycle {}",
            validation.validation_id.value(),
            validation.nominee_id,
            cycle.cycle_id
        );
        Ok(ValidationOutcome::Confirmed(validation))
    }

    /// Moves the validator's confirmation to a different finalist.
    ///
    /// Delete-then-insert with a compensating re-insert of the original
    /// row when the second step fails.
    async fn replace(
        &mut self,
        cycle: &Cycle,
        validator_id: &EmployeeId,
        previous: Validation,
        nominee_id: EmployeeId,
    ) -> Result<ValidationOutcome, EngineError> {
        let rollback: Vec<Validation> = self.cache.clone();
        self.cache
            .retain(|validation| &validation.validator_id != validator_id);

        match self
            .store
            .delete_for_validator(&cycle.cycle_id, validator_id)
            .await
        {
            Ok(()) => {}
            // Already absent remotely; proceed to the insert
            Err(StoreError::NotFound(_)) => {}
            Err(err) => {
                warn!("validation replace delete failed for {validator_id}: {err}; rolling back cache");
                self.cache = rollback;
                return Err(EngineError::from(err));
            }
        }

        match self
            .store
            .insert(NewValidation {
                cycle_id: cycle.cycle_id.clone(),
                validator_id: validator_id.clone(),
                nominee_id,
            })
            .await
        {
            Ok(validation) => {
                self.cache.push(validation.clone());
                info!(
                    "moved validation of {validator_id} from {} to {} in cycle {}",
                    previous.nominee_id, validation.nominee_id, cycle.cycle_id
                );
                Ok(ValidationOutcome::Replaced {
                    previous: previous.nominee_id,
                    current: validation,
                })
            }
            Err(insert_err) => {
                // The delete already succeeded: without compensation the
                // validator would be left with zero rows remotely
                warn!(
                    "validation replace insert failed for {validator_id}: {insert_err}; \
                     compensating with re-insert of original row"
                );
                let compensation = self
                    .store
                    .insert(NewValidation {
                        cycle_id: previous.cycle_id.clone(),
                        validator_id: previous.validator_id.clone(),
                        nominee_id: previous.nominee_id.clone(),
                    })
                    .await;

                // The cache returns to its exact pre-call contents either
                // way; the re-inserted row's identity may differ from the
                // cached original until the next refresh
                self.cache = rollback;

                match compensation {
                    Ok(_) => Err(EngineError::from(insert_err)),
                    Err(comp_err) => {
                        error!(
                            "compensation failed for {validator_id}: {comp_err}; ledger is \
                             missing their validation remotely"
                        );
                        Err(EngineError::Integrity {
                            message: format!(
                                "replacing the validation of {validator_id} failed \
                                 ({insert_err}) and re-inserting the original row also failed \
                                 ({comp_err}); re-attempt the confirmation manually"
                            ),
                        })
                    }
                }
            }
        }
    }

    /// Checks the validate capability and returns the resolved caller.
    fn require_validator<'a>(&self, ctx: &'a CallerContext) -> Result<&'a Caller, EngineError> {
        if !ctx.capabilities.can_validate {
            return Err(EngineError::Unauthorized {
                action: String::from("ConfirmFinalist"),
                required_role: String::from("Approver"),
            });
        }
        ctx.caller.as_ref().ok_or_else(|| EngineError::Unauthorized {
            action: String::from("ConfirmFinalist"),
            required_role: String::from("Approver"),
        })
    }

    fn snapshot(&self, cycle_id: &CycleId) -> StateSnapshot {
        StateSnapshot::new(format!(
            "cycle={},validations_count={}",
            cycle_id.value(),
            self.cache.len()
        ))
    }
}

fn outcome_details(outcome: &ValidationOutcome, validator_id: &EmployeeId) -> String {
    match outcome {
        ValidationOutcome::Confirmed(validation) => {
            format!("{validator_id} confirmed {}", validation.nominee_id)
        }
        ValidationOutcome::Withdrawn { nominee_id } => {
            format!("{validator_id} withdrew confirmation of {nominee_id}")
        }
        ValidationOutcome::Replaced { previous, current } => {
            format!(
                "{validator_id} moved confirmation from {previous} to {}",
                current.nominee_id
            )
        }
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod cycles;
mod engine;
mod error;
mod gate;
mod nominations;
pub mod ports;
mod retry;
mod validations;

#[cfg(test)]
mod tests;

use hero_cycle_audit::AuditEvent;

// Re-export public types and functions
pub use cycles::CycleRepository;
pub use engine::{EngineConfig, WorkflowEngine};
pub use error::EngineError;
pub use gate::{CallerContext, resolve_caller};
pub use nominations::NominationLedger;
pub use ports::{
    Caller, ChangeEvent, CycleStore, IdentityService, NewCycle, NewNomination, NewValidation,
    NominationStore, ProfileDirectory, StoreError, ValidationStore,
};
pub use validations::{ValidationLedger, ValidationOutcome};

/// The result of a successful mutation.
///
/// Every successful state change produces exactly one audit event
/// alongside its value. Mutations are atomic with respect to the local
/// cache: they either succeed completely or leave it unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded<T> {
    /// The value produced by the mutation.
    pub value: T,
    /// The audit event recording this transition.
    pub audit_event: AuditEvent,
}

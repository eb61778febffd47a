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

mod cycle_window;
mod error;
mod resolve;
mod roles;
mod standings;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use cycle_window::{CycleWindow, VALIDATION_WINDOW_DAYS, derive_end_date, resolve_cycle_window};
pub use error::DomainError;
pub use resolve::{WinnerResolution, resolve_winner, tally_validations};
pub use roles::{Capabilities, Role};
pub use standings::{FINALIST_SLOTS, NomineeStanding, Standings, TieBreakPolicy, rank};
pub use validation::{MAX_JUSTIFICATION_LEN, MAX_REMARKS_LEN, validate_nomination_input};

// Re-export public types
pub use types::{
    CapabilityTag, Cycle, CycleId, CycleStatus, EmployeeId, Nomination, NominationId,
    NominationPeriod, Profile, SkillId, Validation, ValidationId, Winner,
};

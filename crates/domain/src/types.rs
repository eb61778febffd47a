// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::OffsetDateTime;

/// Opaque identifier for an employee profile.
///
/// Identity is owned by an external directory; the workflow engine never
/// mutates profiles and treats the id as an opaque reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId {
    /// The identifier value as issued by the identity service.
    value: String,
}

impl EmployeeId {
    /// Creates a new `EmployeeId`.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Opaque identifier for a nomination cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId {
    /// The identifier value as issued by the cycle store.
    value: String,
}

impl CycleId {
    /// Creates a new `CycleId`.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Opaque identifier for the skill a cycle rewards.
///
/// The skill catalogue (category, description, icon) is administered
/// outside the engine; cycles reference a skill by id only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillId {
    /// The identifier value.
    value: String,
}

impl SkillId {
    /// Creates a new `SkillId`.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Opaque identifier for a nomination row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NominationId {
    /// The identifier value as issued by the nomination store.
    value: String,
}

impl NominationId {
    /// Creates a new `NominationId`.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Opaque identifier for a validation row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationId {
    /// The identifier value as issued by the validation store.
    value: String,
}

impl ValidationId {
    /// Creates a new `ValidationId`.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }

    /// Returns the identifier value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A capability tag selected on a nomination (e.g. "Leadership").
///
/// Tags are free-form labels drawn from the rewarded skill's catalogue.
/// Whitespace is trimmed; an all-whitespace tag is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityTag {
    /// The tag label.
    value: String,
}

impl CapabilityTag {
    /// Creates a new `CapabilityTag`, trimming surrounding whitespace.
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.trim().to_owned(),
        }
    }

    /// Returns the tag label.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Represents the lifecycle state of a nomination cycle.
///
/// At most one cycle is `Next` and at most one is `Ongoing` at any time.
/// A `Completed` cycle is immutable except for winner attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStatus {
    /// Scheduled but not yet started. Editable by administrators.
    Next,
    /// The nomination window is running.
    Ongoing,
    /// The nomination window has ended; validation and resolution follow.
    Completed,
}

impl FromStr for CycleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => Ok(Self::Next),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            _ => Err(DomainError::InvalidCycleStatus(s.to_owned())),
        }
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl CycleStatus {
    /// Converts this status to its wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    /// Checks if a transition from this status to another is valid.
    ///
    /// Valid transitions are:
    /// - `Next` → `Ongoing` (triggered by the external scheduler)
    /// - `Ongoing` → `Completed` (end date reached)
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Next, Self::Ongoing) | (Self::Ongoing, Self::Completed)
        )
    }
}

/// The length of a nomination period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NominationPeriod {
    /// One calendar month.
    #[serde(rename = "monthly")]
    Monthly,
    /// Two calendar months.
    #[serde(rename = "bi-monthly")]
    BiMonthly,
}

impl FromStr for NominationPeriod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "bi-monthly" => Ok(Self::BiMonthly),
            _ => Err(DomainError::InvalidNominationPeriod(s.to_owned())),
        }
    }
}

impl std::fmt::Display for NominationPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl NominationPeriod {
    /// Converts this period to its wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::BiMonthly => "bi-monthly",
        }
    }

    /// Returns the number of calendar months the period spans.
    #[must_use]
    pub const fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::BiMonthly => 2,
        }
    }
}

/// One nomination period with a defined skill focus and date range.
///
/// All timestamps are UTC instants. The validation window of a completed
/// cycle runs from its end date to `validation_end_date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// The canonical identifier assigned by the cycle store.
    pub cycle_id: CycleId,
    /// The lifecycle state of this cycle.
    pub status: CycleStatus,
    /// The skill rewarded during this cycle.
    pub skill_id: SkillId,
    /// The length of the nomination period.
    pub period: NominationPeriod,
    /// When the nomination window opens.
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    /// When the nomination window closes.
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    /// When the validation window closes.
    #[serde(with = "time::serde::rfc3339")]
    pub validation_end_date: OffsetDateTime,
}

impl Cycle {
    /// Returns whether nominations may be submitted at `now`.
    ///
    /// The window is open only while the cycle is `Ongoing` and `now`
    /// falls within its date range.
    #[must_use]
    pub fn nomination_open(&self, now: OffsetDateTime) -> bool {
        self.status == CycleStatus::Ongoing && now >= self.start_date && now <= self.end_date
    }

    /// Returns whether validations may be recorded at `now`.
    ///
    /// The window is open only while the cycle is `Completed` and the
    /// validation end date has not been reached.
    #[must_use]
    pub fn validation_open(&self, now: OffsetDateTime) -> bool {
        self.status == CycleStatus::Completed && now < self.validation_end_date
    }

    /// Returns whether the cycle is ready for winner resolution at `now`.
    #[must_use]
    pub fn is_resolved(&self, now: OffsetDateTime) -> bool {
        self.status == CycleStatus::Completed && now >= self.validation_end_date
    }
}

/// One voter's endorsement of one colleague within a cycle.
///
/// Unique per `(cycle_id, voter_id)`: a voter holds at most one nomination
/// per cycle. Changing one's mind requires an explicit withdraw first;
/// there is no upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nomination {
    /// The canonical identifier assigned by the nomination store.
    pub nomination_id: NominationId,
    /// The cycle this nomination belongs to.
    pub cycle_id: CycleId,
    /// The employee who submitted the nomination.
    pub voter_id: EmployeeId,
    /// The employee being nominated.
    pub nominee_id: EmployeeId,
    /// The capability tags selected for the nominee (never empty).
    pub tags: Vec<CapabilityTag>,
    /// The required free-text justification.
    pub justification: String,
    /// Optional additional remarks.
    pub remarks: Option<String>,
    /// When the nomination was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// One validator's confirmation of one finalist within a cycle.
///
/// Unique per `(cycle_id, validator_id)`: a validator holds at most one
/// active validation per cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    /// The canonical identifier assigned by the validation store.
    pub validation_id: ValidationId,
    /// The cycle this validation belongs to.
    pub cycle_id: CycleId,
    /// The validator who recorded the confirmation.
    pub validator_id: EmployeeId,
    /// The finalist being confirmed.
    pub nominee_id: EmployeeId,
    /// When the validation was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The resolved outcome of a cycle's validation phase.
///
/// At most one winner exists per cycle. The row is written once, after the
/// validation window closes, and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    /// The cycle this winner belongs to.
    pub cycle_id: CycleId,
    /// The winning nominee.
    pub nominee_id: EmployeeId,
    /// When the winner was resolved.
    #[serde(with = "time::serde::rfc3339")]
    pub decided_at: OffsetDateTime,
}

/// Display attributes of an employee, owned by the profile directory.
///
/// Read-only; used for display joins only. The workflow engine never
/// mutates profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The employee this profile describes.
    pub employee_id: EmployeeId,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Department name.
    pub department: String,
    /// Avatar image URL, if one is set.
    pub avatar_url: Option<String>,
}

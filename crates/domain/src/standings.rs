// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tally and ranking of nominations for a completed cycle.
//!
//! Nominations are grouped by nominee, counted, and sorted descending by
//! nomination count only. The first [`FINALIST_SLOTS`] entries are the
//! finalists (ranks 1-6, eligible for validation); the remainder are
//! visible but not validatable.
//!
//! ## Ranking Rules (Authoritative)
//!
//! 1. Group nominations by nominee, preserving first-appearance order
//! 2. Count = group size
//! 3. Stable sort descending by count
//! 4. Ties are broken by the configured [`TieBreakPolicy`], never by
//!    incidental map iteration order
//!
//! ## Invariants
//!
//! - `rank()` is pure and deterministic for a fixed input
//! - The finalist cutoff is a fixed constant, not configurable
//! - A nominee with zero nominations never appears in the standings

use crate::types::{EmployeeId, Nomination, Validation};

/// Number of finalist slots. Top-ranked nominees up to this cutoff are
/// eligible for validation.
pub const FINALIST_SLOTS: usize = 6;

/// Tie-break policy applied between nominees with equal counts.
///
/// The policy is an explicit, named configuration so that tie handling is
/// never an accident of fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreakPolicy {
    /// Preserve the first-appearance order of the input. This mirrors the
    /// historical behavior of the program, where tied nominees keep the
    /// order in which their nominations were fetched.
    #[default]
    InsertionOrder,
    /// Order tied nominees by ascending nominee id, giving a total order
    /// that is independent of fetch order.
    ByNomineeId,
}

/// One nominee's aggregated standing within a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NomineeStanding {
    /// The nominee being ranked.
    pub nominee_id: EmployeeId,
    /// All nominations received by this nominee, in input order.
    pub nominations: Vec<Nomination>,
    /// Number of nominations received.
    pub nomination_count: usize,
    /// Number of validator confirmations currently recorded.
    pub validation_count: usize,
    /// Whether the requesting validator has confirmed this nominee.
    pub validated_by_caller: bool,
    /// 1-based rank for finalists; `None` for other nominees.
    pub rank: Option<usize>,
}

/// The ranked standings of a cycle: finalists and other nominees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standings {
    /// The top nominees (ranks 1 through [`FINALIST_SLOTS`]).
    pub finalists: Vec<NomineeStanding>,
    /// Remaining nominees, visible but not validatable.
    pub others: Vec<NomineeStanding>,
}

impl Standings {
    /// Returns the finalist nominee ids in rank order.
    #[must_use]
    pub fn finalist_ids(&self) -> Vec<EmployeeId> {
        self.finalists
            .iter()
            .map(|standing| standing.nominee_id.clone())
            .collect()
    }
}

/// Ranks the nominations of a cycle into finalists and other nominees.
///
/// # Arguments
///
/// * `nominations` - All nominations of the cycle being reviewed
/// * `validations` - All validations currently recorded for the cycle
/// * `caller` - The requesting validator, if any; used to mark the entry
///   they have confirmed
/// * `policy` - The tie-break policy applied between equal counts
///
/// # Returns
///
/// The ranked [`Standings`]. With more than [`FINALIST_SLOTS`] distinct
/// nominees, lower-ranked nominees are excluded from the finalists
/// regardless of their count.
#[must_use]
pub fn rank(
    nominations: &[Nomination],
    validations: &[Validation],
    caller: Option<&EmployeeId>,
    policy: TieBreakPolicy,
) -> Standings {
    // Group by nominee, preserving first-appearance order
    let mut groups: Vec<(EmployeeId, Vec<Nomination>)> = Vec::new();
    for nomination in nominations {
        match groups
            .iter_mut()
            .find(|(nominee_id, _)| nominee_id == &nomination.nominee_id)
        {
            Some((_, group)) => group.push(nomination.clone()),
            None => groups.push((nomination.nominee_id.clone(), vec![nomination.clone()])),
        }
    }

    let caller_choice: Option<&EmployeeId> = caller.and_then(|validator_id| {
        validations
            .iter()
            .find(|validation| &validation.validator_id == validator_id)
            .map(|validation| &validation.nominee_id)
    });

    let mut entries: Vec<NomineeStanding> = groups
        .into_iter()
        .map(|(nominee_id, group)| {
            let validation_count: usize = validations
                .iter()
                .filter(|validation| validation.nominee_id == nominee_id)
                .count();
            let validated_by_caller: bool = caller_choice == Some(&nominee_id);
            NomineeStanding {
                nomination_count: group.len(),
                nominations: group,
                validation_count,
                validated_by_caller,
                rank: None,
                nominee_id,
            }
        })
        .collect();

    // Stable sort: equal counts keep insertion order unless the policy
    // imposes a total order
    match policy {
        TieBreakPolicy::InsertionOrder => {
            entries.sort_by(|a, b| b.nomination_count.cmp(&a.nomination_count));
        }
        TieBreakPolicy::ByNomineeId => {
            entries.sort_by(|a, b| {
                b.nomination_count
                    .cmp(&a.nomination_count)
                    .then_with(|| a.nominee_id.value().cmp(b.nominee_id.value()))
            });
        }
    }

    let cutoff: usize = FINALIST_SLOTS.min(entries.len());
    let others: Vec<NomineeStanding> = entries.split_off(cutoff);
    let mut finalists: Vec<NomineeStanding> = entries;
    for (index, finalist) in finalists.iter_mut().enumerate() {
        finalist.rank = Some(index + 1);
    }

    Standings { finalists, others }
}

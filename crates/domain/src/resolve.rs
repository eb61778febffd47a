// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Winner resolution from validation counts.
//!
//! Once the validation window closes, the finalist with the highest
//! validation count is the winner. Ties are surfaced, never silently
//! broken: the adopting system decides how a tie is escalated.

use crate::types::{EmployeeId, Validation};

/// The outcome of resolving a cycle's winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinnerResolution {
    /// A single finalist holds the highest validation count.
    Winner(EmployeeId),
    /// Two or more finalists share the highest validation count, listed in
    /// finalist rank order.
    Tie(Vec<EmployeeId>),
    /// No finalist received any validation.
    NoValidations,
}

/// Tallies validations into per-nominee counts, in first-appearance order.
#[must_use]
pub fn tally_validations(validations: &[Validation]) -> Vec<(EmployeeId, usize)> {
    let mut counts: Vec<(EmployeeId, usize)> = Vec::new();
    for validation in validations {
        match counts
            .iter_mut()
            .find(|(nominee_id, _)| nominee_id == &validation.nominee_id)
        {
            Some((_, count)) => *count += 1,
            None => counts.push((validation.nominee_id.clone(), 1)),
        }
    }
    counts
}

/// Resolves the winner of a cycle from its finalists and validation counts.
///
/// This function is pure and deterministic for a fixed input. Validation
/// counts for nominees outside the finalist list are ignored.
///
/// # Arguments
///
/// * `finalists` - The finalist nominee ids, in rank order
/// * `validation_counts` - Per-nominee validation counts
///
/// # Returns
///
/// * [`WinnerResolution::Winner`] when exactly one finalist holds the
///   highest count
/// * [`WinnerResolution::Tie`] when several finalists share it
/// * [`WinnerResolution::NoValidations`] when no finalist received any
#[must_use]
pub fn resolve_winner(
    finalists: &[EmployeeId],
    validation_counts: &[(EmployeeId, usize)],
) -> WinnerResolution {
    let count_for = |nominee_id: &EmployeeId| -> usize {
        validation_counts
            .iter()
            .find(|(candidate, _)| candidate == nominee_id)
            .map_or(0, |(_, count)| *count)
    };

    let highest: usize = finalists.iter().map(count_for).max().unwrap_or(0);
    if highest == 0 {
        return WinnerResolution::NoValidations;
    }

    let leaders: Vec<EmployeeId> = finalists
        .iter()
        .filter(|finalist| count_for(finalist) == highest)
        .cloned()
        .collect();

    match leaders.as_slice() {
        [single] => WinnerResolution::Winner(single.clone()),
        _ => WinnerResolution::Tie(leaders),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> EmployeeId {
        EmployeeId::new(value)
    }

    #[test]
    fn test_resolve_single_winner() {
        let finalists = vec![id("y"), id("z")];
        let counts = vec![(id("y"), 3), (id("z"), 1)];

        assert_eq!(
            resolve_winner(&finalists, &counts),
            WinnerResolution::Winner(id("y"))
        );
    }

    #[test]
    fn test_resolve_surfaces_tie() {
        let finalists = vec![id("y"), id("z")];
        let counts = vec![(id("y"), 3), (id("z"), 3)];

        assert_eq!(
            resolve_winner(&finalists, &counts),
            WinnerResolution::Tie(vec![id("y"), id("z")])
        );
    }

    #[test]
    fn test_resolve_no_validations() {
        let finalists = vec![id("y"), id("z")];

        assert_eq!(
            resolve_winner(&finalists, &[]),
            WinnerResolution::NoValidations
        );
    }

    #[test]
    fn test_resolve_ignores_non_finalist_counts() {
        // "x" holds the highest count but is not a finalist
        let finalists = vec![id("y"), id("z")];
        let counts = vec![(id("x"), 9), (id("y"), 2), (id("z"), 1)];

        assert_eq!(
            resolve_winner(&finalists, &counts),
            WinnerResolution::Winner(id("y"))
        );
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let finalists = vec![id("a"), id("b"), id("c")];
        let counts = vec![(id("a"), 2), (id("b"), 2), (id("c"), 1)];

        let first = resolve_winner(&finalists, &counts);
        let second = resolve_winner(&finalists, &counts);

        assert_eq!(first, second);
        assert_eq!(first, WinnerResolution::Tie(vec![id("a"), id("b")]));
    }

    #[test]
    fn test_tally_validations_counts_in_first_appearance_order() {
        use crate::types::{CycleId, Validation, ValidationId};
        use time::OffsetDateTime;

        let validation = |vid: &str, validator: &str, nominee: &str| Validation {
            validation_id: ValidationId::new(vid),
            cycle_id: CycleId::new("cycle-1"),
            validator_id: EmployeeId::new(validator),
            nominee_id: EmployeeId::new(nominee),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let validations = vec![
            validation("1", "p", "zoe"),
            validation("2", "q", "amy"),
            validation("3", "r", "zoe"),
        ];

        let counts = tally_validations(&validations);

        assert_eq!(counts, vec![(id("zoe"), 2), (id("amy"), 1)]);
    }
}

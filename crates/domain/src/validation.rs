// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use crate::types::CapabilityTag;

/// Maximum length of a nomination justification, in characters.
pub const MAX_JUSTIFICATION_LEN: usize = 512;

/// Maximum length of the optional remarks, in characters.
pub const MAX_REMARKS_LEN: usize = 1024;

/// Validates the caller-supplied fields of a nomination.
///
/// This function is pure, deterministic, and has no side effects. It does
/// NOT check uniqueness (that requires ledger context).
///
/// # Arguments
///
/// * `tags` - The selected capability tags
/// * `justification` - The free-text justification
/// * `remarks` - Optional additional remarks
///
/// # Errors
///
/// Returns an error if:
/// - No capability tag is selected
/// - Any tag is empty after trimming
/// - The justification is empty or exceeds [`MAX_JUSTIFICATION_LEN`]
/// - The remarks exceed [`MAX_REMARKS_LEN`]
pub fn validate_nomination_input(
    tags: &[CapabilityTag],
    justification: &str,
    remarks: Option<&str>,
) -> Result<(), DomainError> {
    // Rule: at least one capability tag must be selected
    if tags.is_empty() {
        return Err(DomainError::EmptyCapabilityTags);
    }

    // Rule: tags must carry a label
    if let Some(blank) = tags.iter().find(|tag| tag.value().is_empty()) {
        return Err(DomainError::InvalidCapabilityTag(format!(
            "Tag cannot be blank (got '{}')",
            blank.value()
        )));
    }

    // Rule: justification is required
    if justification.trim().is_empty() {
        return Err(DomainError::InvalidJustification(String::from(
            "Justification cannot be empty",
        )));
    }

    // Lengths are measured in characters, not bytes
    let justification_len: usize = justification.chars().count();
    if justification_len > MAX_JUSTIFICATION_LEN {
        return Err(DomainError::InvalidJustification(format!(
            "Justification is {justification_len} characters; maximum is {MAX_JUSTIFICATION_LEN}"
        )));
    }

    if let Some(remarks) = remarks {
        let remarks_len: usize = remarks.chars().count();
        if remarks_len > MAX_REMARKS_LEN {
            return Err(DomainError::InvalidRemarks(format!(
                "Remarks are {remarks_len} characters; maximum is {MAX_REMARKS_LEN}"
            )));
        }
    }

    Ok(())
}

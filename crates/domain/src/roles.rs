// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Roles and capability derivation.
//!
//! Role assignments are fetched from the identity collaborator as names
//! and parsed into a closed set of variants. Capabilities are derived by a
//! pure function over the parsed set.
//!
//! ## Invariants
//!
//! - Roles are additive, never hierarchical: `Admin` does not implicitly
//!   gain `Approver`'s validate capability. This separation of duties is
//!   deliberate and must be preserved.
//! - An unresolved caller has no capabilities (fail-closed).

use crate::error::DomainError;

/// A role assigned to an employee by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Administers the program: cycle scheduling, configuration.
    Admin,
    /// Member of the voting committee; confirms finalists.
    Approver,
    /// Regular program member; may nominate colleagues.
    Member,
}

impl Role {
    /// Parses a role from its wire name.
    ///
    /// The identity service historically issues the approver role under
    /// the name `ExCom`; both spellings are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the name does not match a known role.
    pub fn parse(name: &str) -> Result<Self, DomainError> {
        match name {
            "Admin" => Ok(Self::Admin),
            "Approver" | "ExCom" => Ok(Self::Approver),
            "Member" => Ok(Self::Member),
            _ => Err(DomainError::UnknownRole(name.to_owned())),
        }
    }

    /// Returns the canonical name of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Approver => "Approver",
            Self::Member => "Member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived boolean permissions for a caller.
///
/// Capabilities are advisory for UI gating and enforced again by the
/// engine on every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The caller may submit and withdraw nominations.
    pub can_nominate: bool,
    /// The caller may view the review page of the latest completed cycle.
    pub can_review: bool,
    /// The caller may confirm finalists during the validation window.
    pub can_validate: bool,
    /// The caller may schedule and clear nomination cycles.
    pub can_administer: bool,
}

impl Capabilities {
    /// Returns the fail-closed capability set: everything denied.
    ///
    /// Used whenever the caller cannot be resolved.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            can_nominate: false,
            can_review: false,
            can_validate: false,
            can_administer: false,
        }
    }

    /// Derives capabilities from a resolved caller's role set.
    ///
    /// Any authenticated, role-assigned profile may nominate. Review
    /// access is granted to administrators and approvers; validation only
    /// to approvers; administration only to administrators.
    #[must_use]
    pub fn from_roles(roles: &[Role]) -> Self {
        let is_admin: bool = roles.contains(&Role::Admin);
        let is_approver: bool = roles.contains(&Role::Approver);

        Self {
            can_nominate: true,
            can_review: is_admin || is_approver,
            can_validate: is_approver,
            can_administer: is_admin,
        }
    }
}

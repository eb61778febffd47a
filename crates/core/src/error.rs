// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::ports::StoreError;
use hero_cycle_domain::DomainError;

/// Errors surfaced by the workflow engine.
///
/// The taxonomy determines how callers react:
/// - `Validation` and `Unauthorized` are synchronous precondition
///   failures, never retried
/// - `Conflict` means the ledger already holds a conflicting row
/// - `Transient` means the backing store was unreachable; read operations
///   retry internally, mutations never do
/// - `Integrity` means a two-step replace left the ledger inconsistent
///   and compensation also failed; the caller must re-attempt manually
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Caller input failed a domain precondition.
    Validation(DomainError),
    /// The caller lacks the capability for this action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// The operation conflicts with a row already in the ledger.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// The backing store is temporarily unavailable.
    Transient {
        /// A human-readable description of the failure.
        message: String,
    },
    /// A replace sequence left the ledger inconsistent and compensation
    /// failed.
    Integrity {
        /// A human-readable description of the inconsistency.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "Validation failed: {err}"),
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::Transient { message } => {
                write!(f, "Backing store unavailable: {message}")
            }
            Self::Integrity { message } => write!(f, "Ledger integrity error: {message}"),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err)
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { constraint } => Self::Conflict {
                message: format!("unique constraint violated: {constraint}"),
            },
            StoreError::Unavailable(message) => Self::Transient { message },
            StoreError::NotFound(message) => Self::Internal {
                message: format!("record not found: {message}"),
            },
            StoreError::Backend(message) => Self::Internal { message },
        }
    }
}

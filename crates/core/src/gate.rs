// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Identity and roles gate.
//!
//! Resolves the current caller through the identity port and derives
//! their capabilities. Resolution fails closed: any identity failure, an
//! unauthenticated caller, or an unreadable role set all yield a context
//! with every capability denied.

use crate::ports::{Caller, IdentityService};
use crate::retry::with_read_retry;
use hero_cycle_audit::Actor;
use hero_cycle_domain::{Capabilities, Role};
use tracing::{debug, warn};

/// The resolved caller and their derived capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// The authenticated caller, or `None` when resolution failed.
    pub caller: Option<Caller>,
    /// The caller's parsed role assignments.
    pub roles: Vec<Role>,
    /// The capabilities derived from the role set.
    pub capabilities: Capabilities,
}

impl CallerContext {
    /// Returns the fail-closed context: no caller, no capabilities.
    #[must_use]
    pub const fn fail_closed() -> Self {
        Self {
            caller: None,
            roles: Vec::new(),
            capabilities: Capabilities::none(),
        }
    }

    /// Builds a context for an authenticated caller with parsed roles.
    #[must_use]
    pub fn authenticated(caller: Caller, roles: Vec<Role>) -> Self {
        let capabilities: Capabilities = Capabilities::from_roles(&roles);
        Self {
            caller: Some(caller),
            roles,
            capabilities,
        }
    }

    /// Converts this context into an audit Actor.
    ///
    /// The actor type reflects the strongest capability held.
    #[must_use]
    pub fn actor(&self) -> Actor {
        let id: String = self
            .caller
            .as_ref()
            .map_or_else(|| String::from("anonymous"), |caller| caller.id.to_string());
        let actor_type: &str = if self.capabilities.can_administer {
            "admin"
        } else if self.capabilities.can_validate {
            "approver"
        } else {
            "member"
        };
        Actor::new(id, String::from(actor_type))
    }
}

/// Resolves the current caller and derives their capabilities.
///
/// Role names that do not parse into a known role are skipped with a
/// warning; they neither grant nor deny anything.
pub async fn resolve_caller<I: IdentityService>(identity: &I) -> CallerContext {
    let caller: Caller = match with_read_retry("current_caller", || identity.current_caller()).await
    {
        Ok(Some(caller)) => caller,
        Ok(None) => {
            debug!("no authenticated caller; capabilities fail closed");
            return CallerContext::fail_closed();
        }
        Err(err) => {
            warn!("identity service failed to resolve caller: {err}; capabilities fail closed");
            return CallerContext::fail_closed();
        }
    };

    let role_names: Vec<String> =
        match with_read_retry("role_assignments", || identity.role_assignments(&caller.id)).await {
            Ok(names) => names,
            Err(err) => {
                warn!(
                    "identity service failed to resolve roles for {}: {err}; capabilities fail \
                     closed",
                    caller.id
                );
                return CallerContext::fail_closed();
            }
        };

    let mut roles: Vec<Role> = Vec::new();
    for name in &role_names {
        match Role::parse(name) {
            Ok(role) => {
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
            Err(err) => warn!("skipping unrecognized role assignment: {err}"),
        }
    }

    debug!("resolved caller {} with roles {roles:?}", caller.id);
    CallerContext::authenticated(caller, roles)
}

//! Decision combinator — the fixed precedence chain.

use tracing::debug;
use uuid::Uuid;

use workgrid_core::access::{GlobalRole, PermissionTier, ResourceRef, Visibility};
use workgrid_core::error::{WorkgridError, WorkgridResult};
use workgrid_core::repository::{AuthContextLookup, GrantLookup, MembershipLookup, PrincipalLookup};

use crate::shim;

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Why a request was denied.
///
/// Callers must not surface the distinction to a client unless the
/// principal is already known to hold at least `View` on the resource;
/// both variants render as the same generic "not authorized" at the
/// boundary otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The resource or the principal does not exist.
    NotFound,
    /// Every clause of the chain came up short.
    InsufficientPermission,
}

/// The authorization resolution engine.
///
/// Generic over the four lookup interfaces so the decision procedure has
/// no dependency on the database crate and schema absence can be
/// simulated deterministically in tests.
///
/// The engine is pure and stateless: every call re-evaluates all inputs,
/// so a grant change or team-role change takes effect on the very next
/// request.
pub struct AuthzEngine<P, R, M, G> {
    principals: P,
    resources: R,
    memberships: M,
    grants: G,
}

impl<P, R, M, G> AuthzEngine<P, R, M, G>
where
    P: PrincipalLookup,
    R: AuthContextLookup,
    M: MembershipLookup,
    G: GrantLookup,
{
    pub fn new(principals: P, resources: R, memberships: M, grants: G) -> Self {
        Self {
            principals,
            resources,
            memberships,
            grants,
        }
    }

    /// May `principal_id` perform `requested` tier on `resource`?
    ///
    /// Clauses are evaluated in a fixed order (global admin, ownership,
    /// team role, explicit grant, visibility) identical across all five
    /// resource variants; the first satisfied clause wins. The effective
    /// tier is the maximum implied by any signal, so signals union and
    /// never intersect.
    ///
    /// Resolver failures other than schema absence propagate as `Err`;
    /// an error is never treated as an affirmative signal.
    pub async fn authorize(
        &self,
        principal_id: Uuid,
        resource: ResourceRef,
        requested: PermissionTier,
    ) -> WorkgridResult<Decision> {
        // 1. Principal. The identity table is assumed always present, so
        //    this lookup is not degraded; any failure here is fatal.
        let principal = match self.principals.principal(principal_id).await {
            Ok(p) => p,
            Err(e) if e.is_not_found() => return Ok(Decision::Deny(DenyReason::NotFound)),
            Err(e) => return Err(e),
        };

        if !principal.active {
            return Ok(Decision::Deny(DenyReason::InsufficientPermission));
        }

        // 2. Global admin, checked before any resource access: admin holds
        //    Admin tier on every resource, including ones the degraded
        //    loader cannot see.
        if principal.global_role == GlobalRole::Admin {
            return Ok(Decision::Allow);
        }

        // 3. Resource linkage record.
        let ctx = match shim::auth_context_or_absent(
            self.resources.auth_context(resource).await,
            resource,
        )? {
            Some(ctx) => ctx,
            None => return Ok(Decision::Deny(DenyReason::NotFound)),
        };

        // 4. Ownership implies Admin tier.
        if ctx.owner_id == principal_id {
            return Ok(Decision::Allow);
        }

        // 5. Team role.
        if let Some(team_id) = ctx.team_id {
            let role = shim::membership_or_none(
                self.memberships.membership_role(team_id, principal_id).await,
            )?;
            if let Some(role) = role {
                if role.implied_tier().satisfies(requested) {
                    return Ok(Decision::Allow);
                }
            }
        }

        // 6. Explicit grant.
        let granted =
            shim::grant_or_none(self.grants.granted_tier(resource, principal_id).await)?;
        if let Some(tier) = granted {
            if tier.satisfies(requested) {
                return Ok(Decision::Allow);
            }
        }

        // 7. Public visibility satisfies View, never Edit or Admin.
        if requested == PermissionTier::View && ctx.read_visibility() == Visibility::Public {
            return Ok(Decision::Allow);
        }

        debug!(
            principal = %principal_id,
            kind = resource.kind.as_str(),
            resource = %resource.id,
            requested = ?requested,
            "authorization denied"
        );
        Ok(Decision::Deny(DenyReason::InsufficientPermission))
    }

    /// Like [`authorize`](Self::authorize), but adapts a denial into the
    /// matching error for write-path call sites.
    pub async fn require(
        &self,
        principal_id: Uuid,
        resource: ResourceRef,
        requested: PermissionTier,
    ) -> WorkgridResult<()> {
        match self.authorize(principal_id, resource, requested).await? {
            Decision::Allow => Ok(()),
            Decision::Deny(DenyReason::NotFound) => Err(WorkgridError::NotFound {
                entity: resource.kind.as_str().into(),
                id: resource.id.to_string(),
            }),
            Decision::Deny(DenyReason::InsufficientPermission) => {
                Err(WorkgridError::PermissionDenied {
                    reason: format!(
                        "{requested:?} tier required on {} {}",
                        resource.kind.as_str(),
                        resource.id,
                    ),
                })
            }
        }
    }
}

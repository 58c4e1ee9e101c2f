//! Explicit grant management, guarded by the engine.

use uuid::Uuid;

use workgrid_core::access::{PermissionTier, ResourceRef};
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::grant::{PermissionGrant, UpsertGrant};
use workgrid_core::repository::{
    AuthContextLookup, GrantLookup, GrantRepository, MembershipLookup, PrincipalLookup,
};

use crate::engine::AuthzEngine;

/// Grant write path. Every mutation requires the caller to hold `Admin`
/// tier on the target resource; `granted_by` records the caller.
pub struct GrantService<P, R, M, G, S> {
    engine: AuthzEngine<P, R, M, G>,
    grants: S,
}

impl<P, R, M, G, S> GrantService<P, R, M, G, S>
where
    P: PrincipalLookup,
    R: AuthContextLookup,
    M: MembershipLookup,
    G: GrantLookup,
    S: GrantRepository,
{
    pub fn new(engine: AuthzEngine<P, R, M, G>, grants: S) -> Self {
        Self { engine, grants }
    }

    pub async fn upsert(
        &self,
        caller_id: Uuid,
        input: UpsertGrant,
    ) -> WorkgridResult<PermissionGrant> {
        let resource = ResourceRef::new(input.resource_kind, input.resource_id);
        self.engine
            .require(caller_id, resource, PermissionTier::Admin)
            .await?;
        self.grants.upsert(input, caller_id).await
    }

    pub async fn revoke(
        &self,
        caller_id: Uuid,
        resource: ResourceRef,
        user_id: Uuid,
    ) -> WorkgridResult<()> {
        self.engine
            .require(caller_id, resource, PermissionTier::Admin)
            .await?;
        self.grants.revoke(resource, user_id).await
    }

    /// Listing grants reveals who has access, so it carries the same
    /// `Admin` requirement as mutating them.
    pub async fn list_for_resource(
        &self,
        caller_id: Uuid,
        resource: ResourceRef,
    ) -> WorkgridResult<Vec<PermissionGrant>> {
        self.engine
            .require(caller_id, resource, PermissionTier::Admin)
            .await?;
        self.grants.list_for_resource(resource).await
    }
}

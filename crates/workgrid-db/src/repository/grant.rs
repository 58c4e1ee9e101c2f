//! SurrealDB implementation of [`GrantRepository`] and the grant lookup
//! the authorization engine consumes.
//!
//! Grant record ids are the composite `{kind}_{resource}_{user}` key, so
//! the (kind, resource, user) uniqueness falls out of the record id and
//! UPSERT gives insert-or-replace for free.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::access::{PermissionTier, ResourceKind, ResourceRef};
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::grant::{PermissionGrant, UpsertGrant};
use workgrid_core::repository::{GrantLookup, GrantRepository};

use crate::error::DbError;
use crate::repository::{parse_tier, parse_uuid, tier_str};

fn grant_key(kind: ResourceKind, resource_id: Uuid, user_id: Uuid) -> String {
    format!("{}_{}_{}", kind.as_str(), resource_id, user_id)
}

fn parse_kind(s: &str) -> Result<ResourceKind, DbError> {
    match s {
        "Project" => Ok(ResourceKind::Project),
        "ProjectModule" => Ok(ResourceKind::ProjectModule),
        "StandaloneModule" => Ok(ResourceKind::StandaloneModule),
        "Task" => Ok(ResourceKind::Task),
        "Comment" => Ok(ResourceKind::Comment),
        other => Err(DbError::Decode(format!("unknown resource kind: {other}"))),
    }
}

#[derive(Debug, Deserialize)]
struct GrantRow {
    resource_kind: String,
    resource_id: String,
    user_id: String,
    tier: String,
    granted_by: String,
    granted_at: DateTime<Utc>,
}

impl GrantRow {
    fn try_into_grant(self) -> Result<PermissionGrant, DbError> {
        Ok(PermissionGrant {
            resource_kind: parse_kind(&self.resource_kind)?,
            resource_id: parse_uuid(&self.resource_id, "resource")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            tier: parse_tier(&self.tier)?,
            granted_by: parse_uuid(&self.granted_by, "granter")?,
            granted_at: self.granted_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TierRow {
    tier: String,
}

/// SurrealDB implementation of the Grant repository.
#[derive(Clone)]
pub struct SurrealGrantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGrantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GrantRepository for SurrealGrantRepository<C> {
    async fn upsert(
        &self,
        input: UpsertGrant,
        granted_by: Uuid,
    ) -> WorkgridResult<PermissionGrant> {
        let key = grant_key(input.resource_kind, input.resource_id, input.user_id);

        let result = self
            .db
            .query(
                "UPSERT type::thing('permission_grant', $key) SET \
                 resource_kind = $resource_kind, \
                 resource_id = $resource_id, \
                 user_id = $user_id, tier = $tier, \
                 granted_by = $granted_by, granted_at = time::now()",
            )
            .bind(("key", key.clone()))
            .bind(("resource_kind", input.resource_kind.as_str()))
            .bind(("resource_id", input.resource_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("tier", tier_str(input.tier)))
            .bind(("granted_by", granted_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "permission_grant".into(),
            id: key,
        })?;

        Ok(row.try_into_grant()?)
    }

    async fn revoke(&self, resource: ResourceRef, user_id: Uuid) -> WorkgridResult<()> {
        let key = grant_key(resource.kind, resource.id, user_id);

        self.db
            .query("DELETE type::thing('permission_grant', $key)")
            .bind(("key", key))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_for_resource(
        &self,
        resource: ResourceRef,
    ) -> WorkgridResult<Vec<PermissionGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM permission_grant WHERE \
                 resource_kind = $resource_kind AND \
                 resource_id = $resource_id \
                 ORDER BY granted_at ASC",
            )
            .bind(("resource_kind", resource.kind.as_str()))
            .bind(("resource_id", resource.id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GrantRow> = result.take(0).map_err(DbError::from)?;

        let grants = rows
            .into_iter()
            .map(|row| row.try_into_grant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(grants)
    }
}

impl<C: Connection> GrantLookup for SurrealGrantRepository<C> {
    async fn granted_tier(
        &self,
        resource: ResourceRef,
        user_id: Uuid,
    ) -> WorkgridResult<Option<PermissionTier>> {
        let key = grant_key(resource.kind, resource.id, user_id);

        let mut result = self
            .db
            .query("SELECT tier FROM type::thing('permission_grant', $key)")
            .bind(("key", key))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TierRow> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .next()
            .map(|row| Ok(parse_tier(&row.tier)?))
            .transpose()
    }
}

//! Explicit permission grant domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{PermissionTier, ResourceKind};

/// A per-resource, per-user permission override independent of ownership
/// and team membership. Unique per (kind, resource, user); never
/// auto-expires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub tier: PermissionTier,
    pub granted_by: Uuid,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertGrant {
    pub resource_kind: ResourceKind,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub tier: PermissionTier,
}

//! Access-control primitives.
//!
//! Everything the authorization engine reasons about lives here: the
//! permission tier ordering, global and team roles, resource visibility,
//! and the uniform projections (`Principal`, `AuthContext`) the decision
//! procedure operates on.

use std::cmp;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Permission level on a single resource, totally ordered.
///
/// A tier request is satisfied when the effective tier is greater than or
/// equal to the requested tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionTier {
    View,
    Edit,
    Admin,
}

impl PermissionTier {
    /// Hierarchical level of this tier (higher number = more permissions).
    #[inline]
    pub fn level(self) -> u8 {
        match self {
            PermissionTier::View => 1,
            PermissionTier::Edit => 2,
            PermissionTier::Admin => 3,
        }
    }

    /// Whether this tier satisfies a request for `requested`.
    #[inline]
    pub fn satisfies(self, requested: PermissionTier) -> bool {
        self.level() >= requested.level()
    }
}

impl PartialOrd for PermissionTier {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PermissionTier {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.level().cmp(&other.level())
    }
}

/// Account-wide role of a user.
///
/// `Admin` implies `Admin` tier on every resource; `User` and `Viewer`
/// carry no standing access of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlobalRole {
    Admin,
    User,
    Viewer,
}

/// Membership role within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamRole {
    Leader,
    Member,
    Viewer,
}

impl TeamRole {
    /// Tier this membership role implies on resources linked to the team.
    #[inline]
    pub fn implied_tier(self) -> PermissionTier {
        match self {
            TeamRole::Leader => PermissionTier::Admin,
            TeamRole::Member => PermissionTier::Edit,
            TeamRole::Viewer => PermissionTier::View,
        }
    }
}

/// Resource visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Private,
    Team,
    Public,
}

/// The five authorizable resource variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Project,
    ProjectModule,
    StandaloneModule,
    Task,
    Comment,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Project => "Project",
            ResourceKind::ProjectModule => "ProjectModule",
            ResourceKind::StandaloneModule => "StandaloneModule",
            ResourceKind::Task => "Task",
            ResourceKind::Comment => "Comment",
        }
    }
}

/// A (kind, id) reference to an authorizable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: Uuid,
}

impl ResourceRef {
    pub fn new(kind: ResourceKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

/// Authorization projection of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub global_role: GlobalRole,
    pub active: bool,
}

/// Uniform authorization projection of any resource variant.
///
/// Composite variants (project module, task, comment) inherit `team_id`
/// and `visibility` from their parent chain when their own fields are
/// null; the loader performs that join before this struct is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
    pub visibility: Option<Visibility>,
}

impl AuthContext {
    /// Visibility as seen by a `View` request.
    ///
    /// An absent value defaults to maximally permissive for read, never
    /// for write.
    #[inline]
    pub fn read_visibility(&self) -> Visibility {
        self.visibility.unwrap_or(Visibility::Public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering_is_total() {
        assert!(PermissionTier::View < PermissionTier::Edit);
        assert!(PermissionTier::Edit < PermissionTier::Admin);
        assert!(PermissionTier::Admin.satisfies(PermissionTier::View));
        assert!(PermissionTier::Edit.satisfies(PermissionTier::Edit));
        assert!(!PermissionTier::View.satisfies(PermissionTier::Edit));
    }

    #[test]
    fn team_role_tier_mapping() {
        assert_eq!(TeamRole::Leader.implied_tier(), PermissionTier::Admin);
        assert_eq!(TeamRole::Member.implied_tier(), PermissionTier::Edit);
        assert_eq!(TeamRole::Viewer.implied_tier(), PermissionTier::View);
    }

    #[test]
    fn null_visibility_reads_public() {
        let ctx = AuthContext {
            owner_id: Uuid::new_v4(),
            team_id: None,
            visibility: None,
        };
        assert_eq!(ctx.read_visibility(), Visibility::Public);

        let private = AuthContext {
            visibility: Some(Visibility::Private),
            ..ctx
        };
        assert_eq!(private.read_visibility(), Visibility::Private);
    }
}

//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Persistence access is always an
//! injected collaborator; nothing in the workspace reaches for ambient
//! connection state, so store failures (including schema absence) can be
//! simulated deterministically in tests.

use uuid::Uuid;

use crate::access::{AuthContext, PermissionTier, Principal, ResourceRef, TeamRole};
use crate::error::WorkgridResult;
use crate::models::{
    comment::{Comment, CreateComment, UpdateComment},
    dashboard::DashboardSummary,
    grant::{PermissionGrant, UpsertGrant},
    module::{CreateModule, Module, UpdateModule},
    project::{CreateProject, Project, UpdateProject},
    task::{CreateTask, Task, UpdateTask},
    team::{CreateTeam, Team, TeamMembership, UpdateTeam},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Authorization lookups
//
// The narrow read interfaces the decision engine consumes. Store
// implementations also implement the matching CRUD trait below; engine
// tests implement only these.
// ---------------------------------------------------------------------------

pub trait PrincipalLookup: Send + Sync {
    /// Authorization projection of a user account.
    fn principal(&self, user_id: Uuid) -> impl Future<Output = WorkgridResult<Principal>> + Send;
}

pub trait AuthContextLookup: Send + Sync {
    /// Minimal ownership/linkage record for a decision. Composite variants
    /// join through their parent chain to fill null team/visibility.
    fn auth_context(
        &self,
        resource: ResourceRef,
    ) -> impl Future<Output = WorkgridResult<AuthContext>> + Send;
}

pub trait MembershipLookup: Send + Sync {
    /// Membership role, or `None` if the user is not a member.
    fn membership_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<Option<TeamRole>>> + Send;
}

pub trait GrantLookup: Send + Sync {
    /// Explicitly granted tier, or `None` if no grant exists.
    fn granted_tier(
        &self,
        resource: ResourceRef,
        user_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<Option<PermissionTier>>> + Send;
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = WorkgridResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WorkgridResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = WorkgridResult<User>> + Send;
    /// Soft-delete: sets status to Inactive.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = WorkgridResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WorkgridResult<PaginatedResult<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Teams & memberships
// ---------------------------------------------------------------------------

pub trait TeamRepository: Send + Sync {
    /// Create a team and its leader's `Leader` membership in one
    /// transaction.
    fn create(&self, input: CreateTeam) -> impl Future<Output = WorkgridResult<Team>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WorkgridResult<Team>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTeam,
    ) -> impl Future<Output = WorkgridResult<Team>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WorkgridResult<()>> + Send;

    /// Add or update a membership row (unique per team and user).
    fn upsert_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> impl Future<Output = WorkgridResult<()>> + Send;

    fn remove_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<()>> + Send;

    fn list_members(
        &self,
        team_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<Vec<TeamMembership>>> + Send;

    /// Repoint `leader_id` and rewrite both affected membership rows in a
    /// single transaction, so the pointer and the roles never diverge.
    fn change_leader(
        &self,
        team_id: Uuid,
        new_leader_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<Team>> + Send;
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

pub trait ProjectRepository: Send + Sync {
    fn create(
        &self,
        input: CreateProject,
    ) -> impl Future<Output = WorkgridResult<Project>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WorkgridResult<Project>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateProject,
    ) -> impl Future<Output = WorkgridResult<Project>> + Send;
    /// Cascading delete: removes the project's comments, tasks, modules,
    /// and grants together with the project as one atomic unit.
    fn delete(&self, id: Uuid) -> impl Future<Output = WorkgridResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = WorkgridResult<PaginatedResult<Project>>> + Send;
}

pub trait ModuleRepository: Send + Sync {
    fn create(&self, input: CreateModule) -> impl Future<Output = WorkgridResult<Module>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WorkgridResult<Module>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateModule,
    ) -> impl Future<Output = WorkgridResult<Module>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WorkgridResult<()>> + Send;
    fn list_by_project(
        &self,
        project_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<Vec<Module>>> + Send;
}

pub trait TaskRepository: Send + Sync {
    fn create(&self, input: CreateTask) -> impl Future<Output = WorkgridResult<Task>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WorkgridResult<Task>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTask,
    ) -> impl Future<Output = WorkgridResult<Task>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WorkgridResult<()>> + Send;
    fn list_by_project(
        &self,
        project_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = WorkgridResult<PaginatedResult<Task>>> + Send;
}

pub trait CommentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateComment,
    ) -> impl Future<Output = WorkgridResult<Comment>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = WorkgridResult<Comment>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateComment,
    ) -> impl Future<Output = WorkgridResult<Comment>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = WorkgridResult<()>> + Send;
    fn list_by_task(
        &self,
        task_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<Vec<Comment>>> + Send;
}

// ---------------------------------------------------------------------------
// Grants
// ---------------------------------------------------------------------------

pub trait GrantRepository: Send + Sync {
    /// Insert or replace the grant for (kind, resource, user).
    fn upsert(
        &self,
        input: UpsertGrant,
        granted_by: Uuid,
    ) -> impl Future<Output = WorkgridResult<PermissionGrant>> + Send;
    fn revoke(
        &self,
        resource: ResourceRef,
        user_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<()>> + Send;
    fn list_for_resource(
        &self,
        resource: ResourceRef,
    ) -> impl Future<Output = WorkgridResult<Vec<PermissionGrant>>> + Send;
}

// ---------------------------------------------------------------------------
// Dashboard (read-only aggregates)
// ---------------------------------------------------------------------------

pub trait DashboardRepository: Send + Sync {
    /// Per-user aggregate counts.
    fn summary(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = WorkgridResult<DashboardSummary>> + Send;
}

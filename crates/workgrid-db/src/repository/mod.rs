//! SurrealDB repository implementations.

mod auth_context;
mod comment;
mod dashboard;
mod grant;
mod module;
mod project;
mod task;
mod team;
mod user;

pub use auth_context::SurrealResourceDirectory;
pub use comment::SurrealCommentRepository;
pub use dashboard::SurrealDashboardRepository;
pub use grant::SurrealGrantRepository;
pub use module::SurrealModuleRepository;
pub use project::SurrealProjectRepository;
pub use task::SurrealTaskRepository;
pub use team::SurrealTeamRepository;
pub use user::SurrealUserRepository;

use uuid::Uuid;
use workgrid_core::access::{GlobalRole, PermissionTier, TeamRole, Visibility};
use workgrid_core::models::project::ProjectStatus;
use workgrid_core::models::task::TaskStatus;
use workgrid_core::models::user::UserStatus;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Enum <-> string conversions shared by the repositories.
//
// Enums are stored as the same strings the schema ASSERTs on.
// -----------------------------------------------------------------------

pub(crate) fn parse_uuid(s: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn global_role_str(r: GlobalRole) -> &'static str {
    match r {
        GlobalRole::Admin => "Admin",
        GlobalRole::User => "User",
        GlobalRole::Viewer => "Viewer",
    }
}

pub(crate) fn parse_global_role(s: &str) -> Result<GlobalRole, DbError> {
    match s {
        "Admin" => Ok(GlobalRole::Admin),
        "User" => Ok(GlobalRole::User),
        "Viewer" => Ok(GlobalRole::Viewer),
        other => Err(DbError::Decode(format!("unknown global role: {other}"))),
    }
}

pub(crate) fn user_status_str(s: UserStatus) -> &'static str {
    match s {
        UserStatus::Active => "Active",
        UserStatus::Inactive => "Inactive",
    }
}

pub(crate) fn parse_user_status(s: &str) -> Result<UserStatus, DbError> {
    match s {
        "Active" => Ok(UserStatus::Active),
        "Inactive" => Ok(UserStatus::Inactive),
        other => Err(DbError::Decode(format!("unknown user status: {other}"))),
    }
}

pub(crate) fn team_role_str(r: TeamRole) -> &'static str {
    match r {
        TeamRole::Leader => "Leader",
        TeamRole::Member => "Member",
        TeamRole::Viewer => "Viewer",
    }
}

pub(crate) fn parse_team_role(s: &str) -> Result<TeamRole, DbError> {
    match s {
        "Leader" => Ok(TeamRole::Leader),
        "Member" => Ok(TeamRole::Member),
        "Viewer" => Ok(TeamRole::Viewer),
        other => Err(DbError::Decode(format!("unknown team role: {other}"))),
    }
}

pub(crate) fn visibility_str(v: Visibility) -> &'static str {
    match v {
        Visibility::Private => "Private",
        Visibility::Team => "Team",
        Visibility::Public => "Public",
    }
}

pub(crate) fn parse_visibility(s: &str) -> Result<Visibility, DbError> {
    match s {
        "Private" => Ok(Visibility::Private),
        "Team" => Ok(Visibility::Team),
        "Public" => Ok(Visibility::Public),
        other => Err(DbError::Decode(format!("unknown visibility: {other}"))),
    }
}

pub(crate) fn tier_str(t: PermissionTier) -> &'static str {
    match t {
        PermissionTier::View => "View",
        PermissionTier::Edit => "Edit",
        PermissionTier::Admin => "Admin",
    }
}

pub(crate) fn parse_tier(s: &str) -> Result<PermissionTier, DbError> {
    match s {
        "View" => Ok(PermissionTier::View),
        "Edit" => Ok(PermissionTier::Edit),
        "Admin" => Ok(PermissionTier::Admin),
        other => Err(DbError::Decode(format!("unknown permission tier: {other}"))),
    }
}

pub(crate) fn project_status_str(s: ProjectStatus) -> &'static str {
    match s {
        ProjectStatus::Active => "Active",
        ProjectStatus::Archived => "Archived",
    }
}

pub(crate) fn parse_project_status(s: &str) -> Result<ProjectStatus, DbError> {
    match s {
        "Active" => Ok(ProjectStatus::Active),
        "Archived" => Ok(ProjectStatus::Archived),
        other => Err(DbError::Decode(format!("unknown project status: {other}"))),
    }
}

pub(crate) fn task_status_str(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Open => "Open",
        TaskStatus::InProgress => "InProgress",
        TaskStatus::Done => "Done",
    }
}

pub(crate) fn parse_task_status(s: &str) -> Result<TaskStatus, DbError> {
    match s {
        "Open" => Ok(TaskStatus::Open),
        "InProgress" => Ok(TaskStatus::InProgress),
        "Done" => Ok(TaskStatus::Done),
        other => Err(DbError::Decode(format!("unknown task status: {other}"))),
    }
}

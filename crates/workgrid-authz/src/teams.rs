//! Team management — membership and leadership orchestration.

use uuid::Uuid;

use workgrid_core::access::{GlobalRole, Principal, TeamRole};
use workgrid_core::error::{WorkgridError, WorkgridResult};
use workgrid_core::models::team::{CreateTeam, Team};
use workgrid_core::repository::{MembershipLookup, PrincipalLookup, TeamRepository};

/// Ordinary membership management: global admin or a leader-role member.
fn may_manage_members(principal: &Principal, caller_role: Option<TeamRole>) -> bool {
    principal.global_role == GlobalRole::Admin || caller_role == Some(TeamRole::Leader)
}

/// Leadership changes are stricter: only a global admin or the team's
/// designated leader. A `Leader` membership row alone is not enough, so
/// drifted data cannot eject the true leader.
fn may_alter_leadership(principal: &Principal, team: &Team) -> bool {
    principal.global_role == GlobalRole::Admin || principal.id == team.leader_id
}

/// Team membership and leadership service.
///
/// Generic over the repositories so it carries no database dependency.
pub struct TeamService<P, T> {
    principals: P,
    teams: T,
}

impl<P, T> TeamService<P, T>
where
    P: PrincipalLookup,
    T: TeamRepository + MembershipLookup,
{
    pub fn new(principals: P, teams: T) -> Self {
        Self { principals, teams }
    }

    /// Create a team. The creator becomes the designated leader and
    /// receives a `Leader` membership in the same transaction.
    pub async fn create_team(
        &self,
        creator_id: Uuid,
        name: String,
        description: String,
    ) -> WorkgridResult<Team> {
        let creator = self.principals.principal(creator_id).await?;
        if !creator.active {
            return Err(WorkgridError::PermissionDenied {
                reason: "inactive account".into(),
            });
        }

        self.teams
            .create(CreateTeam {
                name,
                description,
                leader_id: creator_id,
            })
            .await
    }

    /// Add a member or change an ordinary member's role.
    ///
    /// The `Leader` role is managed exclusively through
    /// [`change_leader`](Self::change_leader), which keeps the membership
    /// row and the team's `leader_id` pointer in lockstep.
    pub async fn upsert_member(
        &self,
        caller_id: Uuid,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> WorkgridResult<()> {
        if role == TeamRole::Leader {
            return Err(WorkgridError::Validation {
                message: "leadership is assigned via change_leader".into(),
            });
        }

        let caller = self.principals.principal(caller_id).await?;
        let caller_role = self.teams.membership_role(team_id, caller_id).await?;
        if !may_manage_members(&caller, caller_role) {
            return Err(WorkgridError::PermissionDenied {
                reason: "team membership management requires leader authority".into(),
            });
        }

        let team = self.teams.get_by_id(team_id).await?;
        if user_id == team.leader_id {
            // Demoting the designated leader would orphan the leader_id
            // pointer; leadership must be transferred first.
            return Err(WorkgridError::Validation {
                message: "transfer leadership before changing the leader's role".into(),
            });
        }

        self.teams.upsert_member(team_id, user_id, role).await
    }

    /// Remove a member. Members may always remove themselves; removing
    /// anyone else requires leader authority. The designated leader
    /// cannot be removed until leadership is transferred.
    pub async fn remove_member(
        &self,
        caller_id: Uuid,
        team_id: Uuid,
        user_id: Uuid,
    ) -> WorkgridResult<()> {
        let team = self.teams.get_by_id(team_id).await?;
        if user_id == team.leader_id {
            return Err(WorkgridError::Validation {
                message: "transfer leadership before removing the leader".into(),
            });
        }

        if caller_id != user_id {
            let caller = self.principals.principal(caller_id).await?;
            let caller_role = self.teams.membership_role(team_id, caller_id).await?;
            if !may_manage_members(&caller, caller_role) {
                return Err(WorkgridError::PermissionDenied {
                    reason: "team membership management requires leader authority".into(),
                });
            }
        }

        self.teams.remove_member(team_id, user_id).await
    }

    /// Transfer leadership. Only a global admin or the designated leader
    /// may do this; the repository rewrites `leader_id` and both
    /// membership rows in one transaction.
    pub async fn change_leader(
        &self,
        caller_id: Uuid,
        team_id: Uuid,
        new_leader_id: Uuid,
    ) -> WorkgridResult<Team> {
        let caller = self.principals.principal(caller_id).await?;
        let team = self.teams.get_by_id(team_id).await?;
        if !may_alter_leadership(&caller, &team) {
            return Err(WorkgridError::PermissionDenied {
                reason: "leadership changes require global admin or the designated leader".into(),
            });
        }

        let new_leader = self.principals.principal(new_leader_id).await?;
        if !new_leader.active {
            return Err(WorkgridError::Validation {
                message: "new leader account is inactive".into(),
            });
        }

        self.teams.change_leader(team_id, new_leader_id).await
    }
}

//! SurrealDB implementation of [`TeamRepository`] and the membership
//! lookup the authorization engine consumes.
//!
//! Memberships are `member_of` graph edges (user -> team) carrying the
//! role. Leadership writes touch the `leader_id` pointer and the edge
//! rows inside one transaction so the two representations cannot
//! diverge.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::access::TeamRole;
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::team::{CreateTeam, Team, TeamMembership, UpdateTeam};
use workgrid_core::repository::{MembershipLookup, TeamRepository};

use crate::error::DbError;
use crate::repository::{parse_team_role, parse_uuid, team_role_str};

#[derive(Debug, Deserialize)]
struct TeamRow {
    name: String,
    description: String,
    leader_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TeamRow {
    fn into_team(self, id: Uuid) -> Result<Team, DbError> {
        Ok(Team {
            id,
            name: self.name,
            description: self.description,
            leader_id: parse_uuid(&self.leader_id, "leader")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MembershipRow {
    user_id: String,
    role: String,
    added_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: String,
}

/// SurrealDB implementation of the Team repository.
#[derive(Clone)]
pub struct SurrealTeamRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTeamRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TeamRepository for SurrealTeamRepository<C> {
    async fn create(&self, input: CreateTeam) -> WorkgridResult<Team> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let leader_id_str = input.leader_id.to_string();

        // Team record and the creator's Leader membership land together
        // or not at all.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::thing('team', $id) SET \
                 name = $name, description = $description, \
                 leader_id = $leader_id; \
                 RELATE (type::thing('user', $leader_id)) \
                 -> member_of -> (type::thing('team', $id)) \
                 SET role = 'Leader'; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("leader_id", leader_id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> WorkgridResult<Team> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('team', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TeamRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "team".into(),
            id: id_str,
        })?;

        Ok(row.into_team(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateTeam) -> WorkgridResult<Team> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::thing('team', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<TeamRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "team".into(),
            id: id_str,
        })?;

        Ok(row.into_team(id)?)
    }

    async fn delete(&self, id: Uuid) -> WorkgridResult<()> {
        // Membership edges go first, then the team record.
        self.db
            .query(
                "DELETE member_of WHERE out = type::thing('team', $id); \
                 DELETE type::thing('team', $id);",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn upsert_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> WorkgridResult<()> {
        // Replace-then-relate keeps (team, user) unique without relying
        // on the index for conflict resolution.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE member_of WHERE \
                 in = type::thing('user', $user_id) AND \
                 out = type::thing('team', $team_id); \
                 RELATE (type::thing('user', $user_id)) \
                 -> member_of -> (type::thing('team', $team_id)) \
                 SET role = $role; \
                 COMMIT TRANSACTION;",
            )
            .bind(("team_id", team_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("role", team_role_str(role)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn remove_member(&self, team_id: Uuid, user_id: Uuid) -> WorkgridResult<()> {
        self.db
            .query(
                "DELETE member_of WHERE \
                 in = type::thing('user', $user_id) AND \
                 out = type::thing('team', $team_id)",
            )
            .bind(("team_id", team_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_members(&self, team_id: Uuid) -> WorkgridResult<Vec<TeamMembership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(in) AS user_id, role, added_at \
                 FROM member_of \
                 WHERE out = type::thing('team', $team_id) \
                 ORDER BY added_at ASC",
            )
            .bind(("team_id", team_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;

        let memberships = rows
            .into_iter()
            .map(|row| {
                Ok(TeamMembership {
                    team_id,
                    user_id: parse_uuid(&row.user_id, "member")?,
                    role: parse_team_role(&row.role)?,
                    added_at: row.added_at,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(memberships)
    }

    async fn change_leader(&self, team_id: Uuid, new_leader_id: Uuid) -> WorkgridResult<Team> {
        // One transaction repoints leader_id, demotes every existing
        // Leader row (healing any drift), and installs the new leader's
        // edge.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE type::thing('team', $team_id) SET \
                 leader_id = $new_leader_id, updated_at = time::now(); \
                 UPDATE member_of SET role = 'Member' WHERE \
                 out = type::thing('team', $team_id) AND role = 'Leader'; \
                 DELETE member_of WHERE \
                 in = type::thing('user', $new_leader_id) AND \
                 out = type::thing('team', $team_id); \
                 RELATE (type::thing('user', $new_leader_id)) \
                 -> member_of -> (type::thing('team', $team_id)) \
                 SET role = 'Leader'; \
                 COMMIT TRANSACTION;",
            )
            .bind(("team_id", team_id.to_string()))
            .bind(("new_leader_id", new_leader_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        self.get_by_id(team_id).await
    }
}

impl<C: Connection> MembershipLookup for SurrealTeamRepository<C> {
    async fn membership_role(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> WorkgridResult<Option<TeamRole>> {
        let mut result = self
            .db
            .query(
                "SELECT role FROM member_of WHERE \
                 in = type::thing('user', $user_id) AND \
                 out = type::thing('team', $team_id)",
            )
            .bind(("team_id", team_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .next()
            .map(|row| Ok(parse_team_role(&row.role)?))
            .transpose()
    }
}

//! SurrealDB implementation of [`ProjectRepository`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::project::{CreateProject, Project, UpdateProject};
use workgrid_core::repository::{PaginatedResult, Pagination, ProjectRepository};

use crate::error::DbError;
use crate::repository::{
    parse_project_status, parse_uuid, parse_visibility, project_status_str, visibility_str,
};

#[derive(Debug, Deserialize)]
struct ProjectRow {
    name: String,
    description: String,
    owner_id: String,
    team_id: Option<String>,
    visibility: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRow {
    fn into_project(self, id: Uuid) -> Result<Project, DbError> {
        Ok(Project {
            id,
            name: self.name,
            description: self.description,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            team_id: self
                .team_id
                .map(|t| parse_uuid(&t, "team"))
                .transpose()?,
            visibility: parse_visibility(&self.visibility)?,
            status: parse_project_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProjectRowWithId {
    record_id: String,
    name: String,
    description: String,
    owner_id: String,
    team_id: Option<String>,
    visibility: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProjectRowWithId {
    fn try_into_project(self) -> Result<Project, DbError> {
        let id = parse_uuid(&self.record_id, "project")?;
        Ok(Project {
            id,
            name: self.name,
            description: self.description,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            team_id: self
                .team_id
                .map(|t| parse_uuid(&t, "team"))
                .transpose()?,
            visibility: parse_visibility(&self.visibility)?,
            status: parse_project_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Project repository.
#[derive(Clone)]
pub struct SurrealProjectRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProjectRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProjectRepository for SurrealProjectRepository<C> {
    async fn create(&self, input: CreateProject) -> WorkgridResult<Project> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('project', $id) SET \
                 name = $name, description = $description, \
                 owner_id = $owner_id, team_id = $team_id, \
                 visibility = $visibility, status = 'Active'",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("team_id", input.team_id.map(|t| t.to_string())))
            .bind(("visibility", visibility_str(input.visibility)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.into_project(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> WorkgridResult<Project> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('project', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.into_project(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateProject) -> WorkgridResult<Project> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.team_id.is_some() {
            sets.push("team_id = $team_id");
        }
        if input.visibility.is_some() {
            sets.push("visibility = $visibility");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::thing('project', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(team_id) = input.team_id {
            builder = builder.bind(("team_id", team_id.map(|t| t.to_string())));
        }
        if let Some(visibility) = input.visibility {
            builder = builder.bind(("visibility", visibility_str(visibility)));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", project_status_str(status)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ProjectRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "project".into(),
            id: id_str,
        })?;

        Ok(row.into_project(id)?)
    }

    async fn delete(&self, id: Uuid) -> WorkgridResult<()> {
        // Cascading cleanup: dependent comments, tasks, modules, and
        // grants disappear with the project as one atomic unit. A
        // partial failure rolls the whole statement list back.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 LET $task_ids = \
                 (SELECT VALUE meta::id(id) FROM task \
                 WHERE project_id = $project_id); \
                 LET $module_ids = \
                 (SELECT VALUE meta::id(id) FROM module \
                 WHERE project_id = $project_id); \
                 LET $comment_ids = \
                 (SELECT VALUE meta::id(id) FROM comment \
                 WHERE task_id IN $task_ids); \
                 DELETE permission_grant WHERE \
                 (resource_kind = 'Project' AND resource_id = $project_id) \
                 OR (resource_kind = 'ProjectModule' \
                 AND resource_id IN $module_ids) \
                 OR (resource_kind = 'Task' AND resource_id IN $task_ids) \
                 OR (resource_kind = 'Comment' \
                 AND resource_id IN $comment_ids); \
                 DELETE comment WHERE task_id IN $task_ids; \
                 DELETE task WHERE project_id = $project_id; \
                 DELETE module WHERE project_id = $project_id; \
                 DELETE type::thing('project', $project_id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("project_id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WorkgridResult<PaginatedResult<Project>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM project GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM project \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_project())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

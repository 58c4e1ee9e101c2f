//! Per-variant resource loaders behind the single [`AuthContextLookup`]
//! trait.
//!
//! Every variant projects down to the same `{owner_id, team_id,
//! visibility}` shape the decision engine operates on. Composite
//! variants join through their parent chain (module -> project,
//! task -> project, comment -> task -> project) to recover team and
//! visibility defaults when their own fields are null.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::access::{AuthContext, ResourceKind, ResourceRef, Visibility};
use workgrid_core::error::WorkgridResult;
use workgrid_core::repository::AuthContextLookup;

use crate::error::DbError;
use crate::repository::{parse_uuid, parse_visibility};

#[derive(Debug, Deserialize)]
struct ProjectLinkRow {
    owner_id: String,
    team_id: Option<String>,
    visibility: String,
}

#[derive(Debug, Deserialize)]
struct ModuleLinkRow {
    owner_id: String,
    project_id: Option<String>,
    team_id: Option<String>,
    visibility: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskLinkRow {
    owner_id: String,
    project_id: String,
}

#[derive(Debug, Deserialize)]
struct CommentLinkRow {
    author_id: String,
    task_id: String,
}

/// Resolves any [`ResourceRef`] to its authorization projection.
#[derive(Clone)]
pub struct SurrealResourceDirectory<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResourceDirectory<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn not_found(resource: ResourceRef) -> DbError {
        DbError::NotFound {
            entity: resource.kind.as_str().into(),
            id: resource.id.to_string(),
        }
    }

    async fn project_link(&self, project_id: &str) -> WorkgridResult<Option<ProjectLinkRow>> {
        let mut result = self
            .db
            .query(
                "SELECT owner_id, team_id, visibility \
                 FROM type::thing('project', $id)",
            )
            .bind(("id", project_id.to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProjectLinkRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next())
    }

    async fn module_link(&self, module_id: &str) -> WorkgridResult<Option<ModuleLinkRow>> {
        let mut result = self
            .db
            .query(
                "SELECT owner_id, project_id, team_id, visibility \
                 FROM type::thing('module', $id)",
            )
            .bind(("id", module_id.to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModuleLinkRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next())
    }

    async fn task_link(&self, task_id: &str) -> WorkgridResult<Option<TaskLinkRow>> {
        let mut result = self
            .db
            .query(
                "SELECT owner_id, project_id \
                 FROM type::thing('task', $id)",
            )
            .bind(("id", task_id.to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskLinkRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next())
    }

    async fn comment_link(&self, comment_id: &str) -> WorkgridResult<Option<CommentLinkRow>> {
        let mut result = self
            .db
            .query(
                "SELECT author_id, task_id \
                 FROM type::thing('comment', $id)",
            )
            .bind(("id", comment_id.to_owned()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentLinkRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next())
    }

    fn project_context(row: ProjectLinkRow) -> Result<AuthContext, DbError> {
        Ok(AuthContext {
            owner_id: parse_uuid(&row.owner_id, "owner")?,
            team_id: row.team_id.map(|t| parse_uuid(&t, "team")).transpose()?,
            visibility: Some(parse_visibility(&row.visibility)?),
        })
    }

    /// Task and comment contexts: the parent project supplies team and
    /// visibility, the resource supplies its owner.
    async fn project_backed_context(
        &self,
        resource: ResourceRef,
        owner_id: Uuid,
        project_id: &str,
    ) -> WorkgridResult<AuthContext> {
        let project = self
            .project_link(project_id)
            .await?
            .ok_or_else(|| Self::not_found(resource))?;
        let parent = Self::project_context(project)?;

        Ok(AuthContext {
            owner_id,
            team_id: parent.team_id,
            visibility: parent.visibility,
        })
    }
}

impl<C: Connection> AuthContextLookup for SurrealResourceDirectory<C> {
    async fn auth_context(&self, resource: ResourceRef) -> WorkgridResult<AuthContext> {
        let id_str = resource.id.to_string();

        match resource.kind {
            ResourceKind::Project => {
                let row = self
                    .project_link(&id_str)
                    .await?
                    .ok_or_else(|| Self::not_found(resource))?;
                Ok(Self::project_context(row)?)
            }

            ResourceKind::ProjectModule | ResourceKind::StandaloneModule => {
                let row = self
                    .module_link(&id_str)
                    .await?
                    .ok_or_else(|| Self::not_found(resource))?;

                // A ref whose kind disagrees with the stored linkage is
                // stale and resolves to nothing.
                let standalone = resource.kind == ResourceKind::StandaloneModule;
                if standalone != row.project_id.is_none() {
                    return Err(Self::not_found(resource).into());
                }

                let own_team = row
                    .team_id
                    .map(|t| parse_uuid(&t, "team"))
                    .transpose()?;
                let own_visibility: Option<Visibility> = row
                    .visibility
                    .map(|v| parse_visibility(&v))
                    .transpose()?;
                let owner_id = parse_uuid(&row.owner_id, "owner")?;

                let (team_id, visibility) = match row.project_id {
                    Some(project_id) => {
                        let parent = self
                            .project_link(&project_id)
                            .await?
                            .ok_or_else(|| Self::not_found(resource))?;
                        let parent = Self::project_context(parent)?;
                        (
                            own_team.or(parent.team_id),
                            own_visibility.or(parent.visibility),
                        )
                    }
                    None => (own_team, own_visibility),
                };

                Ok(AuthContext {
                    owner_id,
                    team_id,
                    visibility,
                })
            }

            ResourceKind::Task => {
                let row = self
                    .task_link(&id_str)
                    .await?
                    .ok_or_else(|| Self::not_found(resource))?;
                let owner_id = parse_uuid(&row.owner_id, "owner")?;
                self.project_backed_context(resource, owner_id, &row.project_id)
                    .await
            }

            ResourceKind::Comment => {
                let row = self
                    .comment_link(&id_str)
                    .await?
                    .ok_or_else(|| Self::not_found(resource))?;
                let author_id = parse_uuid(&row.author_id, "author")?;

                let task = self
                    .task_link(&row.task_id)
                    .await?
                    .ok_or_else(|| Self::not_found(resource))?;
                self.project_backed_context(resource, author_id, &task.project_id)
                    .await
            }
        }
    }
}

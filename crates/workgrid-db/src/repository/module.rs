//! SurrealDB implementation of [`ModuleRepository`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::module::{CreateModule, Module, UpdateModule};
use workgrid_core::repository::ModuleRepository;

use crate::error::DbError;
use crate::repository::{parse_uuid, parse_visibility, visibility_str};

#[derive(Debug, Deserialize)]
struct ModuleRow {
    name: String,
    description: String,
    project_id: Option<String>,
    owner_id: String,
    team_id: Option<String>,
    visibility: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModuleRow {
    fn into_module(self, id: Uuid) -> Result<Module, DbError> {
        Ok(Module {
            id,
            name: self.name,
            description: self.description,
            project_id: self
                .project_id
                .map(|p| parse_uuid(&p, "project"))
                .transpose()?,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            team_id: self
                .team_id
                .map(|t| parse_uuid(&t, "team"))
                .transpose()?,
            visibility: self
                .visibility
                .map(|v| parse_visibility(&v))
                .transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ModuleRowWithId {
    record_id: String,
    name: String,
    description: String,
    project_id: Option<String>,
    owner_id: String,
    team_id: Option<String>,
    visibility: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ModuleRowWithId {
    fn try_into_module(self) -> Result<Module, DbError> {
        let id = parse_uuid(&self.record_id, "module")?;
        ModuleRow {
            name: self.name,
            description: self.description,
            project_id: self.project_id,
            owner_id: self.owner_id,
            team_id: self.team_id,
            visibility: self.visibility,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_module(id)
    }
}

/// SurrealDB implementation of the Module repository.
#[derive(Clone)]
pub struct SurrealModuleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealModuleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ModuleRepository for SurrealModuleRepository<C> {
    async fn create(&self, input: CreateModule) -> WorkgridResult<Module> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('module', $id) SET \
                 name = $name, description = $description, \
                 project_id = $project_id, owner_id = $owner_id, \
                 team_id = $team_id, visibility = $visibility",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("project_id", input.project_id.map(|p| p.to_string())))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("team_id", input.team_id.map(|t| t.to_string())))
            .bind(("visibility", input.visibility.map(visibility_str)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ModuleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "module".into(),
            id: id_str,
        })?;

        Ok(row.into_module(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> WorkgridResult<Module> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('module', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModuleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "module".into(),
            id: id_str,
        })?;

        Ok(row.into_module(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateModule) -> WorkgridResult<Module> {
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
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::thing('module', $id) SET {}",
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
            builder = builder.bind(("visibility", visibility.map(visibility_str)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<ModuleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "module".into(),
            id: id_str,
        })?;

        Ok(row.into_module(id)?)
    }

    async fn delete(&self, id: Uuid) -> WorkgridResult<()> {
        let id_str = id.to_string();

        // Tasks keep their project linkage; only the module association
        // and the module's own grants go.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPDATE task SET module_id = NONE WHERE module_id = $id; \
                 DELETE permission_grant WHERE \
                 resource_kind IN ['ProjectModule', 'StandaloneModule'] \
                 AND resource_id = $id; \
                 DELETE type::thing('module', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_project(&self, project_id: Uuid) -> WorkgridResult<Vec<Module>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM module \
                 WHERE project_id = $project_id \
                 ORDER BY created_at ASC",
            )
            .bind(("project_id", project_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ModuleRowWithId> = result.take(0).map_err(DbError::from)?;

        let modules = rows
            .into_iter()
            .map(|row| row.try_into_module())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(modules)
    }
}

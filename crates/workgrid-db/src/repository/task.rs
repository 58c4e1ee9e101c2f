//! SurrealDB implementation of [`TaskRepository`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::task::{CreateTask, Task, UpdateTask};
use workgrid_core::repository::{PaginatedResult, Pagination, TaskRepository};

use crate::error::DbError;
use crate::repository::{parse_task_status, parse_uuid, task_status_str};

#[derive(Debug, Deserialize)]
struct TaskRow {
    project_id: String,
    module_id: Option<String>,
    title: String,
    details: String,
    owner_id: String,
    assignee_id: Option<String>,
    status: String,
    due_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn into_task(self, id: Uuid) -> Result<Task, DbError> {
        Ok(Task {
            id,
            project_id: parse_uuid(&self.project_id, "project")?,
            module_id: self
                .module_id
                .map(|m| parse_uuid(&m, "module"))
                .transpose()?,
            title: self.title,
            details: self.details,
            owner_id: parse_uuid(&self.owner_id, "owner")?,
            assignee_id: self
                .assignee_id
                .map(|a| parse_uuid(&a, "assignee"))
                .transpose()?,
            status: parse_task_status(&self.status)?,
            due_at: self.due_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TaskRowWithId {
    record_id: String,
    project_id: String,
    module_id: Option<String>,
    title: String,
    details: String,
    owner_id: String,
    assignee_id: Option<String>,
    status: String,
    due_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRowWithId {
    fn try_into_task(self) -> Result<Task, DbError> {
        let id = parse_uuid(&self.record_id, "task")?;
        TaskRow {
            project_id: self.project_id,
            module_id: self.module_id,
            title: self.title,
            details: self.details,
            owner_id: self.owner_id,
            assignee_id: self.assignee_id,
            status: self.status,
            due_at: self.due_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_task(id)
    }
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Task repository.
#[derive(Clone)]
pub struct SurrealTaskRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTaskRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TaskRepository for SurrealTaskRepository<C> {
    async fn create(&self, input: CreateTask) -> WorkgridResult<Task> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('task', $id) SET \
                 project_id = $project_id, module_id = $module_id, \
                 title = $title, details = $details, \
                 owner_id = $owner_id, assignee_id = $assignee_id, \
                 status = 'Open', due_at = $due_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("project_id", input.project_id.to_string()))
            .bind(("module_id", input.module_id.map(|m| m.to_string())))
            .bind(("title", input.title))
            .bind(("details", input.details))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("assignee_id", input.assignee_id.map(|a| a.to_string())))
            .bind(("due_at", input.due_at.map(surrealdb::sql::Datetime::from)))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> WorkgridResult<Task> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('task', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateTask) -> WorkgridResult<Task> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.details.is_some() {
            sets.push("details = $details");
        }
        if input.assignee_id.is_some() {
            sets.push("assignee_id = $assignee_id");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.due_at.is_some() {
            sets.push("due_at = $due_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::thing('task', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(details) = input.details {
            builder = builder.bind(("details", details));
        }
        if let Some(assignee_id) = input.assignee_id {
            builder = builder.bind(("assignee_id", assignee_id.map(|a| a.to_string())));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", task_status_str(status)));
        }
        if let Some(due_at) = input.due_at {
            builder = builder.bind(("due_at", due_at.map(surrealdb::sql::Datetime::from)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<TaskRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "task".into(),
            id: id_str,
        })?;

        Ok(row.into_task(id)?)
    }

    async fn delete(&self, id: Uuid) -> WorkgridResult<()> {
        let id_str = id.to_string();

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 LET $comment_ids = \
                 (SELECT VALUE meta::id(id) FROM comment \
                 WHERE task_id = $id); \
                 DELETE permission_grant WHERE \
                 (resource_kind = 'Task' AND resource_id = $id) \
                 OR (resource_kind = 'Comment' \
                 AND resource_id IN $comment_ids); \
                 DELETE comment WHERE task_id = $id; \
                 DELETE type::thing('task', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
        pagination: Pagination,
    ) -> WorkgridResult<PaginatedResult<Task>> {
        let project_id_str = project_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM task \
                 WHERE project_id = $project_id GROUP ALL",
            )
            .bind(("project_id", project_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM task \
                 WHERE project_id = $project_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("project_id", project_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TaskRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_task())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

//! SurrealDB implementation of [`CommentRepository`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::comment::{Comment, CreateComment, UpdateComment};
use workgrid_core::repository::CommentRepository;

use crate::error::DbError;
use crate::repository::parse_uuid;

#[derive(Debug, Deserialize)]
struct CommentRow {
    task_id: String,
    author_id: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self, id: Uuid) -> Result<Comment, DbError> {
        Ok(Comment {
            id,
            task_id: parse_uuid(&self.task_id, "task")?,
            author_id: parse_uuid(&self.author_id, "author")?,
            body: self.body,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CommentRowWithId {
    record_id: String,
    task_id: String,
    author_id: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommentRowWithId {
    fn try_into_comment(self) -> Result<Comment, DbError> {
        let id = parse_uuid(&self.record_id, "comment")?;
        CommentRow {
            task_id: self.task_id,
            author_id: self.author_id,
            body: self.body,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_comment(id)
    }
}

/// SurrealDB implementation of the Comment repository.
#[derive(Clone)]
pub struct SurrealCommentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCommentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CommentRepository for SurrealCommentRepository<C> {
    async fn create(&self, input: CreateComment) -> WorkgridResult<Comment> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::thing('comment', $id) SET \
                 task_id = $task_id, author_id = $author_id, \
                 body = $body",
            )
            .bind(("id", id_str.clone()))
            .bind(("task_id", input.task_id.to_string()))
            .bind(("author_id", input.author_id.to_string()))
            .bind(("body", input.body))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.into_comment(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> WorkgridResult<Comment> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('comment', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.into_comment(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateComment) -> WorkgridResult<Comment> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.body.is_some() {
            sets.push("body = $body");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::thing('comment', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(body) = input.body {
            builder = builder.bind(("body", body));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<CommentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "comment".into(),
            id: id_str,
        })?;

        Ok(row.into_comment(id)?)
    }

    async fn delete(&self, id: Uuid) -> WorkgridResult<()> {
        let id_str = id.to_string();

        self.db
            .query(
                "DELETE permission_grant WHERE \
                 resource_kind = 'Comment' AND resource_id = $id; \
                 DELETE type::thing('comment', $id);",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_task(&self, task_id: Uuid) -> WorkgridResult<Vec<Comment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM comment \
                 WHERE task_id = $task_id \
                 ORDER BY created_at ASC",
            )
            .bind(("task_id", task_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CommentRowWithId> = result.take(0).map_err(DbError::from)?;

        let comments = rows
            .into_iter()
            .map(|row| row.try_into_comment())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(comments)
    }
}

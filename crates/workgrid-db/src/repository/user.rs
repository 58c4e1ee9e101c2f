//! SurrealDB implementation of [`UserRepository`] and the principal
//! lookup the authorization engine consumes.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::access::Principal;
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::user::{CreateUser, UpdateUser, User, UserStatus};
use workgrid_core::repository::{PaginatedResult, Pagination, PrincipalLookup, UserRepository};

use crate::error::DbError;
use crate::repository::{
    global_role_str, parse_global_role, parse_user_status, parse_uuid, user_status_str,
};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, Deserialize)]
struct UserRow {
    username: String,
    email: String,
    global_role: String,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            global_role: parse_global_role(&self.global_role)?,
            status: parse_user_status(&self.status)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, Deserialize)]
struct UserRowWithId {
    record_id: String,
    username: String,
    email: String,
    global_role: String,
    status: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid(&self.record_id, "user")?;
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            global_role: parse_global_role(&self.global_role)?,
            status: parse_user_status(&self.status)?,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Projection used by the authorization engine.
#[derive(Debug, Deserialize)]
struct PrincipalRow {
    global_role: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> WorkgridResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::thing('user', $id) SET \
                 username = $username, email = $email, \
                 global_role = $global_role, status = 'Active', \
                 metadata = $metadata",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("global_role", global_role_str(input.global_role)))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> WorkgridResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::thing('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> WorkgridResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.username.is_some() {
            sets.push("username = $username");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.global_role.is_some() {
            sets.push("global_role = $global_role");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::thing('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(username) = input.username {
            builder = builder.bind(("username", username));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(global_role) = input.global_role {
            builder = builder.bind(("global_role", global_role_str(global_role)));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", user_status_str(status)));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn deactivate(&self, id: Uuid) -> WorkgridResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::thing('user', $id) SET \
                 status = 'Inactive', updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> WorkgridResult<PaginatedResult<User>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

impl<C: Connection> PrincipalLookup for SurrealUserRepository<C> {
    async fn principal(&self, user_id: Uuid) -> WorkgridResult<Principal> {
        let id_str = user_id.to_string();

        let mut result = self
            .db
            .query("SELECT global_role, status FROM type::thing('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PrincipalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(Principal {
            id: user_id,
            global_role: parse_global_role(&row.global_role)?,
            active: parse_user_status(&row.status)? == UserStatus::Active,
        })
    }
}

//! SurrealDB implementation of [`DashboardRepository`].

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;
use workgrid_core::error::WorkgridResult;
use workgrid_core::models::dashboard::DashboardSummary;
use workgrid_core::repository::DashboardRepository;

use crate::error::DbError;

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

fn take_count(result: &mut surrealdb::Response, idx: usize) -> Result<u64, DbError> {
    let rows: Vec<CountRow> = result.take(idx)?;
    Ok(rows.first().map(|r| r.total).unwrap_or(0))
}

/// SurrealDB implementation of the dashboard aggregates.
#[derive(Clone)]
pub struct SurrealDashboardRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDashboardRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DashboardRepository for SurrealDashboardRepository<C> {
    async fn summary(&self, user_id: Uuid) -> WorkgridResult<DashboardSummary> {
        let result = self
            .db
            .query(
                "SELECT count() AS total FROM project \
                 WHERE owner_id = $user_id GROUP ALL; \
                 SELECT count() AS total FROM module \
                 WHERE owner_id = $user_id GROUP ALL; \
                 SELECT count() AS total FROM task \
                 WHERE assignee_id = $user_id \
                 AND status IN ['Open', 'InProgress'] GROUP ALL; \
                 SELECT count() AS total FROM task \
                 WHERE assignee_id = $user_id \
                 AND status = 'Done' GROUP ALL; \
                 SELECT count() AS total FROM comment \
                 WHERE author_id = $user_id GROUP ALL;",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(DbError::from)?;

        Ok(DashboardSummary {
            projects: take_count(&mut result, 0)?,
            modules: take_count(&mut result, 1)?,
            open_tasks: take_count(&mut result, 2)?,
            completed_tasks: take_count(&mut result, 3)?,
            comments: take_count(&mut result, 4)?,
        })
    }
}

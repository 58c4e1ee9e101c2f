//! Project domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Visibility;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectStatus {
    Active,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Owned exclusively by the creator at creation time.
    pub owner_id: Uuid,
    /// Mutable only by a principal holding Edit/Admin tier.
    pub team_id: Option<Uuid>,
    /// Mutable only by a principal holding Edit/Admin tier.
    pub visibility: Visibility,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub team_id: Option<Option<Uuid>>,
    pub visibility: Option<Visibility>,
    pub status: Option<ProjectStatus>,
}

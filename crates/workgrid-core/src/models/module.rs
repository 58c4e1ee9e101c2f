//! Module domain model.
//!
//! A module groups tasks. It either belongs to a project (inheriting the
//! project's team and visibility when its own fields are null) or stands
//! alone with its own linkage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{ResourceKind, Visibility};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// `None` for a standalone module.
    pub project_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
    pub visibility: Option<Visibility>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Module {
    pub fn kind(&self) -> ResourceKind {
        if self.project_id.is_some() {
            ResourceKind::ProjectModule
        } else {
            ResourceKind::StandaloneModule
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateModule {
    pub name: String,
    pub description: String,
    pub project_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub team_id: Option<Uuid>,
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateModule {
    pub name: Option<String>,
    pub description: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub team_id: Option<Option<Uuid>>,
    pub visibility: Option<Option<Visibility>>,
}

//! Team domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::TeamRole;

/// A team of users that share access to the resources linked to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Designated leader. Derived from the `Leader` membership row and
    /// kept consistent with it by every leadership write; the membership
    /// role is authoritative for tier computation.
    pub leader_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeam {
    pub name: String,
    pub description: String,
    /// The creator; auto-inserted as a `Leader` membership.
    pub leader_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A single membership row, unique per (team, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMembership {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub added_at: DateTime<Utc>,
}

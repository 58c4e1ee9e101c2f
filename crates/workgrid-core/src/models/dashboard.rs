//! Dashboard summary model.

use serde::{Deserialize, Serialize};

/// Per-user aggregate counts feeding the dashboard.
///
/// The shape is fixed: degraded-schema reads return this struct with every
/// field zeroed rather than omitting fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Projects owned by the user.
    pub projects: u64,
    /// Modules owned by the user.
    pub modules: u64,
    /// Tasks assigned to the user that are open or in progress.
    pub open_tasks: u64,
    /// Tasks assigned to the user that are done.
    pub completed_tasks: u64,
    /// Comments authored by the user.
    pub comments: u64,
}

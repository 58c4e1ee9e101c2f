//! Dashboard read path with degraded-schema fallback.

use uuid::Uuid;

use workgrid_core::error::WorkgridResult;
use workgrid_core::models::dashboard::DashboardSummary;
use workgrid_core::repository::DashboardRepository;

use crate::shim;

/// Per-user dashboard aggregates.
///
/// When an aggregation source table is absent the summary comes back
/// zero-valued in its fixed shape; connectivity failures still surface.
pub struct DashboardService<D> {
    dashboards: D,
}

impl<D: DashboardRepository> DashboardService<D> {
    pub fn new(dashboards: D) -> Self {
        Self { dashboards }
    }

    pub async fn summary(&self, user_id: Uuid) -> WorkgridResult<DashboardSummary> {
        shim::summary_or_zero(self.dashboards.summary(user_id).await)
    }
}

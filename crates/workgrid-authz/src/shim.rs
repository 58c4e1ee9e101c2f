//! Schema availability shim.
//!
//! Each resolver the engine consults may be individually absent from the
//! store (a missing table or function). The helpers here re-classify that
//! one condition into a safe default (deny, empty, or zero) and let
//! every other failure propagate untouched. Classification relies on the
//! structured [`WorkgridError::SchemaMissing`] kind produced by the store
//! layer, never on message contents.
//!
//! Timeouts and connectivity failures are [`WorkgridError::Unavailable`]
//! and are deliberately NOT absorbed: an infrastructure failure must
//! surface as a server error, not masquerade as a permission decision.

use tracing::warn;

use workgrid_core::access::{AuthContext, PermissionTier, ResourceKind, ResourceRef, TeamRole};
use workgrid_core::error::{WorkgridError, WorkgridResult};
use workgrid_core::models::dashboard::DashboardSummary;

/// Resource loader fallback: a missing resource, or a missing table for a
/// non-primary resource kind, degrades to "absent" (the caller denies).
///
/// The base `Project` table is the primary schema element; its absence
/// is an installation fault, not a degradation, and stays fatal.
pub fn auth_context_or_absent(
    result: WorkgridResult<AuthContext>,
    resource: ResourceRef,
) -> WorkgridResult<Option<AuthContext>> {
    match result {
        Ok(ctx) => Ok(Some(ctx)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(WorkgridError::SchemaMissing { element })
            if resource.kind != ResourceKind::Project =>
        {
            warn!(
                element = %element,
                kind = resource.kind.as_str(),
                "resource table absent; treating resource as not found"
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Team role fallback: when the membership store is absent, the principal
/// is not a member. Team-based access is never granted on missing
/// infrastructure.
pub fn membership_or_none(
    result: WorkgridResult<Option<TeamRole>>,
) -> WorkgridResult<Option<TeamRole>> {
    match result {
        Err(WorkgridError::SchemaMissing { element }) => {
            warn!(element = %element, "membership table absent; treating principal as non-member");
            Ok(None)
        }
        other => other,
    }
}

/// Explicit grant fallback: no grant store, no grant.
pub fn grant_or_none(
    result: WorkgridResult<Option<PermissionTier>>,
) -> WorkgridResult<Option<PermissionTier>> {
    match result {
        Err(WorkgridError::SchemaMissing { element }) => {
            warn!(element = %element, "grant table absent; treating grant as none");
            Ok(None)
        }
        other => other,
    }
}

/// Dashboard fallback: aggregation over absent tables yields the fixed
/// zero-valued summary shape rather than omitting fields.
pub fn summary_or_zero(
    result: WorkgridResult<DashboardSummary>,
) -> WorkgridResult<DashboardSummary> {
    match result {
        Err(WorkgridError::SchemaMissing { element }) => {
            warn!(element = %element, "dashboard source table absent; returning zeroed summary");
            Ok(DashboardSummary::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn missing(element: &str) -> WorkgridError {
        WorkgridError::SchemaMissing {
            element: element.into(),
        }
    }

    #[test]
    fn non_primary_resource_degrades_to_absent() {
        let resource = ResourceRef::new(ResourceKind::Task, Uuid::new_v4());
        let out = auth_context_or_absent(Err(missing("task")), resource).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn primary_resource_absence_stays_fatal() {
        let resource = ResourceRef::new(ResourceKind::Project, Uuid::new_v4());
        let err = auth_context_or_absent(Err(missing("project")), resource).unwrap_err();
        assert!(err.is_schema_missing());
    }

    #[test]
    fn unavailable_is_never_absorbed() {
        let resource = ResourceRef::new(ResourceKind::Task, Uuid::new_v4());
        let err = auth_context_or_absent(
            Err(WorkgridError::Unavailable("connection reset".into())),
            resource,
        )
        .unwrap_err();
        assert!(matches!(err, WorkgridError::Unavailable(_)));

        let err = membership_or_none(Err(WorkgridError::Unavailable("timed out".into())))
            .unwrap_err();
        assert!(matches!(err, WorkgridError::Unavailable(_)));
    }

    #[test]
    fn degraded_summary_is_zeroed_not_partial() {
        let summary = summary_or_zero(Err(missing("task"))).unwrap();
        assert_eq!(summary, DashboardSummary::default());
    }
}

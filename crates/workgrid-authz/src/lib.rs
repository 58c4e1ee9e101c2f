//! Workgrid Authz — the authorization resolution engine.
//!
//! One decision procedure ([`AuthzEngine::authorize`]) answers every
//! "may principal P perform tier T on resource (kind, id)?" question in
//! the system, for all five resource variants, through a fixed precedence
//! chain: global admin, ownership, team role, explicit grant, visibility.
//!
//! Schema-availability degradation is cross-cutting: each resolver the
//! engine consults may be individually absent from the store, in which
//! case the [`shim`] substitutes a safe default (deny, empty, or zero)
//! instead of failing the request.

pub mod dashboard;
pub mod engine;
pub mod grants;
pub mod shim;
pub mod teams;

pub use dashboard::DashboardService;
pub use engine::{AuthzEngine, Decision, DenyReason};
pub use grants::GrantService;
pub use teams::TeamService;

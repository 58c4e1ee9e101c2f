//! End-to-end tests for the engine and the guarded services over the
//! SurrealDB-backed repositories.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::opt::Config;
use uuid::Uuid;
use workgrid_authz::{AuthzEngine, Decision, DashboardService, DenyReason, GrantService, TeamService};
use workgrid_core::access::{
    GlobalRole, PermissionTier, ResourceKind, ResourceRef, TeamRole, Visibility,
};
use workgrid_core::error::WorkgridError;
use workgrid_core::models::comment::CreateComment;
use workgrid_core::models::grant::UpsertGrant;
use workgrid_core::models::project::{CreateProject, UpdateProject};
use workgrid_core::models::task::{CreateTask, TaskStatus, UpdateTask};
use workgrid_core::models::user::CreateUser;
use workgrid_core::repository::{
    CommentRepository, ProjectRepository, TaskRepository, UserRepository,
};
use workgrid_db::repository::{
    SurrealCommentRepository, SurrealDashboardRepository, SurrealGrantRepository,
    SurrealProjectRepository, SurrealResourceDirectory, SurrealTaskRepository,
    SurrealTeamRepository, SurrealUserRepository,
};

type Engine = AuthzEngine<
    SurrealUserRepository<Db>,
    SurrealResourceDirectory<Db>,
    SurrealTeamRepository<Db>,
    SurrealGrantRepository<Db>,
>;

/// Spin up in-memory DB and run migrations.
async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    workgrid_db::run_migrations(&db).await.unwrap();
    db
}

fn engine(db: &Surreal<Db>) -> Engine {
    AuthzEngine::new(
        SurrealUserRepository::new(db.clone()),
        SurrealResourceDirectory::new(db.clone()),
        SurrealTeamRepository::new(db.clone()),
        SurrealGrantRepository::new(db.clone()),
    )
}

async fn create_user(db: &Surreal<Db>, name: &str, role: GlobalRole) -> Uuid {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            global_role: role,
            metadata: None,
        })
        .await
        .unwrap()
        .id
}

// -----------------------------------------------------------------------
// Engine over the real store
// -----------------------------------------------------------------------

#[tokio::test]
async fn full_chain_against_store() {
    let db = setup().await;
    let owner = create_user(&db, "owner", GlobalRole::User).await;
    let admin = create_user(&db, "admin", GlobalRole::Admin).await;
    let member = create_user(&db, "member", GlobalRole::User).await;
    let stranger = create_user(&db, "stranger", GlobalRole::User).await;

    let teams = SurrealTeamRepository::new(db.clone());
    let team_svc = TeamService::new(SurrealUserRepository::new(db.clone()), teams);
    let team = team_svc
        .create_team(owner, "core".into(), String::new())
        .await
        .unwrap();
    team_svc
        .upsert_member(owner, team.id, member, TeamRole::Member)
        .await
        .unwrap();

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            name: "Apollo".into(),
            description: String::new(),
            owner_id: owner,
            team_id: Some(team.id),
            visibility: Visibility::Private,
        })
        .await
        .unwrap();
    let resource = ResourceRef::new(ResourceKind::Project, project.id);

    let engine = engine(&db);

    // Owner and global admin hold every tier.
    for tier in [
        PermissionTier::View,
        PermissionTier::Edit,
        PermissionTier::Admin,
    ] {
        assert_eq!(
            engine.authorize(owner, resource, tier).await.unwrap(),
            Decision::Allow,
        );
        assert_eq!(
            engine.authorize(admin, resource, tier).await.unwrap(),
            Decision::Allow,
        );
    }

    // Team member edits but does not administer.
    assert_eq!(
        engine
            .authorize(member, resource, PermissionTier::Edit)
            .await
            .unwrap(),
        Decision::Allow,
    );
    assert_eq!(
        engine
            .authorize(member, resource, PermissionTier::Admin)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::InsufficientPermission),
    );

    // Stranger sees nothing on a private project.
    assert_eq!(
        engine
            .authorize(stranger, resource, PermissionTier::View)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::InsufficientPermission),
    );

    // Flipping visibility to Public opens View on the next request.
    SurrealProjectRepository::new(db.clone())
        .update(
            project.id,
            UpdateProject {
                visibility: Some(Visibility::Public),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        engine
            .authorize(stranger, resource, PermissionTier::View)
            .await
            .unwrap(),
        Decision::Allow,
    );
    assert_eq!(
        engine
            .authorize(stranger, resource, PermissionTier::Edit)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::InsufficientPermission),
    );
}

#[tokio::test]
async fn missing_resource_denies_not_found() {
    let db = setup().await;
    let user = create_user(&db, "user", GlobalRole::User).await;
    let engine = engine(&db);

    let ghost = ResourceRef::new(ResourceKind::Project, Uuid::new_v4());
    assert_eq!(
        engine
            .authorize(user, ghost, PermissionTier::View)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::NotFound),
    );
}

// -----------------------------------------------------------------------
// Team service
// -----------------------------------------------------------------------

#[tokio::test]
async fn non_leader_cannot_manage_members() {
    let db = setup().await;
    let leader = create_user(&db, "leader", GlobalRole::User).await;
    let member = create_user(&db, "member", GlobalRole::User).await;
    let outsider = create_user(&db, "outsider", GlobalRole::User).await;

    let svc = TeamService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTeamRepository::new(db.clone()),
    );
    let team = svc
        .create_team(leader, "core".into(), String::new())
        .await
        .unwrap();

    let err = svc
        .upsert_member(outsider, team.id, member, TeamRole::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkgridError::PermissionDenied { .. }));

    svc.upsert_member(leader, team.id, member, TeamRole::Member)
        .await
        .unwrap();
}

#[tokio::test]
async fn leader_role_is_not_assignable_directly() {
    let db = setup().await;
    let leader = create_user(&db, "leader", GlobalRole::User).await;
    let member = create_user(&db, "member", GlobalRole::User).await;

    let svc = TeamService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTeamRepository::new(db.clone()),
    );
    let team = svc
        .create_team(leader, "core".into(), String::new())
        .await
        .unwrap();

    let err = svc
        .upsert_member(leader, team.id, member, TeamRole::Leader)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkgridError::Validation { .. }));
}

#[tokio::test]
async fn drifted_leader_row_cannot_transfer_leadership() {
    let db = setup().await;
    let leader = create_user(&db, "leader", GlobalRole::User).await;
    let drifted = create_user(&db, "drifted", GlobalRole::User).await;
    let target = create_user(&db, "target", GlobalRole::User).await;

    let teams = SurrealTeamRepository::new(db.clone());
    let svc = TeamService::new(SurrealUserRepository::new(db.clone()), teams.clone());
    let team = svc
        .create_team(leader, "core".into(), String::new())
        .await
        .unwrap();

    // Simulate drift: a Leader-role row for a user who is not the
    // designated leader, written behind the service's back.
    db.query(
        "BEGIN TRANSACTION; \
         DELETE member_of WHERE in = type::thing('user', $user_id) \
         AND out = type::thing('team', $team_id); \
         RELATE (type::thing('user', $user_id)) \
         -> member_of -> (type::thing('team', $team_id)) \
         SET role = 'Leader'; \
         COMMIT TRANSACTION;",
    )
    .bind(("user_id", drifted.to_string()))
    .bind(("team_id", team.id.to_string()))
    .await
    .unwrap()
    .check()
    .unwrap();

    // The drifted row holds admin tier on team resources, but not the
    // power to eject the true leader.
    let err = svc
        .change_leader(drifted, team.id, target)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkgridError::PermissionDenied { .. }));

    // The designated leader can transfer, and the transfer heals the
    // drifted row.
    let team = svc.change_leader(leader, team.id, target).await.unwrap();
    assert_eq!(team.leader_id, target);

    use workgrid_core::repository::MembershipLookup;
    assert_eq!(
        teams.membership_role(team.id, drifted).await.unwrap(),
        Some(TeamRole::Member),
    );
    assert_eq!(
        teams.membership_role(team.id, target).await.unwrap(),
        Some(TeamRole::Leader),
    );
}

#[tokio::test]
async fn member_may_leave_but_leader_must_hand_over_first() {
    let db = setup().await;
    let leader = create_user(&db, "leader", GlobalRole::User).await;
    let member = create_user(&db, "member", GlobalRole::User).await;

    let svc = TeamService::new(
        SurrealUserRepository::new(db.clone()),
        SurrealTeamRepository::new(db.clone()),
    );
    let team = svc
        .create_team(leader, "core".into(), String::new())
        .await
        .unwrap();
    svc.upsert_member(leader, team.id, member, TeamRole::Member)
        .await
        .unwrap();

    // Self-removal needs no leader authority.
    svc.remove_member(member, team.id, member).await.unwrap();

    // The designated leader cannot be removed, not even by themself.
    let err = svc.remove_member(leader, team.id, leader).await.unwrap_err();
    assert!(matches!(err, WorkgridError::Validation { .. }));
}

// -----------------------------------------------------------------------
// Grant service
// -----------------------------------------------------------------------

#[tokio::test]
async fn grant_flow_takes_effect_on_next_request() {
    let db = setup().await;
    let owner = create_user(&db, "owner", GlobalRole::User).await;
    let grantee = create_user(&db, "grantee", GlobalRole::User).await;

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            name: "p".into(),
            description: String::new(),
            owner_id: owner,
            team_id: None,
            visibility: Visibility::Private,
        })
        .await
        .unwrap();
    let resource = ResourceRef::new(ResourceKind::Project, project.id);

    let svc = GrantService::new(engine(&db), SurrealGrantRepository::new(db.clone()));
    let check = engine(&db);

    assert_eq!(
        check
            .authorize(grantee, resource, PermissionTier::Edit)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::InsufficientPermission),
    );

    // Owner holds admin tier via ownership and may grant.
    svc.upsert(
        owner,
        UpsertGrant {
            resource_kind: resource.kind,
            resource_id: resource.id,
            user_id: grantee,
            tier: PermissionTier::Edit,
        },
    )
    .await
    .unwrap();

    // No caching: the very next authorization sees the grant.
    assert_eq!(
        check
            .authorize(grantee, resource, PermissionTier::Edit)
            .await
            .unwrap(),
        Decision::Allow,
    );
    assert_eq!(
        check
            .authorize(grantee, resource, PermissionTier::Admin)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::InsufficientPermission),
    );

    // And revocation is equally immediate.
    svc.revoke(owner, resource, grantee).await.unwrap();
    assert_eq!(
        check
            .authorize(grantee, resource, PermissionTier::Edit)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::InsufficientPermission),
    );
}

#[tokio::test]
async fn grant_mutation_requires_admin_tier() {
    let db = setup().await;
    let owner = create_user(&db, "owner", GlobalRole::User).await;
    let editor = create_user(&db, "editor", GlobalRole::User).await;
    let other = create_user(&db, "other", GlobalRole::User).await;

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            name: "p".into(),
            description: String::new(),
            owner_id: owner,
            team_id: None,
            visibility: Visibility::Private,
        })
        .await
        .unwrap();
    let resource = ResourceRef::new(ResourceKind::Project, project.id);

    let svc = GrantService::new(engine(&db), SurrealGrantRepository::new(db.clone()));

    // Give the editor Edit tier; Edit is not enough to grant.
    svc.upsert(
        owner,
        UpsertGrant {
            resource_kind: resource.kind,
            resource_id: resource.id,
            user_id: editor,
            tier: PermissionTier::Edit,
        },
    )
    .await
    .unwrap();

    let err = svc
        .upsert(
            editor,
            UpsertGrant {
                resource_kind: resource.kind,
                resource_id: resource.id,
                user_id: other,
                tier: PermissionTier::View,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkgridError::PermissionDenied { .. }));
}

// -----------------------------------------------------------------------
// Dashboard service
// -----------------------------------------------------------------------

#[tokio::test]
async fn dashboard_summary_counts_per_user() {
    let db = setup().await;
    let user = create_user(&db, "user", GlobalRole::User).await;
    let other = create_user(&db, "other", GlobalRole::User).await;

    let projects = SurrealProjectRepository::new(db.clone());
    let tasks = SurrealTaskRepository::new(db.clone());
    let comments = SurrealCommentRepository::new(db.clone());

    let project = projects
        .create(CreateProject {
            name: "p".into(),
            description: String::new(),
            owner_id: user,
            team_id: None,
            visibility: Visibility::Private,
        })
        .await
        .unwrap();

    for i in 0..3 {
        let task = tasks
            .create(CreateTask {
                project_id: project.id,
                module_id: None,
                title: format!("t{i}"),
                details: String::new(),
                owner_id: other,
                assignee_id: Some(user),
                due_at: None,
            })
            .await
            .unwrap();
        if i == 0 {
            tasks
                .update(
                    task.id,
                    UpdateTask {
                        status: Some(TaskStatus::Done),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            comments
                .create(CreateComment {
                    task_id: task.id,
                    author_id: user,
                    body: "done".into(),
                })
                .await
                .unwrap();
        }
    }

    let svc = DashboardService::new(SurrealDashboardRepository::new(db));
    let summary = svc.summary(user).await.unwrap();

    assert_eq!(summary.projects, 1);
    assert_eq!(summary.open_tasks, 2);
    assert_eq!(summary.completed_tasks, 1);
    assert_eq!(summary.comments, 1);
    assert_eq!(summary.modules, 0);
}

// -----------------------------------------------------------------------
// Degraded schema, end to end
// -----------------------------------------------------------------------

/// Only the identity and primary project tables exist; memberships,
/// grants, modules, tasks, and comments are all absent.
const PARTIAL_SCHEMA: &str = "\
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD global_role ON TABLE user TYPE string \
    ASSERT $value IN ['Admin', 'User', 'Viewer'];
DEFINE FIELD status ON TABLE user TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD metadata ON TABLE user TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE user TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime DEFAULT time::now();

DEFINE TABLE project SCHEMAFULL;
DEFINE FIELD name ON TABLE project TYPE string;
DEFINE FIELD description ON TABLE project TYPE string;
DEFINE FIELD owner_id ON TABLE project TYPE string;
DEFINE FIELD team_id ON TABLE project TYPE option<string>;
DEFINE FIELD visibility ON TABLE project TYPE string \
    ASSERT $value IN ['Private', 'Team', 'Public'];
DEFINE FIELD status ON TABLE project TYPE string \
    ASSERT $value IN ['Active', 'Archived'];
DEFINE FIELD created_at ON TABLE project TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE project TYPE datetime DEFAULT time::now();
";

async fn setup_partial_strict() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(Config::default().strict()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    db.query("DEFINE NAMESPACE test; DEFINE DATABASE test;")
        .await
        .unwrap()
        .check()
        .unwrap();
    db.query(PARTIAL_SCHEMA).await.unwrap().check().unwrap();
    db
}

#[tokio::test]
async fn degraded_store_denies_team_access_without_failing() {
    let db = setup_partial_strict().await;
    let owner = create_user(&db, "owner", GlobalRole::User).await;
    let member = create_user(&db, "member", GlobalRole::User).await;
    let admin = create_user(&db, "admin", GlobalRole::Admin).await;

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            name: "p".into(),
            description: String::new(),
            owner_id: owner,
            team_id: Some(Uuid::new_v4()),
            visibility: Visibility::Team,
        })
        .await
        .unwrap();
    let resource = ResourceRef::new(ResourceKind::Project, project.id);

    let engine = engine(&db);

    // The membership and grant tables are gone: a would-be member is
    // denied, not crashed on and not silently granted.
    assert_eq!(
        engine
            .authorize(member, resource, PermissionTier::View)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::InsufficientPermission),
    );

    // Ownership and global admin still resolve.
    assert_eq!(
        engine
            .authorize(owner, resource, PermissionTier::Admin)
            .await
            .unwrap(),
        Decision::Allow,
    );
    assert_eq!(
        engine
            .authorize(admin, resource, PermissionTier::Admin)
            .await
            .unwrap(),
        Decision::Allow,
    );
}

#[tokio::test]
async fn degraded_task_table_reads_as_not_found() {
    let db = setup_partial_strict().await;
    let user = create_user(&db, "user", GlobalRole::User).await;
    let engine = engine(&db);

    let resource = ResourceRef::new(ResourceKind::Task, Uuid::new_v4());
    assert_eq!(
        engine
            .authorize(user, resource, PermissionTier::View)
            .await
            .unwrap(),
        Decision::Deny(DenyReason::NotFound),
    );
}

#[tokio::test]
async fn degraded_dashboard_returns_zeroed_summary() {
    let db = setup_partial_strict().await;
    let user = create_user(&db, "user", GlobalRole::User).await;

    let svc = DashboardService::new(SurrealDashboardRepository::new(db));
    let summary = svc.summary(user).await.unwrap();

    assert_eq!(summary, Default::default());
}

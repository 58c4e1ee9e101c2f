//! Tests for the per-variant authorization projections, in particular
//! the parent-chain inheritance for composite resource kinds.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use workgrid_core::access::{GlobalRole, ResourceKind, ResourceRef, Visibility};
use workgrid_core::models::comment::CreateComment;
use workgrid_core::models::module::CreateModule;
use workgrid_core::models::project::CreateProject;
use workgrid_core::models::task::CreateTask;
use workgrid_core::models::user::CreateUser;
use workgrid_core::repository::{
    AuthContextLookup, CommentRepository, ModuleRepository, ProjectRepository, TaskRepository,
    UserRepository,
};
use workgrid_db::repository::{
    SurrealCommentRepository, SurrealModuleRepository, SurrealProjectRepository,
    SurrealResourceDirectory, SurrealTaskRepository, SurrealUserRepository,
};

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    workgrid_db::run_migrations(&db).await.unwrap();
    db
}

async fn create_user(db: &Surreal<surrealdb::engine::local::Db>, name: &str) -> Uuid {
    SurrealUserRepository::new(db.clone())
        .create(CreateUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            global_role: GlobalRole::User,
            metadata: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn project_context_projection() {
    let db = setup().await;
    let owner = create_user(&db, "owner").await;
    let team_id = Uuid::new_v4();

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            name: "p".into(),
            description: String::new(),
            owner_id: owner,
            team_id: Some(team_id),
            visibility: Visibility::Team,
        })
        .await
        .unwrap();

    let directory = SurrealResourceDirectory::new(db);
    let ctx = directory
        .auth_context(ResourceRef::new(ResourceKind::Project, project.id))
        .await
        .unwrap();

    assert_eq!(ctx.owner_id, owner);
    assert_eq!(ctx.team_id, Some(team_id));
    assert_eq!(ctx.visibility, Some(Visibility::Team));
}

#[tokio::test]
async fn project_module_inherits_parent_linkage() {
    let db = setup().await;
    let owner = create_user(&db, "owner").await;
    let module_owner = create_user(&db, "module-owner").await;
    let team_id = Uuid::new_v4();

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            name: "p".into(),
            description: String::new(),
            owner_id: owner,
            team_id: Some(team_id),
            visibility: Visibility::Private,
        })
        .await
        .unwrap();

    // Module with no linkage of its own.
    let module = SurrealModuleRepository::new(db.clone())
        .create(CreateModule {
            name: "m".into(),
            description: String::new(),
            project_id: Some(project.id),
            owner_id: module_owner,
            team_id: None,
            visibility: None,
        })
        .await
        .unwrap();

    let directory = SurrealResourceDirectory::new(db);
    let ctx = directory
        .auth_context(ResourceRef::new(ResourceKind::ProjectModule, module.id))
        .await
        .unwrap();

    // Owner stays the module's own; team and visibility come from the
    // parent project.
    assert_eq!(ctx.owner_id, module_owner);
    assert_eq!(ctx.team_id, Some(team_id));
    assert_eq!(ctx.visibility, Some(Visibility::Private));
}

#[tokio::test]
async fn project_module_own_fields_win_over_parent() {
    let db = setup().await;
    let owner = create_user(&db, "owner").await;
    let own_team = Uuid::new_v4();
    let parent_team = Uuid::new_v4();

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            name: "p".into(),
            description: String::new(),
            owner_id: owner,
            team_id: Some(parent_team),
            visibility: Visibility::Private,
        })
        .await
        .unwrap();

    let module = SurrealModuleRepository::new(db.clone())
        .create(CreateModule {
            name: "m".into(),
            description: String::new(),
            project_id: Some(project.id),
            owner_id: owner,
            team_id: Some(own_team),
            visibility: Some(Visibility::Public),
        })
        .await
        .unwrap();

    let directory = SurrealResourceDirectory::new(db);
    let ctx = directory
        .auth_context(ResourceRef::new(ResourceKind::ProjectModule, module.id))
        .await
        .unwrap();

    assert_eq!(ctx.team_id, Some(own_team));
    assert_eq!(ctx.visibility, Some(Visibility::Public));
}

#[tokio::test]
async fn standalone_module_keeps_null_visibility() {
    let db = setup().await;
    let owner = create_user(&db, "owner").await;

    let module = SurrealModuleRepository::new(db.clone())
        .create(CreateModule {
            name: "m".into(),
            description: String::new(),
            project_id: None,
            owner_id: owner,
            team_id: None,
            visibility: None,
        })
        .await
        .unwrap();

    let directory = SurrealResourceDirectory::new(db);
    let ctx = directory
        .auth_context(ResourceRef::new(ResourceKind::StandaloneModule, module.id))
        .await
        .unwrap();

    assert_eq!(ctx.owner_id, owner);
    assert_eq!(ctx.team_id, None);
    // Absent visibility stays absent in the projection; the engine
    // applies the read-only Public fallback.
    assert_eq!(ctx.visibility, None);
}

#[tokio::test]
async fn kind_mismatch_resolves_to_not_found() {
    let db = setup().await;
    let owner = create_user(&db, "owner").await;

    let module = SurrealModuleRepository::new(db.clone())
        .create(CreateModule {
            name: "m".into(),
            description: String::new(),
            project_id: None,
            owner_id: owner,
            team_id: None,
            visibility: None,
        })
        .await
        .unwrap();

    let directory = SurrealResourceDirectory::new(db);
    let err = directory
        .auth_context(ResourceRef::new(ResourceKind::ProjectModule, module.id))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn task_and_comment_chain_to_project() {
    let db = setup().await;
    let owner = create_user(&db, "owner").await;
    let task_owner = create_user(&db, "task-owner").await;
    let commenter = create_user(&db, "commenter").await;
    let team_id = Uuid::new_v4();

    let project = SurrealProjectRepository::new(db.clone())
        .create(CreateProject {
            name: "p".into(),
            description: String::new(),
            owner_id: owner,
            team_id: Some(team_id),
            visibility: Visibility::Team,
        })
        .await
        .unwrap();

    let task = SurrealTaskRepository::new(db.clone())
        .create(CreateTask {
            project_id: project.id,
            module_id: None,
            title: "t".into(),
            details: String::new(),
            owner_id: task_owner,
            assignee_id: None,
            due_at: None,
        })
        .await
        .unwrap();

    let comment = SurrealCommentRepository::new(db.clone())
        .create(CreateComment {
            task_id: task.id,
            author_id: commenter,
            body: "hi".into(),
        })
        .await
        .unwrap();

    let directory = SurrealResourceDirectory::new(db);

    let task_ctx = directory
        .auth_context(ResourceRef::new(ResourceKind::Task, task.id))
        .await
        .unwrap();
    assert_eq!(task_ctx.owner_id, task_owner);
    assert_eq!(task_ctx.team_id, Some(team_id));
    assert_eq!(task_ctx.visibility, Some(Visibility::Team));

    let comment_ctx = directory
        .auth_context(ResourceRef::new(ResourceKind::Comment, comment.id))
        .await
        .unwrap();
    assert_eq!(comment_ctx.owner_id, commenter);
    assert_eq!(comment_ctx.team_id, Some(team_id));
    assert_eq!(comment_ctx.visibility, Some(Visibility::Team));
}

#[tokio::test]
async fn missing_resource_is_not_found() {
    let db = setup().await;
    let directory = SurrealResourceDirectory::new(db);

    for kind in [
        ResourceKind::Project,
        ResourceKind::ProjectModule,
        ResourceKind::StandaloneModule,
        ResourceKind::Task,
        ResourceKind::Comment,
    ] {
        let err = directory
            .auth_context(ResourceRef::new(kind, Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(err.is_not_found(), "{kind:?} should be not found");
    }
}

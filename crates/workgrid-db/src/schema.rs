//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, Deserialize)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD global_role ON TABLE user TYPE string \
    ASSERT $value IN ['Admin', 'User', 'Viewer'];
DEFINE FIELD status ON TABLE user TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD metadata ON TABLE user TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Teams
-- =======================================================================
DEFINE TABLE team SCHEMAFULL;
DEFINE FIELD name ON TABLE team TYPE string;
DEFINE FIELD description ON TABLE team TYPE string;
DEFINE FIELD leader_id ON TABLE team TYPE string;
DEFINE FIELD created_at ON TABLE team TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE team TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Projects
-- =======================================================================
DEFINE TABLE project SCHEMAFULL;
DEFINE FIELD name ON TABLE project TYPE string;
DEFINE FIELD description ON TABLE project TYPE string;
DEFINE FIELD owner_id ON TABLE project TYPE string;
DEFINE FIELD team_id ON TABLE project TYPE option<string>;
DEFINE FIELD visibility ON TABLE project TYPE string \
    ASSERT $value IN ['Private', 'Team', 'Public'];
DEFINE FIELD status ON TABLE project TYPE string \
    ASSERT $value IN ['Active', 'Archived'];
DEFINE FIELD created_at ON TABLE project TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE project TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Modules (project-scoped when project_id is set, standalone otherwise)
-- =======================================================================
DEFINE TABLE module SCHEMAFULL;
DEFINE FIELD name ON TABLE module TYPE string;
DEFINE FIELD description ON TABLE module TYPE string;
DEFINE FIELD project_id ON TABLE module TYPE option<string>;
DEFINE FIELD owner_id ON TABLE module TYPE string;
DEFINE FIELD team_id ON TABLE module TYPE option<string>;
DEFINE FIELD visibility ON TABLE module TYPE option<string>;
DEFINE FIELD created_at ON TABLE module TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE module TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Tasks
-- =======================================================================
DEFINE TABLE task SCHEMAFULL;
DEFINE FIELD project_id ON TABLE task TYPE string;
DEFINE FIELD module_id ON TABLE task TYPE option<string>;
DEFINE FIELD title ON TABLE task TYPE string;
DEFINE FIELD details ON TABLE task TYPE string;
DEFINE FIELD owner_id ON TABLE task TYPE string;
DEFINE FIELD assignee_id ON TABLE task TYPE option<string>;
DEFINE FIELD status ON TABLE task TYPE string \
    ASSERT $value IN ['Open', 'InProgress', 'Done'];
DEFINE FIELD due_at ON TABLE task TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE task TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_task_project ON TABLE task COLUMNS project_id;

-- =======================================================================
-- Comments
-- =======================================================================
DEFINE TABLE comment SCHEMAFULL;
DEFINE FIELD task_id ON TABLE comment TYPE string;
DEFINE FIELD author_id ON TABLE comment TYPE string;
DEFINE FIELD body ON TABLE comment TYPE string;
DEFINE FIELD created_at ON TABLE comment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE comment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_comment_task ON TABLE comment COLUMNS task_id;

-- =======================================================================
-- Explicit permission grants
-- =======================================================================
DEFINE TABLE permission_grant SCHEMAFULL;
DEFINE FIELD resource_kind ON TABLE permission_grant TYPE string \
    ASSERT $value IN ['Project', 'ProjectModule', 'StandaloneModule', \
    'Task', 'Comment'];
DEFINE FIELD resource_id ON TABLE permission_grant TYPE string;
DEFINE FIELD user_id ON TABLE permission_grant TYPE string;
DEFINE FIELD tier ON TABLE permission_grant TYPE string \
    ASSERT $value IN ['View', 'Edit', 'Admin'];
DEFINE FIELD granted_by ON TABLE permission_grant TYPE string;
DEFINE FIELD granted_at ON TABLE permission_grant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_grant_unique ON TABLE permission_grant \
    COLUMNS resource_kind, resource_id, user_id UNIQUE;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- User -> Team membership, carrying the membership role
DEFINE TABLE member_of TYPE RELATION SCHEMAFULL;
DEFINE FIELD role ON TABLE member_of TYPE string \
    ASSERT $value IN ['Leader', 'Member', 'Viewer'];
DEFINE FIELD added_at ON TABLE member_of TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_member_unique ON TABLE member_of \
    COLUMNS in, out UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

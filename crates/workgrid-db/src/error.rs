//! Database-specific error types and conversions.
//!
//! Schema-absence classification happens here, and only here, by
//! matching the driver's typed error variants. Message contents are
//! never inspected: a missing table is recognized by its error kind,
//! not by what its description happens to say.

use workgrid_core::error::WorkgridError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(surrealdb::Error),

    /// A table or function the query referenced is not defined.
    #[error("Missing schema element: {element}")]
    SchemaMissing { element: String },

    /// Connection-phase or transport failure.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    /// A stored value failed to decode into its domain type.
    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<surrealdb::Error> for DbError {
    fn from(err: surrealdb::Error) -> Self {
        match &err {
            surrealdb::Error::Db(db) => match db {
                surrealdb::error::Db::TbNotFound { .. }
                | surrealdb::error::Db::FcNotFound { .. } => DbError::SchemaMissing {
                    element: db.to_string(),
                },
                _ => DbError::Surreal(err),
            },
            // Remote transports flatten server-side statement errors into
            // opaque API errors; those stay fatal rather than being
            // sniffed for schema conditions.
            surrealdb::Error::Api(_) => DbError::Surreal(err),
        }
    }
}

impl From<DbError> for WorkgridError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => WorkgridError::NotFound { entity, id },
            DbError::SchemaMissing { element } => WorkgridError::SchemaMissing { element },
            DbError::Unavailable(msg) => WorkgridError::Unavailable(msg),
            other => WorkgridError::Database(other.to_string()),
        }
    }
}

//! Error types for the Workgrid system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkgridError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// Denied actions render the same generic message regardless of the
    /// clause that failed; `reason` is for logs, not for clients.
    #[error("Not authorized")]
    PermissionDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A table or function the query expected is absent from the schema.
    /// Produced by the store layer from the driver's typed error variants.
    #[error("Schema element missing: {element}")]
    SchemaMissing { element: String },

    /// Store connectivity failure or timeout. Never converted into a
    /// permission decision without being surfaced.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkgridError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkgridError::NotFound { .. })
    }

    pub fn is_schema_missing(&self) -> bool {
        matches!(self, WorkgridError::SchemaMissing { .. })
    }
}

pub type WorkgridResult<T> = Result<T, WorkgridError>;

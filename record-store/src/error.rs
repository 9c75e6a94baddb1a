use audit_engine::AuditError;
use natural_order::OrderingError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Change logging failed: {0}")]
    Audit(#[from] AuditError),

    #[error("Invalid natural ordering key: {0}")]
    Ordering(#[from] OrderingError),

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    #[error("Record already exists: {0}")]
    Conflict(Uuid),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    /// The changed object could not be captured as a snapshot.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),

    /// The audit store rejected or failed the append.
    #[error("Audit store write failed: {0}")]
    Persistence(String),

    #[error("Audit configuration error: {0}")]
    Configuration(String),
}

impl From<sqlx::Error> for AuditError {
    fn from(err: sqlx::Error) -> Self {
        AuditError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        AuditError::Serialization(err.to_string())
    }
}

impl From<figment::Error> for AuditError {
    fn from(err: figment::Error) -> Self {
        AuditError::Configuration(err.to_string())
    }
}

pub type AuditResult<T> = std::result::Result<T, AuditError>;

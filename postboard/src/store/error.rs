use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::debug;

use super::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("database unavailable: {0}")]
    Connectivity(String),
    #[error("database error: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        debug!(error = %err, "database operation failed");

        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                return StoreError::Validation(ValidationErrors::unique_violation(&detail));
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                return StoreError::Constraint(detail);
            }
            _ => {}
        }

        match err {
            DbErr::Conn(_) | DbErr::ConnectionAcquire { .. } => {
                StoreError::Connectivity(err.to_string())
            }
            DbErr::RecordNotFound(detail) => StoreError::NotFound(detail),
            DbErr::RecordNotUpdated => StoreError::NotFound(String::from("record not updated")),
            other => StoreError::Query(other.to_string()),
        }
    }
}

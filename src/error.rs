use crate::models::ExecutionStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    #[error("Backup is disabled: {0}")]
    BackupDisabled(String),

    #[error("Execution not found: {0}")]
    ExecutionNotFound(String),

    #[error("Execution '{id}' conflict: expected {expected}, found {actual}")]
    Conflict {
        id: String,
        expected: ExecutionStatus,
        actual: ExecutionStatus,
    },

    #[error("Dispatch rejected: {0}")]
    DispatchRejected(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

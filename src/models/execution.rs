use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One concrete run of a backup definition.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct ExecutionRecord {
    pub id: String,
    pub backup_name: String,
    pub tag: Option<String>,
    pub status: ExecutionStatus,
    pub detail: Option<String>,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ExecutionRecord {
    pub fn scheduled(id: String, backup_name: &str, tag: Option<String>, now: i64) -> Self {
        Self {
            id,
            backup_name: backup_name.to_string(),
            tag,
            status: ExecutionStatus::Scheduled,
            detail: None,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExecutionStatus {
    Scheduled = 0,
    Running = 1,
    Success = 2,
    Error = 3,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Error => "Error",
        }
    }

    /// Forward-only: Scheduled may skip Running, terminal states never move.
    pub fn can_transition_to(&self, next: ExecutionStatus) -> bool {
        match self {
            Self::Scheduled => matches!(next, Self::Running | Self::Success | Self::Error),
            Self::Running => matches!(next, Self::Success | Self::Error),
            Self::Success | Self::Error => false,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(Self::Scheduled),
            "Running" => Ok(Self::Running),
            "Success" => Ok(Self::Success),
            "Error" => Ok(Self::Error),
            other => Err(AppError::InvalidArgument(format!(
                "unknown status '{}'",
                other
            ))),
        }
    }
}

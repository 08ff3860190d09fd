use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct BackupDefinition {
    pub name: String,
    pub command: String,
    /// JSON array of command arguments.
    pub args: Option<String>,
    pub enabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl BackupDefinition {
    pub fn parsed_args(&self) -> Result<Vec<String>> {
        let Some(raw) = self.args.as_deref() else {
            return Ok(Vec::new());
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(trimmed).map_err(|e| {
            AppError::Execution(format!("Invalid args for backup '{}': {}", self.name, e))
        })
    }
}

use crate::error::{AppError, Result};
use crate::models::BackupDefinition;
use crate::repository::DbPool;
use chrono::Utc;

#[derive(Clone)]
pub struct BackupRepository {
    pool: DbPool,
}

impl BackupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<BackupDefinition>> {
        let backups = sqlx::query_as::<_, BackupDefinition>(
            r#"
            SELECT name, command, args, enabled, created_at, updated_at
            FROM backups
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(backups)
    }

    pub async fn get(&self, name: &str) -> Result<BackupDefinition> {
        let backup = sqlx::query_as::<_, BackupDefinition>(
            r#"
            SELECT name, command, args, enabled, created_at, updated_at
            FROM backups
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::BackupNotFound(name.to_string()))?;

        Ok(backup)
    }

    /// Insert or replace a definition, keeping its original `created_at`.
    pub async fn upsert(
        &self,
        name: &str,
        command: &str,
        args: &[String],
        enabled: bool,
    ) -> Result<BackupDefinition> {
        if name.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "backup name cannot be empty".to_string(),
            ));
        }
        let args_json = if args.is_empty() {
            None
        } else {
            Some(serde_json::to_string(args).map_err(|e| {
                AppError::InvalidArgument(format!("Failed to serialize args: {}", e))
            })?)
        };
        let now = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO backups (name, command, args, enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                command = excluded.command,
                args = excluded.args,
                enabled = excluded.enabled,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(name)
        .bind(command)
        .bind(args_json)
        .bind(enabled)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(name).await
    }
}

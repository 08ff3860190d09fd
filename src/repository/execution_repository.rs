use crate::error::{AppError, Result};
use crate::models::{ExecutionRecord, ExecutionStatus};
use crate::repository::DbPool;
use chrono::Utc;

#[derive(Clone)]
pub struct ExecutionRepository {
    pool: DbPool,
}

impl ExecutionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, record: &ExecutionRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO executions (id, backup_name, tag, status, detail, deleted, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.backup_name)
        .bind(&record.tag)
        .bind(record.status as i32)
        .bind(&record.detail)
        .bind(record.deleted)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                let existing = self.get(&record.id).await?;
                Err(AppError::Conflict {
                    id: record.id.clone(),
                    expected: record.status,
                    actual: existing.status,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, id: &str) -> Result<ExecutionRecord> {
        let record =
            sqlx::query_as::<_, ExecutionRecord>("SELECT * FROM executions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::ExecutionNotFound(id.to_string()))?;

        Ok(record)
    }

    pub async fn list_by_backup(&self, backup_name: &str) -> Result<Vec<ExecutionRecord>> {
        let records = sqlx::query_as::<_, ExecutionRecord>(
            "SELECT * FROM executions WHERE backup_name = ? ORDER BY created_at DESC, id ASC",
        )
        .bind(backup_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Compare-and-set on the stored status. Fails with `Conflict` when the
    /// record is no longer in `expected` or the move is not a legal transition.
    pub async fn update_status(
        &self,
        id: &str,
        expected: ExecutionStatus,
        next: ExecutionStatus,
        detail: Option<String>,
    ) -> Result<ExecutionRecord> {
        if !expected.can_transition_to(next) {
            return Err(AppError::Conflict {
                id: id.to_string(),
                expected,
                actual: self.get(id).await?.status,
            });
        }

        let updated = sqlx::query(
            r#"
            UPDATE executions
            SET status = ?, detail = ?, updated_at = MAX(?, updated_at + 1)
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(next as i32)
        .bind(detail)
        .bind(Utc::now().timestamp_millis())
        .bind(id)
        .bind(expected as i32)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let record = self.get(id).await?;
        if updated == 0 {
            return Err(AppError::Conflict {
                id: id.to_string(),
                expected,
                actual: record.status,
            });
        }

        Ok(record)
    }

    /// Retention hook; the record stays queryable with `include_deleted`.
    pub async fn mark_deleted(&self, id: &str) -> Result<()> {
        let updated = sqlx::query("UPDATE executions SET deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(AppError::ExecutionNotFound(id.to_string()));
        }
        Ok(())
    }
}

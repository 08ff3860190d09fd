use crate::error::{AppError, Result};
use crate::executor::WorkItem;
use crate::models::ExecutionRecord;
use crate::repository::{BackupRepository, ExecutionRepository};
use crate::services::query::ExecutionFilter;
use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};

#[derive(Clone)]
pub struct ExecutionService {
    exec_repo: ExecutionRepository,
    backup_repo: BackupRepository,
    dispatch: mpsc::Sender<WorkItem>,
}

impl ExecutionService {
    pub fn new(
        exec_repo: ExecutionRepository,
        backup_repo: BackupRepository,
        dispatch: mpsc::Sender<WorkItem>,
    ) -> Self {
        Self {
            exec_repo,
            backup_repo,
            dispatch,
        }
    }

    /// Materialized executions of `backup_name`, newest first. An unknown
    /// name yields an empty list.
    pub async fn list_materialized(
        &self,
        backup_name: &str,
        limit: usize,
        tag: &str,
        status: &str,
        include_deleted: bool,
    ) -> Result<Vec<ExecutionRecord>> {
        Self::require_name(backup_name)?;
        let filter = ExecutionFilter::parse(limit, tag, status, include_deleted)?;

        let records = self.exec_repo.list_by_backup(backup_name).await?;
        Ok(filter.apply(records))
    }

    /// Schedules a new run and returns its work id without waiting for it.
    ///
    /// A queue slot is reserved before the record is written, so either the
    /// record exists and the executor received it, or neither happened.
    pub async fn trigger(&self, backup_name: &str, tag: Option<String>) -> Result<String> {
        Self::require_name(backup_name)?;

        let backup = self.backup_repo.get(backup_name).await?;
        if !backup.enabled {
            return Err(AppError::BackupDisabled(backup_name.to_string()));
        }

        let permit = self.dispatch.try_reserve().map_err(|e| match e {
            TrySendError::Full(()) => {
                AppError::DispatchRejected("executor queue is full".to_string())
            }
            TrySendError::Closed(()) => {
                AppError::DispatchRejected("executor queue is closed".to_string())
            }
        })?;

        let work_id = uuid::Uuid::new_v4().to_string();
        let tag = tag.filter(|t| !t.is_empty());
        let record = ExecutionRecord::scheduled(
            work_id.clone(),
            backup_name,
            tag,
            Utc::now().timestamp_millis(),
        );
        self.exec_repo.insert(&record).await?;

        permit.send(WorkItem {
            work_id: work_id.clone(),
            backup,
        });
        tracing::info!("Backup '{}' scheduled with work id {}", backup_name, work_id);

        Ok(work_id)
    }

    fn require_name(backup_name: &str) -> Result<()> {
        if backup_name.is_empty() {
            return Err(AppError::InvalidArgument(
                "backup name is required".to_string(),
            ));
        }
        Ok(())
    }
}

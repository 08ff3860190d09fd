use crate::error::{AppError, Result};
use crate::executor::ExecutionOutcome;
use crate::models::{ExecutionRecord, ExecutionStatus};
use crate::repository::ExecutionRepository;

/// The only writer of status transitions after a record is scheduled.
#[derive(Clone)]
pub struct LifecycleUpdater {
    exec_repo: ExecutionRepository,
}

impl LifecycleUpdater {
    pub fn new(exec_repo: ExecutionRepository) -> Self {
        Self { exec_repo }
    }

    pub async fn transition(
        &self,
        id: &str,
        expected: ExecutionStatus,
        next: ExecutionStatus,
        detail: Option<String>,
    ) -> Result<ExecutionRecord> {
        match self
            .exec_repo
            .update_status(id, expected, next, detail)
            .await
        {
            Ok(record) => {
                tracing::info!("Execution {} moved {} -> {}", id, expected, next);
                Ok(record)
            }
            Err(err @ AppError::Conflict { .. }) => {
                tracing::warn!("Rejected transition for execution {}: {}", id, err);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn mark_running(&self, id: &str) -> Result<ExecutionRecord> {
        self.transition(id, ExecutionStatus::Scheduled, ExecutionStatus::Running, None)
            .await
    }

    pub async fn finish(
        &self,
        id: &str,
        from: ExecutionStatus,
        outcome: ExecutionOutcome,
    ) -> Result<ExecutionRecord> {
        match outcome {
            ExecutionOutcome::Success => {
                self.transition(id, from, ExecutionStatus::Success, None).await
            }
            ExecutionOutcome::Failed { detail } => {
                self.transition(id, from, ExecutionStatus::Error, Some(detail))
                    .await
            }
        }
    }
}

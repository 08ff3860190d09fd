use super::{BackupExecutor, ExecutionOutcome, WorkItem};
use crate::error::{AppError, Result};
use crate::models::ExecutionStatus;
use crate::services::LifecycleUpdater;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};

/// Upper bound on concurrently running backups.
pub const MAX_WORKERS: u32 = 1024;

const STORE_RETRY_ATTEMPTS: u32 = 4;
const STORE_RETRY_BASE_DELAY: Duration = Duration::from_millis(25);

/// Drains the dispatch queue, running at most `workers` executions at once.
/// Returns after the queue is closed and in-flight executions have finished.
pub async fn run_worker_pool<E: BackupExecutor>(
    mut queue: mpsc::Receiver<WorkItem>,
    executor: Arc<E>,
    updater: LifecycleUpdater,
    workers: usize,
) {
    let workers = u32::try_from(workers)
        .unwrap_or(MAX_WORKERS)
        .clamp(1, MAX_WORKERS);
    let limiter = Arc::new(Semaphore::new(workers as usize));

    while let Some(work) = queue.recv().await {
        let Ok(permit) = limiter.clone().acquire_owned().await else {
            break;
        };
        let executor = executor.clone();
        let updater = updater.clone();

        tokio::spawn(async move {
            run_one(executor.as_ref(), &updater, work).await;
            drop(permit);
        });
    }

    tracing::info!("Dispatch queue closed, waiting for running backups");
    if let Err(e) = limiter.acquire_many(workers).await {
        tracing::warn!("Stopped waiting for running backups: {}", e);
    }
}

/// Every accepted work item ends in a terminal state unless another writer
/// already moved its record.
async fn run_one<E: BackupExecutor>(executor: &E, updater: &LifecycleUpdater, work: WorkItem) {
    let id = work.work_id.as_str();

    match retry_unavailable(|| updater.mark_running(id)).await {
        Ok(_) => {}
        Err(e @ AppError::Conflict { .. }) => {
            tracing::warn!("Execution {} no longer scheduled, skipping: {}", id, e);
            return;
        }
        Err(e) => {
            tracing::error!("Cannot start execution {}: {}", id, e);
            let outcome = ExecutionOutcome::Failed {
                detail: format!("execution could not start: {}", e),
            };
            finish_or_log(updater, id, ExecutionStatus::Scheduled, outcome).await;
            return;
        }
    }

    let outcome = match executor.execute(&work).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Backup '{}' ({}) failed: {}", work.backup_name(), id, e);
            ExecutionOutcome::Failed {
                detail: e.to_string(),
            }
        }
    };

    match retry_unavailable(|| updater.finish(id, ExecutionStatus::Running, outcome.clone())).await
    {
        Ok(_) | Err(AppError::Conflict { .. }) => {}
        Err(e) => {
            tracing::error!("Cannot record outcome of execution {}: {}", id, e);
            let fallback = ExecutionOutcome::Failed {
                detail: format!("outcome could not be recorded: {}", e),
            };
            finish_or_log(updater, id, ExecutionStatus::Running, fallback).await;
        }
    }
}

async fn finish_or_log(
    updater: &LifecycleUpdater,
    id: &str,
    from: ExecutionStatus,
    outcome: ExecutionOutcome,
) {
    if let Err(e) = retry_unavailable(|| updater.finish(id, from, outcome.clone())).await {
        tracing::error!("Execution {} left in {}: {}", id, from, e);
    }
}

/// Retries store operations that failed with `Unavailable`, doubling the
/// delay between attempts.
async fn retry_unavailable<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = STORE_RETRY_BASE_DELAY;
    let mut attempt = 1;
    loop {
        match op().await {
            Err(AppError::Unavailable(e)) if attempt < STORE_RETRY_ATTEMPTS => {
                tracing::warn!("Store unavailable (attempt {}): {}", attempt, e);
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            other => return other,
        }
    }
}

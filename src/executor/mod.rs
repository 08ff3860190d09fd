pub mod command_executor;
pub mod worker;

pub use command_executor::CommandExecutor;
pub use worker::run_worker_pool;

use crate::error::Result;
use crate::models::BackupDefinition;
use std::future::Future;

/// A single `StartExecution(work_id, backup_name)` handoff.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub work_id: String,
    pub backup: BackupDefinition,
}

impl WorkItem {
    pub fn backup_name(&self) -> &str {
        &self.backup.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success,
    Failed { detail: String },
}

pub trait BackupExecutor: Send + Sync + 'static {
    fn execute(&self, work: &WorkItem) -> impl Future<Output = Result<ExecutionOutcome>> + Send;
}

pub mod backup;
pub mod execution;

pub use backup::BackupDefinition;
pub use execution::{ExecutionRecord, ExecutionStatus};

pub mod execution_service;
pub mod lifecycle;
pub mod query;

pub use execution_service::ExecutionService;
pub use lifecycle::LifecycleUpdater;

pub mod backup_repository;
pub mod connection;
pub mod execution_repository;

pub use backup_repository::BackupRepository;
pub use connection::establish_connection;
pub use execution_repository::ExecutionRepository;

pub type DbPool = sqlx::SqlitePool;

use crate::repository::DbPool;
use anyhow::Result;
use sqlx::Row;

pub async fn establish_connection(database_url: &str) -> Result<DbPool> {
    // Ensure the database URL has the correct format
    let db_url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{}", database_url)
    };

    // Create connection with create_if_missing option
    let connection_string = format!("{}?mode=rwc", db_url);
    let pool = sqlx::SqlitePool::connect(&connection_string).await?;

    migrate(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory pool; every connection of a `:memory:` pool
/// would otherwise see its own empty database.
#[cfg(test)]
pub async fn in_memory_pool() -> Result<DbPool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS backups (
            name TEXT PRIMARY KEY,
            command TEXT NOT NULL,
            args TEXT,
            enabled BOOLEAN NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS executions (
            id TEXT PRIMARY KEY,
            backup_name TEXT NOT NULL,
            tag TEXT,
            status INTEGER NOT NULL,
            detail TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_executions_backup_name ON executions(backup_name);
        "#,
    )
    .execute(pool)
    .await?;

    ensure_execution_deleted_column(pool).await?;

    Ok(())
}

async fn ensure_execution_deleted_column(pool: &DbPool) -> Result<()> {
    let columns = sqlx::query("PRAGMA table_info(executions)")
        .fetch_all(pool)
        .await?;
    let has_column = columns
        .iter()
        .any(|row| row.get::<String, _>("name") == "deleted");
    if !has_column {
        sqlx::query("ALTER TABLE executions ADD COLUMN deleted BOOLEAN NOT NULL DEFAULT 0")
            .execute(pool)
            .await?;
    }
    Ok(())
}

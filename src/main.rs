mod api;
mod config;
mod error;
mod executor;
mod models;
mod paths;
mod repository;
mod services;

use crate::api::observer::Outcome;
use crate::api::{InvocationCounter, create_router};
use crate::config::Config;
use crate::executor::{CommandExecutor, run_worker_pool};
use crate::repository::{BackupRepository, ExecutionRepository, establish_connection};
use crate::services::{ExecutionService, LifecycleUpdater};
use anyhow::Context;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn run_server<F>(shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schelly=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting schelly with config: {:?}", config);

    if let Some(path) = config.database_url.strip_prefix("sqlite:") {
        let path = std::path::Path::new(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Establish database connection
    let db_pool = establish_connection(&config.database_url).await?;
    tracing::info!("Database connected: {}", config.database_url);

    // Initialize repositories
    let backup_repo = BackupRepository::new(db_pool.clone());
    let execution_repo = ExecutionRepository::new(db_pool);

    for backup in &config.backups {
        backup_repo
            .upsert(&backup.name, &backup.command, &backup.args, backup.enabled)
            .await
            .with_context(|| format!("Failed to register backup '{}'", backup.name))?;
    }
    tracing::info!("Loaded {} backup definitions", backup_repo.list().await?.len());

    // Start the worker pool behind the dispatch queue
    let (dispatch_tx, dispatch_rx) = mpsc::channel(config.queue_capacity);
    let executor = CommandExecutor::new(
        paths::work_dir()?,
        Duration::from_secs(config.command_timeout_secs),
    );
    let workers = tokio::spawn(run_worker_pool(
        dispatch_rx,
        Arc::new(executor),
        LifecycleUpdater::new(execution_repo.clone()),
        config.workers,
    ));

    // Initialize services
    let execution_service = ExecutionService::new(execution_repo, backup_repo, dispatch_tx);

    // Create router
    let counter = Arc::new(InvocationCounter::new());
    let app = create_router(execution_service, counter.clone());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let addr = addr.parse::<SocketAddr>()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    // The router owned the last dispatch sender; wait for running backups.
    workers.await?;
    tracing::info!(
        "Stopped after {} listings and {} triggers ({} failed calls)",
        counter.count("materialized", Outcome::Success),
        counter.count("trigger", Outcome::Success),
        counter.count("materialized", Outcome::Error) + counter.count("trigger", Outcome::Error)
    );

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run_server(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", err);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    })
    .await
}

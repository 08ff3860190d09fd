use super::handlers::{health, materialized};
use super::observer::InvocationObserver;
use crate::services::ExecutionService;
use axum::{
    Router,
    routing::get,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub execution_service: ExecutionService,
    pub observer: Arc<dyn InvocationObserver>,
}

pub fn create_router(
    execution_service: ExecutionService,
    observer: Arc<dyn InvocationObserver>,
) -> Router {
    let state = AppState {
        execution_service,
        observer,
    };

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Materialized backups
        .route(
            "/backup/{name}/materialized",
            get(materialized::list_materialized).post(materialized::trigger_backup),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

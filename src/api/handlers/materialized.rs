use crate::api::dto::execution::{
    ListMaterializedQuery, MaterializedResponse, TriggerRequest, TriggerResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::observer::Outcome;
use crate::api::routes::AppState;
use crate::error::{AppError, Result};
use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{BytesRejection, QueryRejection},
    },
    http::StatusCode,
};

const LIST_CONTEXT: &str = "Error getting materialized";
const TRIGGER_CONTEXT: &str = "Error triggering new backup";

pub async fn list_materialized(
    State(state): State<AppState>,
    Path(name): Path<String>,
    query: std::result::Result<Query<ListMaterializedQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<MaterializedResponse>>> {
    tracing::debug!("ListMaterialized name={}", name);

    let result = match query {
        Ok(Query(query)) => {
            state
                .execution_service
                .list_materialized(
                    &name,
                    query.limit,
                    &query.tag,
                    &query.status,
                    query.include_deleted,
                )
                .await
        }
        Err(rejection) => Err(AppError::InvalidArgument(rejection.body_text())),
    };

    match result {
        Ok(records) => {
            state.observer.observe("materialized", Outcome::Success);
            Ok(Json(
                records.into_iter().map(MaterializedResponse::from).collect(),
            ))
        }
        Err(e) => {
            state.observer.observe("materialized", Outcome::Error);
            Err(ApiError::new(LIST_CONTEXT, e))
        }
    }
}

/// The body is optional and read as JSON whatever its `Content-Type`, so a
/// tag sent without the header is still honored.
pub async fn trigger_backup(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> ApiResult<(StatusCode, Json<TriggerResponse>)> {
    tracing::debug!("TriggerBackup name={}", name);

    let result = match parse_trigger_body(body) {
        Ok(req) => state.execution_service.trigger(&name, req.tag).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(work_id) => {
            state.observer.observe("trigger", Outcome::Success);
            let response = TriggerResponse {
                message: format!("Backup creation scheduled. id={}", work_id),
                id: work_id,
            };
            Ok((StatusCode::ACCEPTED, Json(response)))
        }
        Err(e) => {
            state.observer.observe("trigger", Outcome::Error);
            Err(ApiError::new(TRIGGER_CONTEXT, e))
        }
    }
}

fn parse_trigger_body(body: std::result::Result<Bytes, BytesRejection>) -> Result<TriggerRequest> {
    let body = body.map_err(|rejection| AppError::InvalidArgument(rejection.body_text()))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TriggerRequest::default());
    }
    serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidArgument(format!("Invalid trigger body: {}", e)))
}

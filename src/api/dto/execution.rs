use crate::models::ExecutionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ListMaterializedQuery {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    pub tag: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub message: String,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaterializedResponse {
    pub id: String,
    pub backup_name: String,
    pub tag: Option<String>,
    pub status: String,
    pub detail: Option<String>,
    pub deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ExecutionRecord> for MaterializedResponse {
    fn from(record: ExecutionRecord) -> Self {
        Self {
            id: record.id,
            backup_name: record.backup_name,
            tag: record.tag,
            status: record.status.to_string(),
            detail: record.detail,
            deleted: record.deleted,
            created_at: to_rfc3339(record.created_at),
            updated_at: to_rfc3339(record.updated_at),
        }
    }
}

fn to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default()
}

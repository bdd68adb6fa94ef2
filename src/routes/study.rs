use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::operations::RecallRecord;
use crate::response::{json_error, AppError};
use crate::services::recall::{self, EvaluationOutcome, RecallError};
use crate::state::AppState;

const HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub topic: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecallRequest {
    pub topic: String,
    pub recall_text: String,
}

pub async fn upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err(AppError::validation("topic must not be empty"));
    }
    if req.content.trim().is_empty() {
        return Err(AppError::validation("content must not be empty"));
    }
    if req.content.len() > state.max_upload_bytes() {
        return Err(AppError::validation(format!(
            "content exceeds upload limit of {} bytes",
            state.max_upload_bytes()
        )));
    }

    recall::upload_material(state.db(), topic, &req.content)
        .await
        .map_err(|err| {
            error!(topic, error = %err, "upload failed");
            AppError::internal("storage failure")
        })?;

    Ok(Json(UploadResponse {
        topic: topic.to_string(),
    }))
}

pub async fn due(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    let topics = recall::due_topics(state.db()).await.map_err(|err| {
        error!(error = %err, "due listing failed");
        AppError::internal("storage failure")
    })?;
    Ok(Json(topics))
}

pub async fn recall(
    State(state): State<AppState>,
    Json(req): Json<RecallRequest>,
) -> Result<Json<EvaluationOutcome>, AppError> {
    recall::evaluate_recall(state.db(), state.oracle(), &req.topic, &req.recall_text)
        .await
        .map(Json)
        .map_err(|err| map_recall_error(&req.topic, err))
}

pub async fn history(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Json<Vec<RecallRecord>>, AppError> {
    let records = recall::topic_history(state.db(), &topic, HISTORY_LIMIT)
        .await
        .map_err(|err| {
            error!(topic, error = %err, "history listing failed");
            AppError::internal("storage failure")
        })?;
    Ok(Json(records))
}

fn map_recall_error(topic: &str, err: RecallError) -> AppError {
    match err {
        RecallError::TopicNotFound => AppError::not_found("no study material for topic"),
        RecallError::ScoringFailed(source) => {
            error!(topic, error = %source, "scoring oracle failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "SCORING_FAILED",
                "scoring oracle unavailable",
            )
        }
        RecallError::InvalidOracleResponse(source) => {
            error!(topic, error = %source, "oracle response rejected");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INVALID_ORACLE_RESPONSE",
                "scoring oracle returned an invalid response",
            )
        }
        RecallError::PersistenceFailed(source) => {
            error!(topic, error = %source, "recall persistence failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PERSISTENCE_FAILED",
                "storage failure",
            )
        }
    }
}

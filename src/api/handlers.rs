use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::{Recommendation, Thread};
use crate::services::query::normalize_query;

use super::AppState;

/// Response body for a completed search
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<Recommendation>,
    pub posts: Vec<Thread>,
}

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Answers a shopping query with ranked, evidence-backed recommendations.
///
/// The body is inspected by hand so that a missing or non-string `query`
/// comes back as a client error before any collaborator is called.
pub async fn search(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<Json<SearchResponse>> {
    let raw = body
        .get("query")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::InvalidInput("Invalid query format".to_string()))?;

    let query = normalize_query(raw)
        .ok_or_else(|| AppError::InvalidInput("Missing query".to_string()))?;

    tracing::info!(query = %query, "Incoming search");

    let outcome = state.pipeline.run(&query).await?;

    Ok(Json(SearchResponse {
        results: outcome.results,
        posts: outcome.threads,
    }))
}

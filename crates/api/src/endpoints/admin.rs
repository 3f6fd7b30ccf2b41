//! Admin/Moderation endpoints.
//!
//! Role checks live in the services behind the viewer context; these
//! handlers add no second policy layer.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use feedboard_common::AppResult;
use feedboard_core::{FeedbackStatistics, ModerationDecision};
use serde::Deserialize;

use super::feedback::FeedbackResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Moderation queue query.
#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    #[serde(default = "default_queue_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_queue_limit() -> u64 {
    50
}

/// Pending submissions awaiting review, oldest first.
async fn queue(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<QueueQuery>,
) -> AppResult<ApiResponse<Vec<FeedbackResponse>>> {
    let limit = query.limit.min(200);
    let items = state
        .feedback_service
        .moderation_queue(&auth.viewer(), limit, query.offset)
        .await?;

    Ok(ApiResponse::ok(items.into_iter().map(Into::into).collect()))
}

/// Moderate request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateRequest {
    pub feedback_id: String,
    /// `approved` or `rejected`.
    pub decision: String,
}

/// Apply a moderation decision to one submission.
async fn moderate(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ModerateRequest>,
) -> AppResult<ApiResponse<FeedbackResponse>> {
    let decision = ModerationDecision::parse(&req.decision)?;

    let item = state
        .feedback_service
        .moderate(&auth.viewer(), &req.feedback_id, decision)
        .await?;

    Ok(ApiResponse::ok(item.into()))
}

/// Download the approved feed as CSV.
async fn export_csv(auth: AuthUser, State(state): State<AppState>) -> AppResult<Response> {
    let csv = state.feedback_service.export_csv(&auth.viewer()).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"feedback_export.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// Sentiment totals over the approved feed.
async fn stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<FeedbackStatistics>> {
    let stats = state.feedback_service.statistics(&auth.viewer()).await?;

    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feedback/queue", get(queue))
        .route("/feedback/moderate", post(moderate))
        .route("/feedback/export.csv", get(export_csv))
        .route("/stats", get(stats))
}

//! Vote endpoints.

use std::collections::HashMap;

use axum::{Json, Router, extract::State, routing::post};
use feedboard_common::{AppError, AppResult};
use feedboard_core::{CastOutcome, VoteTally};
use feedboard_db::entities::vote::VoteKind;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Wire form of a vote direction.
///
/// Clients send either the strings `"upvote"`/`"downvote"` or the legacy
/// integer encodings `1`/`-1`. Everything else is rejected here; the
/// ledger itself only ever sees [`VoteKind`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum VoteKindParam {
    Named(String),
    Legacy(i64),
}

impl VoteKindParam {
    fn resolve(&self) -> AppResult<VoteKind> {
        match self {
            Self::Named(name) => match name.as_str() {
                "upvote" => Ok(VoteKind::Upvote),
                "downvote" => Ok(VoteKind::Downvote),
                other => Err(AppError::BadRequest(format!("Invalid vote kind: {other}"))),
            },
            Self::Legacy(1) => Ok(VoteKind::Upvote),
            Self::Legacy(-1) => Ok(VoteKind::Downvote),
            Self::Legacy(other) => Err(AppError::BadRequest(format!("Invalid vote kind: {other}"))),
        }
    }
}

/// Cast vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub feedback_id: String,
    pub kind: VoteKindParam,
}

/// Cast or change a vote on a feedback item.
async fn cast(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<CastOutcome>> {
    let kind = req.kind.resolve()?;

    let outcome = state
        .vote_service
        .cast(&user.id, &req.feedback_id, kind)
        .await?;

    Ok(ApiResponse::ok(outcome))
}

/// Retract vote request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetractVoteRequest {
    pub feedback_id: String,
}

/// Withdraw the caller's vote from a feedback item.
async fn retract(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RetractVoteRequest>,
) -> AppResult<ApiResponse<VoteTally>> {
    let tally = state
        .vote_service
        .retract(&user.id, &req.feedback_id)
        .await?;

    Ok(ApiResponse::ok(tally))
}

/// Show votes request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowVotesRequest {
    pub feedback_id: String,
}

/// Vote totals on one feedback item, with the caller's own vote if any.
async fn show(
    maybe: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowVotesRequest>,
) -> AppResult<ApiResponse<VoteTally>> {
    let tally = state
        .vote_service
        .tally(&maybe.viewer(), &req.feedback_id)
        .await?;

    Ok(ApiResponse::ok(tally))
}

/// Bulk votes request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkVotesRequest {
    pub feedback_ids: Vec<String>,
}

/// Vote totals for many feedback items at once.
async fn bulk(
    maybe: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<BulkVotesRequest>,
) -> AppResult<ApiResponse<HashMap<String, VoteTally>>> {
    let tallies = state
        .vote_service
        .tally_bulk(&maybe.viewer(), &req.feedback_ids)
        .await?;

    Ok(ApiResponse::ok(tallies))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cast", post(cast))
        .route("/retract", post(retract))
        .route("/show", post(show))
        .route("/bulk", post(bulk))
}

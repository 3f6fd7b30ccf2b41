//! Feedback endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use feedboard_common::AppResult;
use feedboard_core::{
    FeedItem, FeedQuery, VoteTally, companies, companies::Company,
    feedback::SubmitFeedbackInput,
};
use feedboard_db::entities::feedback;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Feedback row as returned to clients.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub id: String,
    pub company_name: String,
    pub company_logo: String,
    pub comment: String,
    pub sentiment: feedback::Sentiment,
    pub status: feedback::FeedbackStatus,
    pub created_at: String,
}

impl From<feedback::Model> for FeedbackResponse {
    fn from(item: feedback::Model) -> Self {
        Self {
            id: item.id,
            company_name: item.company_name,
            company_logo: item.company_logo,
            comment: item.comment,
            sentiment: item.sentiment,
            status: item.status,
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

/// Create feedback request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub company_name: String,
    pub comment: String,
}

/// Submit feedback for moderation.
async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateFeedbackRequest>,
) -> AppResult<ApiResponse<FeedbackResponse>> {
    let input = SubmitFeedbackInput {
        company_name: req.company_name,
        comment: req.comment,
    };

    let item = state.feedback_service.submit(&auth.viewer(), input).await?;

    Ok(ApiResponse::ok(item.into()))
}

/// Show feedback request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowFeedbackRequest {
    pub feedback_id: String,
}

/// Single feedback item with its vote tally.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDetailResponse {
    #[serde(flatten)]
    pub feedback: FeedbackResponse,
    pub votes: VoteTally,
}

/// Fetch one feedback item, if the viewer may see it.
async fn show(
    maybe: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowFeedbackRequest>,
) -> AppResult<ApiResponse<FeedbackDetailResponse>> {
    let viewer = maybe.viewer();

    let item = state.feedback_service.get(&viewer, &req.feedback_id).await?;
    let votes = state.vote_service.tally(&viewer, &req.feedback_id).await?;

    Ok(ApiResponse::ok(FeedbackDetailResponse {
        feedback: item.into(),
        votes,
    }))
}

/// List the ranked public feed.
async fn feed(
    maybe: MaybeAuthUser,
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> AppResult<ApiResponse<Vec<FeedItem>>> {
    let items = state.feed_service.list(&maybe.viewer(), query).await?;

    Ok(ApiResponse::ok(items))
}

/// List the caller's own submissions, all statuses.
async fn mine(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<FeedbackResponse>>> {
    let items = state
        .feedback_service
        .list_by_author(&auth.viewer())
        .await?;

    Ok(ApiResponse::ok(items.into_iter().map(Into::into).collect()))
}

/// The company catalog backing the submission form.
async fn list_companies() -> ApiResponse<Vec<Company>> {
    ApiResponse::ok(companies::all().to_vec())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/show", post(show))
        .route("/feed", get(feed))
        .route("/mine", get(mine))
        .route("/companies", get(list_companies))
}

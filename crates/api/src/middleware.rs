//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use feedboard_core::{AccountService, FeedService, FeedbackService, VoteService};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub feedback_service: FeedbackService,
    pub vote_service: VoteService,
    pub feed_service: FeedService,
}

/// Resolve `Authorization: Bearer <token>` into a user model on the
/// request extensions. Invalid or missing tokens just leave the request
/// anonymous; handlers that need authentication reject via `AuthUser`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.account_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

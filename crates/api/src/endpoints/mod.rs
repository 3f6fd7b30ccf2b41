//! API endpoints.

mod admin;
mod auth;
mod feedback;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/feedback", feedback::router())
        .nest("/votes", votes::router())
        .nest("/admin", admin::router())
}

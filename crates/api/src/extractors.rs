//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use feedboard_common::AppError;
use feedboard_core::Viewer;
use feedboard_db::entities::user;

/// Authenticated user extractor. Rejects with 401 when the auth
/// middleware did not resolve a user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl AuthUser {
    /// Viewer context for the authenticated user.
    #[must_use]
    pub fn viewer(&self) -> Viewer {
        Viewer::from_user(&self.0)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware when a valid bearer token is present
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor for endpoints that serve both
/// anonymous and signed-in viewers.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl MaybeAuthUser {
    /// Viewer context: anonymous unless the middleware resolved a user.
    #[must_use]
    pub fn viewer(&self) -> Viewer {
        self.0.as_ref().map_or_else(Viewer::anonymous, Viewer::from_user)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use feedboard_common::AppResult;
use feedboard_core::account::RegisterInput;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Signup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Signup response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub id: String,
    pub username: String,
    pub token: String,
}

/// Create a new account.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SignupResponse>> {
    let input = RegisterInput {
        username: req.username,
        email: req.email,
        password: req.password,
    };

    let user = state.account_service.register(input).await?;

    Ok(ApiResponse::ok(SignupResponse {
        id: user.id.clone(),
        username: user.username,
        token: user.token.unwrap_or_default(),
    }))
}

/// Signin request. The identifier may be a username or an email address.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub identifier: String,
    pub password: String,
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub id: String,
    pub username: String,
    pub token: String,
    pub is_admin: bool,
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SigninResponse>> {
    let outcome = state
        .account_service
        .login(&req.identifier, &req.password)
        .await?;

    Ok(ApiResponse::ok(SigninResponse {
        id: outcome.user.id.clone(),
        username: outcome.user.username,
        is_admin: outcome.user.is_admin,
        token: outcome.token,
    }))
}

/// Signout response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignoutResponse {
    pub ok: bool,
}

/// Sign out by rotating the token, which invalidates the current one.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SignoutResponse>> {
    state.account_service.regenerate_token(&user.id).await?;

    Ok(ApiResponse::ok(SignoutResponse { ok: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}

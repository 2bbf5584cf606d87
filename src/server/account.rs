use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::audit;
use crate::auth::{hash_password, verify_password};
use crate::server::AppState;
use crate::server::dto::{LoginRequest, TokenResponse};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::{validate_password, validate_username};

pub async fn version() -> impl IntoResponse {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user_by_username(&req.username)?
        .ok_or_else(ApiError::unauthenticated)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::unauthenticated());
    }

    let token = state.sessions.issue(user.user_id)?;
    audit::user_action(user.user_id, "login", None);

    Ok::<_, ApiError>(Json(ApiResponse::success(TokenResponse { token })))
}

/// The first registered user becomes the admin.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    validate_username(&req.username)?;
    validate_password(&req.password)?;

    let is_admin = state.store.count_users()? == 0;
    let password_hash = hash_password(&req.password)?;
    let user = state
        .store
        .create_user(&req.username, &password_hash, is_admin)?;

    let token = state.sessions.issue(user.user_id)?;
    audit::user_action(user.user_id, "register", None);

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(TokenResponse { token })),
    ))
}

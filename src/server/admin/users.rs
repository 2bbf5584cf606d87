use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::audit;
use crate::auth::{RequireAdmin, hash_password};
use crate::server::AppState;
use crate::server::dto::{CreateUserRequest, PageParams, UpdateUserRequest};
use crate::server::response::{ApiError, ApiResponse, PAGE_SIZE, Paged, page_offset};
use crate::types::{validate_password, validate_username};

pub async fn list_users(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let offset = page_offset(params.page)?;
    let total = state.store.count_users()?;
    let items = state.store.list_users(offset, PAGE_SIZE)?;

    Ok::<_, ApiError>(Json(Paged {
        total,
        page: params.page,
        per_page: PAGE_SIZE,
        items,
    }))
}

pub async fn create_user(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    validate_username(&req.username)?;
    validate_password(&req.password)?;

    let password_hash = hash_password(&req.password)?;
    let user = state
        .store
        .create_user(&req.username, &password_hash, req.is_admin)?;

    audit::admin_action(
        auth.user.user_id,
        "user_create",
        Some(&json!({ "user": user })),
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn get_user(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user(user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

pub async fn update_user(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    let mut user = state
        .store
        .get_user(user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    // An admin cannot lock themselves out
    if auth.user.user_id == user.user_id && !req.is_admin {
        return Err(ApiError::bad_request(
            "Administrators cannot revoke their own admin access",
        ));
    }

    validate_username(&req.username)?;
    user.username = req.username;
    user.is_admin = req.is_admin;

    if let Some(password) = &req.password {
        validate_password(password)?;
        user.password_hash = hash_password(password)?;
    }

    state.store.update_user(&user)?;

    audit::admin_action(
        auth.user.user_id,
        "user_update",
        Some(&json!({ "user": user })),
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

pub async fn delete_user(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    if auth.user.user_id == user_id {
        return Err(ApiError::bad_request(
            "Administrators cannot delete themselves",
        ));
    }

    let user = state
        .store
        .get_user(user_id)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    state.store.delete_user(user_id)?;

    audit::admin_action(
        auth.user.user_id,
        "user_delete",
        Some(&json!({ "user": user })),
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

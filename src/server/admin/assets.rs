use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::audit;
use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::UploadParams;
use crate::server::response::{ApiError, ApiResponse};

/// Two-phase upload: the coordinator reserves an unconfirmed asset row,
/// writes the blob, then confirms the row.
pub async fn upload(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let field = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::bad_request("Malformed multipart body"))?
        .ok_or_else(|| ApiError::bad_request("Missing file field"))?;

    let declared_type = field
        .content_type()
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("File content type required"))?;

    let payload = field
        .bytes()
        .await
        .map_err(|_| ApiError::bad_request("Failed to read upload"))?;

    let asset = state
        .catalog
        .upload_asset(&params.ensure_type, &declared_type, &payload)
        .await?;

    audit::admin_action(
        auth.user.user_id,
        "asset_upload",
        Some(&json!({ "asset": asset })),
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(asset))))
}

pub async fn get_asset(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<i64>,
) -> impl IntoResponse {
    let asset = state
        .store
        .get_asset(asset_id)?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(asset)))
}

/// Assets are immutable; this always fails.
pub async fn delete_asset(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<i64>,
) -> impl IntoResponse {
    state.catalog.delete_asset(asset_id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

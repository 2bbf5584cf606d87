use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::audit;
use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::SongRequest;
use crate::server::response::{ApiError, ApiResponse};
use crate::types::SongFields;

pub async fn create_song(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SongRequest>,
) -> impl IntoResponse {
    let fields = SongFields::new(req.name, req.album_id, req.asset_id)?;
    let song = state.catalog.create_song(&fields)?;

    audit::admin_action(
        auth.user.user_id,
        "song_create",
        Some(&json!({ "song": song })),
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(song))))
}

pub async fn get_song(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(song_id): Path<i64>,
) -> impl IntoResponse {
    let song = state
        .store
        .get_song(song_id)?
        .ok_or_else(|| ApiError::not_found("Song not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(song)))
}

pub async fn update_song(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(song_id): Path<i64>,
    Json(req): Json<SongRequest>,
) -> impl IntoResponse {
    let fields = SongFields::new(req.name, req.album_id, req.asset_id)?;
    let song = state.catalog.update_song(song_id, &fields)?;

    audit::admin_action(
        auth.user.user_id,
        "song_update",
        Some(&json!({ "song": song })),
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(song)))
}

pub async fn delete_song(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(song_id): Path<i64>,
) -> impl IntoResponse {
    let song = state.catalog.delete_song(song_id)?;

    audit::admin_action(
        auth.user.user_id,
        "song_delete",
        Some(&json!({ "song": song })),
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(song)))
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::audit;
use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{AlbumRequest, PageParams};
use crate::server::response::{ApiError, ApiResponse, PAGE_SIZE, Paged, page_offset};
use crate::types::AlbumFields;

pub async fn create_album(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AlbumRequest>,
) -> impl IntoResponse {
    let fields = AlbumFields::new(req.name, req.artist_id, req.asset_id)?;
    let album = state.catalog.create_album(&fields)?;

    audit::admin_action(
        auth.user.user_id,
        "album_create",
        Some(&json!({ "album": album })),
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(album))))
}

pub async fn get_album(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(album_id): Path<i64>,
) -> impl IntoResponse {
    let album = state
        .store
        .get_album(album_id)?
        .ok_or_else(|| ApiError::not_found("Album not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(album)))
}

pub async fn update_album(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(album_id): Path<i64>,
    Json(req): Json<AlbumRequest>,
) -> impl IntoResponse {
    let fields = AlbumFields::new(req.name, req.artist_id, req.asset_id)?;
    let album = state.catalog.update_album(album_id, &fields)?;

    audit::admin_action(
        auth.user.user_id,
        "album_update",
        Some(&json!({ "album": album })),
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(album)))
}

pub async fn delete_album(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(album_id): Path<i64>,
) -> impl IntoResponse {
    let album = state.catalog.delete_album(album_id)?;

    audit::admin_action(
        auth.user.user_id,
        "album_delete",
        Some(&json!({ "album": album })),
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(album)))
}

pub async fn album_songs(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(album_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let offset = page_offset(params.page)?;
    let total = state.store.count_songs_by_album(album_id)?;
    let items = state.store.list_songs_by_album(album_id, offset, PAGE_SIZE)?;

    Ok::<_, ApiError>(Json(Paged {
        total,
        page: params.page,
        per_page: PAGE_SIZE,
        items,
    }))
}

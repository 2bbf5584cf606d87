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
use crate::server::dto::{ArtistRequest, PageParams};
use crate::server::response::{ApiError, ApiResponse, PAGE_SIZE, Paged, page_offset};
use crate::types::ArtistFields;

pub async fn list_artists(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let offset = page_offset(params.page)?;
    let total = state.store.count_artists()?;
    let items = state.store.list_artists(offset, PAGE_SIZE)?;

    Ok::<_, ApiError>(Json(Paged {
        total,
        page: params.page,
        per_page: PAGE_SIZE,
        items,
    }))
}

pub async fn create_artist(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ArtistRequest>,
) -> impl IntoResponse {
    let fields = ArtistFields::new(req.name, req.biography, req.asset_id)?;
    let artist = state.catalog.create_artist(&fields)?;

    audit::admin_action(
        auth.user.user_id,
        "artist_create",
        Some(&json!({ "artist": artist })),
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(artist))))
}

pub async fn get_artist(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> impl IntoResponse {
    let artist = state
        .store
        .get_artist(artist_id)?
        .ok_or_else(|| ApiError::not_found("Artist not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(artist)))
}

pub async fn update_artist(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
    Json(req): Json<ArtistRequest>,
) -> impl IntoResponse {
    let fields = ArtistFields::new(req.name, req.biography, req.asset_id)?;
    let artist = state.catalog.update_artist(artist_id, &fields)?;

    audit::admin_action(
        auth.user.user_id,
        "artist_update",
        Some(&json!({ "artist": artist })),
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(artist)))
}

pub async fn delete_artist(
    auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> impl IntoResponse {
    let artist = state.catalog.delete_artist(artist_id)?;

    audit::admin_action(
        auth.user.user_id,
        "artist_delete",
        Some(&json!({ "artist": artist })),
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(artist)))
}

pub async fn artist_albums(
    _auth: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let offset = page_offset(params.page)?;
    let total = state.store.count_albums_by_artist(artist_id)?;
    let items = state
        .store
        .list_albums_by_artist(artist_id, offset, PAGE_SIZE)?;

    Ok::<_, ApiError>(Json(Paged {
        total,
        page: params.page,
        per_page: PAGE_SIZE,
        items,
    }))
}

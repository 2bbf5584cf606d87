use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Json, Router};
use tokio_util::io::ReaderStream;

use crate::audit;
use crate::auth::RequireUser;
use crate::search::SearchHit;
use crate::server::AppState;
use crate::server::dto::{HomeResponse, PageParams, SearchParams};
use crate::server::response::{ApiError, ApiResponse, PAGE_SIZE, Paged, page_offset};

const HOME_COUNT: i64 = 10;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/me", get(me))
        .route("/artist/{artist_id}", get(artist))
        .route("/artist/{artist_id}/albums", get(artist_albums))
        .route("/album/{album_id}", get(album))
        .route("/album/{album_id}/songs", get(album_songs))
        .route("/song/{song_id}", get(song))
        .route("/asset/{asset_id}", get(asset))
        .route("/search", get(search))
        .route("/logout", delete(logout))
}

async fn home(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HomeResponse>>, ApiError> {
    let artists = state.store.latest_artists(HOME_COUNT)?;
    let albums = state.store.latest_albums(HOME_COUNT)?;
    let songs = state.store.latest_songs(HOME_COUNT)?;

    Ok(Json(ApiResponse::success(HomeResponse {
        artists,
        albums,
        songs,
    })))
}

async fn me(auth: RequireUser) -> impl IntoResponse {
    Json(ApiResponse::success(auth.user))
}

async fn artist(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(artist_id): Path<i64>,
) -> impl IntoResponse {
    let artist = state
        .store
        .get_artist(artist_id)?
        .ok_or_else(|| ApiError::not_found("Artist not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(artist)))
}

async fn artist_albums(
    _auth: RequireUser,
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

async fn album(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(album_id): Path<i64>,
) -> impl IntoResponse {
    let album = state
        .store
        .get_album(album_id)?
        .ok_or_else(|| ApiError::not_found("Album not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(album)))
}

async fn album_songs(
    _auth: RequireUser,
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

async fn song(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(song_id): Path<i64>,
) -> impl IntoResponse {
    let song = state
        .store
        .get_song(song_id)?
        .ok_or_else(|| ApiError::not_found("Song not found"))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(song)))
}

/// Streams an asset payload, honoring `Range` requests for scrubbing.
async fn asset(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let delivery = state.catalog.serve_asset(asset_id, range).await?;

    let status = if delivery.partial {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, delivery.content_type.as_str())
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_ENCODING, "identity")
        .header(header::CONTENT_LENGTH, delivery.content_length());

    if delivery.partial {
        builder = builder.header(header::CONTENT_RANGE, delivery.content_range());
    }

    let stream = ReaderStream::new(delivery.reader);
    builder
        .body(Body::from_stream(stream))
        .map_err(|_| ApiError::internal("Failed to build response"))
}

async fn search(
    _auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<ApiResponse<Vec<SearchHit>>> {
    Json(ApiResponse::success(state.catalog.search(&params.q)))
}

async fn logout(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.sessions.revoke(&auth.token);
    audit::user_action(auth.user.user_id, "logout", None);
    StatusCode::NO_CONTENT
}

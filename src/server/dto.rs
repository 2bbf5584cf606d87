use serde::{Deserialize, Serialize};

use crate::types::{Album, Artist, Song};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    /// Omit to keep the current password.
    #[serde(default)]
    pub password: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
pub struct ArtistRequest {
    pub name: String,
    pub biography: String,
    pub asset_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AlbumRequest {
    pub name: String,
    pub artist_id: i64,
    pub asset_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SongRequest {
    pub name: String,
    pub album_id: i64,
    pub asset_id: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Content type the caller expects the payload to have.
    pub ensure_type: String,
}

/// The newest additions across the catalog, for the landing view.
#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub songs: Vec<Song>,
}

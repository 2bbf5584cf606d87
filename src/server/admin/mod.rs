mod albums;
mod artists;
mod assets;
mod songs;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Users
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{user_id}", get(users::get_user))
        .route("/users/{user_id}", put(users::update_user))
        .route("/users/{user_id}", delete(users::delete_user))
        // Artists
        .route("/artists", get(artists::list_artists))
        .route("/artists", post(artists::create_artist))
        .route("/artists/{artist_id}", get(artists::get_artist))
        .route("/artists/{artist_id}", put(artists::update_artist))
        .route("/artists/{artist_id}", delete(artists::delete_artist))
        .route("/artists/{artist_id}/albums", get(artists::artist_albums))
        // Albums
        .route("/albums", post(albums::create_album))
        .route("/albums/{album_id}", get(albums::get_album))
        .route("/albums/{album_id}", put(albums::update_album))
        .route("/albums/{album_id}", delete(albums::delete_album))
        .route("/albums/{album_id}/songs", get(albums::album_songs))
        // Songs
        .route("/songs", post(songs::create_song))
        .route("/songs/{song_id}", get(songs::get_song))
        .route("/songs/{song_id}", put(songs::update_song))
        .route("/songs/{song_id}", delete(songs::delete_song))
        // Assets
        .route("/upload", post(assets::upload))
        .route("/assets/{asset_id}", get(assets::get_asset))
        .route("/assets/{asset_id}", delete(assets::delete_asset))
}

mod schema;
mod sqlite;

pub use sqlite::SqliteCatalog;

use crate::error::Result;
use crate::types::*;

/// CatalogStore defines the relational interface.
///
/// Rows reference each other through plain integer fields; referential
/// integrity is enforced by the coordinator before any write reaches the
/// store. Assets have no delete operation at all, which keeps issued
/// references and URLs stable for good.
pub trait CatalogStore: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, username: &str, password_hash: &str, is_admin: bool) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>>;
    fn count_users(&self) -> Result<i64>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, id: i64) -> Result<bool>;

    // Asset operations
    fn create_asset(&self, content_type: &str) -> Result<Asset>;
    fn get_asset(&self, id: i64) -> Result<Option<Asset>>;
    fn mark_asset_uploaded(&self, id: i64) -> Result<()>;

    // Artist operations
    fn create_artist(&self, fields: &ArtistFields) -> Result<Artist>;
    fn get_artist(&self, id: i64) -> Result<Option<Artist>>;
    fn list_artists(&self, offset: i64, limit: i64) -> Result<Vec<Artist>>;
    fn count_artists(&self) -> Result<i64>;
    fn latest_artists(&self, limit: i64) -> Result<Vec<Artist>>;
    fn update_artist(&self, id: i64, fields: &ArtistFields) -> Result<()>;
    /// Deletes the artist plus its albums and their songs in one transaction.
    fn delete_artist(&self, id: i64) -> Result<bool>;

    // Album operations
    fn create_album(&self, fields: &AlbumFields) -> Result<Album>;
    fn get_album(&self, id: i64) -> Result<Option<Album>>;
    fn list_albums_by_artist(&self, artist_id: i64, offset: i64, limit: i64) -> Result<Vec<Album>>;
    fn count_albums_by_artist(&self, artist_id: i64) -> Result<i64>;
    fn latest_albums(&self, limit: i64) -> Result<Vec<Album>>;
    fn update_album(&self, id: i64, fields: &AlbumFields) -> Result<()>;
    /// Deletes the album plus its songs in one transaction.
    fn delete_album(&self, id: i64) -> Result<bool>;
    fn list_album_ids_by_artist(&self, artist_id: i64) -> Result<Vec<i64>>;

    // Song operations
    fn create_song(&self, fields: &SongFields) -> Result<Song>;
    fn get_song(&self, id: i64) -> Result<Option<Song>>;
    fn list_songs_by_album(&self, album_id: i64, offset: i64, limit: i64) -> Result<Vec<Song>>;
    fn count_songs_by_album(&self, album_id: i64) -> Result<i64>;
    fn latest_songs(&self, limit: i64) -> Result<Vec<Song>>;
    fn update_song(&self, id: i64, fields: &SongFields) -> Result<()>;
    fn delete_song(&self, id: i64) -> Result<bool>;
    fn list_song_ids_by_album(&self, album_id: i64) -> Result<Vec<i64>>;
    fn list_song_ids_by_artist(&self, artist_id: i64) -> Result<Vec<i64>>;
}

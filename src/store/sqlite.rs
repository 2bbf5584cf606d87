use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::CatalogStore;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Maps UNIQUE violations to Conflict so callers can surface them as such.
fn map_unique(err: rusqlite::Error, what: &str) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(format!("{what} already exists"))
        }
        _ => Error::Database(err),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        is_admin: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        asset_id: row.get(0)?,
        content_type: row.get(1)?,
        is_uploaded: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn artist_from_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    Ok(Artist {
        artist_id: row.get(0)?,
        name: row.get(1)?,
        biography: row.get(2)?,
        asset_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        album_id: row.get(0)?,
        name: row.get(1)?,
        artist_id: row.get(2)?,
        asset_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        song_id: row.get(0)?,
        name: row.get(1)?,
        album_id: row.get(2)?,
        asset_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

impl CatalogStore for SqliteCatalog {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, username: &str, password_hash: &str, is_admin: bool) -> Result<User> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO users (username, password_hash, is_admin, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, password_hash, is_admin, format_datetime(&created_at)],
        )
        .map_err(|e| map_unique(e, "username"))?;

        Ok(User {
            user_id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
            created_at,
        })
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT user_id, username, password_hash, is_admin, created_at
             FROM users WHERE user_id = ?1",
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT user_id, username, password_hash, is_admin, created_at
             FROM users WHERE username = ?1",
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, username, password_hash, is_admin, created_at
             FROM users ORDER BY user_id LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![limit, offset], user_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_users(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE users SET username = ?1, password_hash = ?2, is_admin = ?3
                 WHERE user_id = ?4",
                params![user.username, user.password_hash, user.is_admin, user.user_id],
            )
            .map_err(|e| map_unique(e, "username"))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE user_id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Asset operations

    fn create_asset(&self, content_type: &str) -> Result<Asset> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO assets (content_type, is_uploaded, created_at) VALUES (?1, 0, ?2)",
            params![content_type, format_datetime(&created_at)],
        )?;

        Ok(Asset {
            asset_id: conn.last_insert_rowid(),
            content_type: content_type.to_string(),
            is_uploaded: false,
            created_at,
        })
    }

    fn get_asset(&self, id: i64) -> Result<Option<Asset>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT asset_id, content_type, is_uploaded, created_at
             FROM assets WHERE asset_id = ?1",
            params![id],
            asset_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn mark_asset_uploaded(&self, id: i64) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE assets SET is_uploaded = 1 WHERE asset_id = ?1",
            params![id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Artist operations

    fn create_artist(&self, fields: &ArtistFields) -> Result<Artist> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO artists (name, biography, asset_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fields.name,
                fields.biography,
                fields.asset_id,
                format_datetime(&created_at)
            ],
        )
        .map_err(|e| map_unique(e, "artist name"))?;

        Ok(Artist {
            artist_id: conn.last_insert_rowid(),
            name: fields.name.clone(),
            biography: fields.biography.clone(),
            asset_id: fields.asset_id,
            created_at,
        })
    }

    fn get_artist(&self, id: i64) -> Result<Option<Artist>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT artist_id, name, biography, asset_id, created_at
             FROM artists WHERE artist_id = ?1",
            params![id],
            artist_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_artists(&self, offset: i64, limit: i64) -> Result<Vec<Artist>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT artist_id, name, biography, asset_id, created_at
             FROM artists ORDER BY artist_id LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![limit, offset], artist_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_artists(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM artists", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn latest_artists(&self, limit: i64) -> Result<Vec<Artist>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT artist_id, name, biography, asset_id, created_at
             FROM artists ORDER BY artist_id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], artist_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_artist(&self, id: i64, fields: &ArtistFields) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE artists SET name = ?1, biography = ?2, asset_id = ?3
                 WHERE artist_id = ?4",
                params![fields.name, fields.biography, fields.asset_id, id],
            )
            .map_err(|e| map_unique(e, "artist name"))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_artist(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM songs WHERE album_id IN
               (SELECT album_id FROM albums WHERE artist_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM albums WHERE artist_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM artists WHERE artist_id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Album operations

    fn create_album(&self, fields: &AlbumFields) -> Result<Album> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO albums (name, artist_id, asset_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fields.name,
                fields.artist_id,
                fields.asset_id,
                format_datetime(&created_at)
            ],
        )?;

        Ok(Album {
            album_id: conn.last_insert_rowid(),
            name: fields.name.clone(),
            artist_id: fields.artist_id,
            asset_id: fields.asset_id,
            created_at,
        })
    }

    fn get_album(&self, id: i64) -> Result<Option<Album>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT album_id, name, artist_id, asset_id, created_at
             FROM albums WHERE album_id = ?1",
            params![id],
            album_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_albums_by_artist(&self, artist_id: i64, offset: i64, limit: i64) -> Result<Vec<Album>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT album_id, name, artist_id, asset_id, created_at
             FROM albums WHERE artist_id = ?1 ORDER BY album_id LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt.query_map(params![artist_id, limit, offset], album_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_albums_by_artist(&self, artist_id: i64) -> Result<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM albums WHERE artist_id = ?1",
            params![artist_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn latest_albums(&self, limit: i64) -> Result<Vec<Album>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT album_id, name, artist_id, asset_id, created_at
             FROM albums ORDER BY album_id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], album_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_album(&self, id: i64, fields: &AlbumFields) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE albums SET name = ?1, artist_id = ?2, asset_id = ?3
             WHERE album_id = ?4",
            params![fields.name, fields.artist_id, fields.asset_id, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_album(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM songs WHERE album_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM albums WHERE album_id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    fn list_album_ids_by_artist(&self, artist_id: i64) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT album_id FROM albums WHERE artist_id = ?1 ORDER BY album_id")?;

        let rows = stmt.query_map(params![artist_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Song operations

    fn create_song(&self, fields: &SongFields) -> Result<Song> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO songs (name, album_id, asset_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fields.name,
                fields.album_id,
                fields.asset_id,
                format_datetime(&created_at)
            ],
        )?;

        Ok(Song {
            song_id: conn.last_insert_rowid(),
            name: fields.name.clone(),
            album_id: fields.album_id,
            asset_id: fields.asset_id,
            created_at,
        })
    }

    fn get_song(&self, id: i64) -> Result<Option<Song>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT song_id, name, album_id, asset_id, created_at
             FROM songs WHERE song_id = ?1",
            params![id],
            song_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_songs_by_album(&self, album_id: i64, offset: i64, limit: i64) -> Result<Vec<Song>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT song_id, name, album_id, asset_id, created_at
             FROM songs WHERE album_id = ?1 ORDER BY song_id LIMIT ?2 OFFSET ?3",
        )?;

        let rows = stmt.query_map(params![album_id, limit, offset], song_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_songs_by_album(&self, album_id: i64) -> Result<i64> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM songs WHERE album_id = ?1",
            params![album_id],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    fn latest_songs(&self, limit: i64) -> Result<Vec<Song>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT song_id, name, album_id, asset_id, created_at
             FROM songs ORDER BY song_id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], song_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_song(&self, id: i64, fields: &SongFields) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE songs SET name = ?1, album_id = ?2, asset_id = ?3
             WHERE song_id = ?4",
            params![fields.name, fields.album_id, fields.asset_id, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_song(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM songs WHERE song_id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn list_song_ids_by_album(&self, album_id: i64) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT song_id FROM songs WHERE album_id = ?1 ORDER BY song_id")?;

        let rows = stmt.query_map(params![album_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_song_ids_by_artist(&self, artist_id: i64) -> Result<Vec<i64>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT s.song_id FROM songs s
             JOIN albums a ON a.album_id = s.album_id
             WHERE a.artist_id = ?1 ORDER BY s.song_id",
        )?;

        let rows = stmt.query_map(params![artist_id], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteCatalog) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteCatalog::new(temp_dir.path().join("catalog.db")).unwrap();
        store.initialize().unwrap();
        (temp_dir, store)
    }

    fn uploaded_asset(store: &SqliteCatalog, content_type: &str) -> Asset {
        let asset = store.create_asset(content_type).unwrap();
        store.mark_asset_uploaded(asset.asset_id).unwrap();
        store.get_asset(asset.asset_id).unwrap().unwrap()
    }

    #[test]
    fn test_user_crud() {
        let (_dir, store) = test_store();

        let user = store.create_user("alice", "hash", true).unwrap();
        assert!(user.user_id > 0);
        assert_eq!(store.count_users().unwrap(), 1);

        let by_name = store.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.user_id, user.user_id);
        assert!(by_name.is_admin);

        let mut updated = by_name.clone();
        updated.username = "alice2".to_string();
        store.update_user(&updated).unwrap();
        assert!(store.get_user_by_username("alice").unwrap().is_none());

        assert!(store.delete_user(user.user_id).unwrap());
        assert!(!store.delete_user(user.user_id).unwrap());
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        let (_dir, store) = test_store();

        store.create_user("alice", "hash", false).unwrap();
        let result = store.create_user("alice", "hash2", false);
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_asset_two_phase_flag() {
        let (_dir, store) = test_store();

        let asset = store.create_asset("audio/mpeg").unwrap();
        assert!(!asset.is_uploaded);

        store.mark_asset_uploaded(asset.asset_id).unwrap();
        let asset = store.get_asset(asset.asset_id).unwrap().unwrap();
        assert!(asset.is_uploaded);

        assert!(matches!(
            store.mark_asset_uploaded(9999),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_duplicate_artist_name_is_conflict() {
        let (_dir, store) = test_store();
        let asset = uploaded_asset(&store, "image/png");

        let fields =
            ArtistFields::new("Nico".into(), "Chanteuse.".into(), asset.asset_id).unwrap();
        store.create_artist(&fields).unwrap();
        assert!(matches!(
            store.create_artist(&fields),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_artist_cascade_delete() {
        let (_dir, store) = test_store();
        let cover = uploaded_asset(&store, "image/png");
        let audio = uploaded_asset(&store, "audio/mpeg");

        let artist = store
            .create_artist(
                &ArtistFields::new("Low".into(), "Duluth slowcore.".into(), cover.asset_id)
                    .unwrap(),
            )
            .unwrap();
        let album = store
            .create_album(
                &AlbumFields::new("Things We Lost in the Fire".into(), artist.artist_id, cover.asset_id)
                    .unwrap(),
            )
            .unwrap();
        let song = store
            .create_song(
                &SongFields::new("Sunflower".into(), album.album_id, audio.asset_id).unwrap(),
            )
            .unwrap();

        assert_eq!(
            store.list_song_ids_by_artist(artist.artist_id).unwrap(),
            vec![song.song_id]
        );

        assert!(store.delete_artist(artist.artist_id).unwrap());
        assert!(store.get_artist(artist.artist_id).unwrap().is_none());
        assert!(store.get_album(album.album_id).unwrap().is_none());
        assert!(store.get_song(song.song_id).unwrap().is_none());

        // Assets survive the cascade
        assert!(store.get_asset(cover.asset_id).unwrap().is_some());
        assert!(store.get_asset(audio.asset_id).unwrap().is_some());
    }

    #[test]
    fn test_latest_ordering_and_paging() {
        let (_dir, store) = test_store();
        let cover = uploaded_asset(&store, "image/png");

        for i in 0..5 {
            store
                .create_artist(
                    &ArtistFields::new(format!("artist-{i}"), "bio".into(), cover.asset_id)
                        .unwrap(),
                )
                .unwrap();
        }

        let latest = store.latest_artists(2).unwrap();
        assert_eq!(latest.len(), 2);
        assert!(latest[0].artist_id > latest[1].artist_id);

        let page = store.list_artists(2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].name, "artist-2");
        assert_eq!(store.count_artists().unwrap(), 5);
    }

    #[test]
    fn test_update_missing_row_is_not_found() {
        let (_dir, store) = test_store();

        let fields = ArtistFields::new("Ghost".into(), "bio".into(), 1).unwrap();
        assert!(matches!(
            store.update_artist(42, &fields),
            Err(Error::NotFound)
        ));
    }
}

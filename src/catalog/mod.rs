mod range;

pub use range::parse_range;

use std::sync::Arc;

use tracing::warn;

use crate::blob::{BlobStorage, BlobStorageError, ObjectReader};
use crate::error::{Error, Result};
use crate::search::{DisplayFields, EntityKind, SearchHit, SearchIndex};
use crate::store::CatalogStore;
use crate::types::*;

/// Upload ceiling for a single asset payload.
pub const MAX_ASSET_SIZE: u64 = 50 * 1024 * 1024;

const REINDEX_BATCH: i64 = 500;

/// Orchestrates every catalog mutation across the three stores.
///
/// Writes validate cross-references, persist in the relational store's own
/// transaction, and only then fan out to the search index; the catalog is
/// the source of truth and an index failure never rolls it back. Deletes
/// invert the order: documents come out of the index before the rows are
/// removed, so a reader never sees a search hit for a deleted record.
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    index: Arc<SearchIndex>,
    blobs: Arc<BlobStorage>,
}

fn blob_error(e: BlobStorageError) -> Error {
    Error::Internal(format!("blob store: {e}"))
}

impl Catalog {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        index: Arc<SearchIndex>,
        blobs: Arc<BlobStorage>,
    ) -> Self {
        Self {
            store,
            index,
            blobs,
        }
    }

    // Reference checks, all by point lookup before any persistence

    fn require_cover_asset(&self, asset_id: i64) -> Result<()> {
        match self.store.get_asset(asset_id)? {
            Some(asset) if asset.is_uploaded && asset.is_image() => Ok(()),
            _ => Err(Error::InvalidReference(format!(
                "asset {asset_id} is not an uploaded image"
            ))),
        }
    }

    fn require_audio_asset(&self, asset_id: i64) -> Result<()> {
        match self.store.get_asset(asset_id)? {
            Some(asset) if asset.is_uploaded && asset.is_audio() => Ok(()),
            _ => Err(Error::InvalidReference(format!(
                "asset {asset_id} is not an uploaded audio file"
            ))),
        }
    }

    fn require_artist(&self, artist_id: i64) -> Result<Artist> {
        self.store
            .get_artist(artist_id)?
            .ok_or_else(|| Error::InvalidReference(format!("artist {artist_id} does not exist")))
    }

    fn require_album(&self, album_id: i64) -> Result<Album> {
        self.store
            .get_album(album_id)?
            .ok_or_else(|| Error::InvalidReference(format!("album {album_id} does not exist")))
    }

    // Search fan-out. Failures here are absorbed: the catalog write has
    // already committed and stays authoritative.

    fn index_artist(&self, artist: &Artist) {
        self.index.upsert(
            EntityKind::Artist,
            artist.artist_id,
            &artist.name,
            DisplayFields {
                name: artist.name.clone(),
                artist: None,
            },
        );
    }

    fn index_album(&self, album: &Album) {
        match self.store.get_artist(album.artist_id) {
            Ok(Some(artist)) => self.index.upsert(
                EntityKind::Album,
                album.album_id,
                &album.name,
                DisplayFields {
                    name: album.name.clone(),
                    artist: Some(artist.name),
                },
            ),
            Ok(None) => warn!(
                "index fan-out skipped: artist {} missing for album {}",
                album.artist_id, album.album_id
            ),
            Err(e) => warn!("index fan-out failed for album {}: {e}", album.album_id),
        }
    }

    fn index_song(&self, song: &Song) {
        let artist = self
            .store
            .get_album(song.album_id)
            .and_then(|album| match album {
                Some(album) => self.store.get_artist(album.artist_id),
                None => Ok(None),
            });

        match artist {
            Ok(Some(artist)) => self.index.upsert(
                EntityKind::Song,
                song.song_id,
                &song.name,
                DisplayFields {
                    name: song.name.clone(),
                    artist: Some(artist.name),
                },
            ),
            Ok(None) => warn!(
                "index fan-out skipped: album {} chain broken for song {}",
                song.album_id, song.song_id
            ),
            Err(e) => warn!("index fan-out failed for song {}: {e}", song.song_id),
        }
    }

    // Artist operations

    pub fn create_artist(&self, fields: &ArtistFields) -> Result<Artist> {
        self.require_cover_asset(fields.asset_id)?;

        let artist = self.store.create_artist(fields)?;
        self.index_artist(&artist);
        Ok(artist)
    }

    pub fn update_artist(&self, id: i64, fields: &ArtistFields) -> Result<Artist> {
        self.require_cover_asset(fields.asset_id)?;

        self.store.update_artist(id, fields)?;
        let artist = self.store.get_artist(id)?.ok_or(Error::NotFound)?;
        self.index_artist(&artist);
        Ok(artist)
    }

    /// Deletes the artist and, by cascade, its albums and their songs.
    /// Returns the artist as it was before deletion.
    pub fn delete_artist(&self, id: i64) -> Result<Artist> {
        let artist = self.store.get_artist(id)?.ok_or(Error::NotFound)?;

        // Index documents go first so a deleted record can never surface
        // as a live-looking search hit.
        for song_id in self.store.list_song_ids_by_artist(id)? {
            self.index.remove(EntityKind::Song, song_id);
        }
        for album_id in self.store.list_album_ids_by_artist(id)? {
            self.index.remove(EntityKind::Album, album_id);
        }
        self.index.remove(EntityKind::Artist, id);

        self.store.delete_artist(id)?;
        Ok(artist)
    }

    // Album operations

    pub fn create_album(&self, fields: &AlbumFields) -> Result<Album> {
        self.require_cover_asset(fields.asset_id)?;
        self.require_artist(fields.artist_id)?;

        let album = self.store.create_album(fields)?;
        self.index_album(&album);
        Ok(album)
    }

    pub fn update_album(&self, id: i64, fields: &AlbumFields) -> Result<Album> {
        self.require_cover_asset(fields.asset_id)?;
        self.require_artist(fields.artist_id)?;

        self.store.update_album(id, fields)?;
        let album = self.store.get_album(id)?.ok_or(Error::NotFound)?;
        self.index_album(&album);
        Ok(album)
    }

    pub fn delete_album(&self, id: i64) -> Result<Album> {
        let album = self.store.get_album(id)?.ok_or(Error::NotFound)?;

        for song_id in self.store.list_song_ids_by_album(id)? {
            self.index.remove(EntityKind::Song, song_id);
        }
        self.index.remove(EntityKind::Album, id);

        self.store.delete_album(id)?;
        Ok(album)
    }

    // Song operations

    pub fn create_song(&self, fields: &SongFields) -> Result<Song> {
        self.require_audio_asset(fields.asset_id)?;
        self.require_album(fields.album_id)?;

        let song = self.store.create_song(fields)?;
        self.index_song(&song);
        Ok(song)
    }

    pub fn update_song(&self, id: i64, fields: &SongFields) -> Result<Song> {
        self.require_audio_asset(fields.asset_id)?;
        self.require_album(fields.album_id)?;

        self.store.update_song(id, fields)?;
        let song = self.store.get_song(id)?.ok_or(Error::NotFound)?;
        self.index_song(&song);
        Ok(song)
    }

    pub fn delete_song(&self, id: i64) -> Result<Song> {
        let song = self.store.get_song(id)?.ok_or(Error::NotFound)?;

        self.index.remove(EntityKind::Song, id);
        self.store.delete_song(id)?;
        Ok(song)
    }

    // Asset operations

    /// Assets are exempt from deletion entirely, which keeps every issued
    /// reference and delivery URL stable.
    pub fn delete_asset(&self, _id: i64) -> Result<()> {
        Err(Error::Immutable)
    }

    /// Two-phase upload: reserve an unconfirmed catalog row, write the blob,
    /// then flip the row to uploaded. A failure after the row exists leaves
    /// it unconfirmed, which no reference check will ever accept.
    pub async fn upload_asset(
        &self,
        expected_type: &str,
        declared_type: &str,
        payload: &[u8],
    ) -> Result<Asset> {
        if payload.len() as u64 > MAX_ASSET_SIZE {
            return Err(Error::TooLarge);
        }
        if declared_type != expected_type {
            return Err(Error::TypeMismatch);
        }

        let asset = self.store.create_asset(declared_type)?;

        self.blobs.ensure_container().await.map_err(blob_error)?;
        self.blobs
            .put(asset.asset_id, declared_type, payload)
            .await
            .map_err(blob_error)?;

        self.store.mark_asset_uploaded(asset.asset_id)?;
        self.store.get_asset(asset.asset_id)?.ok_or(Error::NotFound)
    }

    /// Streams an asset, honoring an optional `Range` header. The size is
    /// fetched first with a metadata-only call; the payload read is limited
    /// to the requested window.
    pub async fn serve_asset(
        &self,
        asset_id: i64,
        range_header: Option<&str>,
    ) -> Result<AssetDelivery> {
        let asset = self.store.get_asset(asset_id)?;
        if !asset.is_some_and(|asset| asset.is_uploaded) {
            return Err(Error::NotFound);
        }

        let info = self.blobs.head(asset_id).await.map_err(blob_error)?;

        let (partial, start, end) = match range_header {
            None => (false, 0, info.size.saturating_sub(1)),
            Some(header) => {
                let (start, end) = parse_range(header, info.size)?;
                (true, start, end)
            }
        };

        let length = if info.size == 0 { 0 } else { end - start + 1 };
        let reader = self
            .blobs
            .read_range(asset_id, start, length)
            .await
            .map_err(blob_error)?;

        Ok(AssetDelivery {
            partial,
            start,
            end,
            size: info.size,
            content_type: info.content_type,
            reader,
        })
    }

    // Search

    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        self.index.query(query)
    }

    /// Rebuilds every search document from catalog rows. Run at startup;
    /// also the repair path for any staleness the fan-out contract allows.
    pub fn rebuild_index(&self) -> Result<usize> {
        let mut indexed = 0;
        let mut offset = 0;

        loop {
            let artists = self.store.list_artists(offset, REINDEX_BATCH)?;
            if artists.is_empty() {
                break;
            }

            for artist in &artists {
                self.index_artist(artist);
                indexed += 1;

                for album_id in self.store.list_album_ids_by_artist(artist.artist_id)? {
                    let Some(album) = self.store.get_album(album_id)? else {
                        continue;
                    };
                    self.index.upsert(
                        EntityKind::Album,
                        album.album_id,
                        &album.name,
                        DisplayFields {
                            name: album.name.clone(),
                            artist: Some(artist.name.clone()),
                        },
                    );
                    indexed += 1;

                    for song_id in self.store.list_song_ids_by_album(album_id)? {
                        let Some(song) = self.store.get_song(song_id)? else {
                            continue;
                        };
                        self.index.upsert(
                            EntityKind::Song,
                            song.song_id,
                            &song.name,
                            DisplayFields {
                                name: song.name.clone(),
                                artist: Some(artist.name.clone()),
                            },
                        );
                        indexed += 1;
                    }
                }
            }

            offset += REINDEX_BATCH;
        }

        Ok(indexed)
    }
}

/// A ready-to-stream byte window of an asset.
///
/// The reader is lazy, forward-only and single-pass; serving the same asset
/// again requires a new `serve_asset` call.
pub struct AssetDelivery {
    pub partial: bool,
    pub start: u64,
    pub end: u64,
    pub size: u64,
    pub content_type: String,
    pub reader: ObjectReader,
}

impl AssetDelivery {
    #[must_use]
    pub fn content_length(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.end - self.start + 1
        }
    }

    #[must_use]
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteCatalog;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn test_catalog() -> (TempDir, Arc<SqliteCatalog>, Catalog) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteCatalog::new(temp_dir.path().join("catalog.db")).unwrap();
        store.initialize().unwrap();
        let store = Arc::new(store);

        let catalog = Catalog::new(
            store.clone(),
            Arc::new(SearchIndex::new()),
            Arc::new(BlobStorage::new(temp_dir.path())),
        );
        (temp_dir, store, catalog)
    }

    async fn uploaded(catalog: &Catalog, content_type: &str, data: &[u8]) -> Asset {
        catalog
            .upload_asset(content_type, content_type, data)
            .await
            .unwrap()
    }

    async fn read_all(mut reader: ObjectReader) -> Vec<u8> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await.unwrap();
        content
    }

    #[tokio::test]
    async fn test_upload_two_phase() {
        let (_dir, store, catalog) = test_catalog();

        let asset = uploaded(&catalog, "audio/mpeg", b"abcdef").await;
        assert!(asset.is_uploaded);
        assert_eq!(asset.content_type, "audio/mpeg");

        let row = store.get_asset(asset.asset_id).unwrap().unwrap();
        assert!(row.is_uploaded);
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized_payload() {
        let (_dir, store, catalog) = test_catalog();

        let payload = vec![0u8; (MAX_ASSET_SIZE + 1) as usize];
        let result = catalog.upload_asset("audio/mpeg", "audio/mpeg", &payload).await;
        assert!(matches!(result, Err(Error::TooLarge)));

        // Rejected before anything was persisted
        assert!(store.get_asset(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upload_rejects_type_mismatch() {
        let (_dir, store, catalog) = test_catalog();

        let result = catalog.upload_asset("image/png", "audio/mpeg", b"data").await;
        assert!(matches!(result, Err(Error::TypeMismatch)));
        assert!(store.get_asset(1).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_asset_deletion_always_fails() {
        let (_dir, _store, catalog) = test_catalog();

        let asset = uploaded(&catalog, "image/png", b"png").await;
        assert!(matches!(
            catalog.delete_asset(asset.asset_id),
            Err(Error::Immutable)
        ));
        assert!(matches!(catalog.delete_asset(9999), Err(Error::Immutable)));
    }

    #[tokio::test]
    async fn test_create_artist_rejects_unconfirmed_asset() {
        let (_dir, store, catalog) = test_catalog();

        // Row exists but the blob never landed
        let orphan = store.create_asset("image/png").unwrap();

        let fields = ArtistFields::new("Suicide".into(), "NYC duo.".into(), orphan.asset_id).unwrap();
        assert!(matches!(
            catalog.create_artist(&fields),
            Err(Error::InvalidReference(_))
        ));
        assert!(catalog.search("Suicide").is_empty());
    }

    #[tokio::test]
    async fn test_create_artist_rejects_audio_cover() {
        let (_dir, _store, catalog) = test_catalog();

        let audio = uploaded(&catalog, "audio/mpeg", b"mp3").await;
        let fields = ArtistFields::new("Can".into(), "Köln.".into(), audio.asset_id).unwrap();
        assert!(matches!(
            catalog.create_artist(&fields),
            Err(Error::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_create_album_fans_out_with_artist_name() {
        let (_dir, _store, catalog) = test_catalog();

        let cover = uploaded(&catalog, "image/png", b"png").await;
        let artist = catalog
            .create_artist(
                &ArtistFields::new("Broadcast".into(), "Birmingham.".into(), cover.asset_id)
                    .unwrap(),
            )
            .unwrap();
        let album = catalog
            .create_album(
                &AlbumFields::new("Tender Buttons".into(), artist.artist_id, cover.asset_id)
                    .unwrap(),
            )
            .unwrap();

        let hits = catalog.search("Tender");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, album.album_id);
        assert_eq!(hits[0].kind, EntityKind::Album);
        assert_eq!(hits[0].data.artist.as_deref(), Some("Broadcast"));
    }

    #[tokio::test]
    async fn test_create_song_rejects_missing_album() {
        let (_dir, store, catalog) = test_catalog();

        let audio = uploaded(&catalog, "audio/mpeg", b"mp3").await;
        let fields = SongFields::new("Orphan".into(), 42, audio.asset_id).unwrap();
        assert!(matches!(
            catalog.create_song(&fields),
            Err(Error::InvalidReference(_))
        ));
        assert!(store.list_song_ids_by_album(42).unwrap().is_empty());
        assert!(catalog.search("Orphan").is_empty());
    }

    #[tokio::test]
    async fn test_update_artist_reindexes() {
        let (_dir, _store, catalog) = test_catalog();

        let cover = uploaded(&catalog, "image/png", b"png").await;
        let artist = catalog
            .create_artist(&ArtistFields::new("Slint".into(), "Louisville.".into(), cover.asset_id).unwrap())
            .unwrap();

        catalog
            .update_artist(
                artist.artist_id,
                &ArtistFields::new("Tortoise".into(), "Chicago.".into(), cover.asset_id).unwrap(),
            )
            .unwrap();

        assert!(catalog.search("Slint").is_empty());
        let hits = catalog.search("Tortoise");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, artist.artist_id);
    }

    #[tokio::test]
    async fn test_delete_artist_cascades_rows_and_documents() {
        let (_dir, store, catalog) = test_catalog();

        let cover = uploaded(&catalog, "image/png", b"png").await;
        let audio = uploaded(&catalog, "audio/mpeg", b"mp3").await;

        let artist = catalog
            .create_artist(&ArtistFields::new("Lift to Experience".into(), "Texas.".into(), cover.asset_id).unwrap())
            .unwrap();
        let album = catalog
            .create_album(&AlbumFields::new("The Texas-Jerusalem Crossroads".into(), artist.artist_id, cover.asset_id).unwrap())
            .unwrap();
        let song = catalog
            .create_song(&SongFields::new("Falling from Cloud 9".into(), album.album_id, audio.asset_id).unwrap())
            .unwrap();

        catalog.delete_artist(artist.artist_id).unwrap();

        assert!(store.get_artist(artist.artist_id).unwrap().is_none());
        assert!(store.get_album(album.album_id).unwrap().is_none());
        assert!(store.get_song(song.song_id).unwrap().is_none());
        assert!(catalog.search("Texas").is_empty());
        assert!(catalog.search("Falling").is_empty());

        // Assets remain fetchable after the cascade
        let delivery = catalog.serve_asset(audio.asset_id, None).await.unwrap();
        assert_eq!(read_all(delivery.reader).await, b"mp3");
    }

    #[tokio::test]
    async fn test_serve_full_object() {
        let (_dir, _store, catalog) = test_catalog();

        let payload = vec![7u8; 100];
        let asset = uploaded(&catalog, "audio/mpeg", &payload).await;

        let delivery = catalog.serve_asset(asset.asset_id, None).await.unwrap();
        assert!(!delivery.partial);
        assert_eq!(delivery.size, 100);
        assert_eq!(delivery.content_length(), 100);
        assert_eq!(delivery.content_type, "audio/mpeg");
        assert_eq!(read_all(delivery.reader).await.len(), 100);
    }

    #[tokio::test]
    async fn test_serve_open_ended_range() {
        let (_dir, _store, catalog) = test_catalog();

        let payload = vec![7u8; 100];
        let asset = uploaded(&catalog, "audio/mpeg", &payload).await;

        let delivery = catalog
            .serve_asset(asset.asset_id, Some("bytes=0-"))
            .await
            .unwrap();
        assert!(delivery.partial);
        assert_eq!(delivery.content_range(), "bytes 0-99/100");
        assert_eq!(delivery.content_length(), 100);
        assert_eq!(read_all(delivery.reader).await.len(), 100);
    }

    #[tokio::test]
    async fn test_serve_window() {
        let (_dir, _store, catalog) = test_catalog();

        let asset = uploaded(&catalog, "audio/mpeg", b"0123456789").await;

        let delivery = catalog
            .serve_asset(asset.asset_id, Some("bytes=2-5"))
            .await
            .unwrap();
        assert_eq!(delivery.content_range(), "bytes 2-5/10");
        assert_eq!(read_all(delivery.reader).await, b"2345");
    }

    #[tokio::test]
    async fn test_serve_unsatisfiable_range() {
        let (_dir, _store, catalog) = test_catalog();

        let payload = vec![7u8; 100];
        let asset = uploaded(&catalog, "audio/mpeg", &payload).await;

        let result = catalog.serve_asset(asset.asset_id, Some("bytes=150-200")).await;
        assert!(matches!(result, Err(Error::RangeNotSatisfiable)));
    }

    #[tokio::test]
    async fn test_serve_unconfirmed_asset_is_not_found() {
        let (_dir, store, catalog) = test_catalog();

        let orphan = store.create_asset("audio/mpeg").unwrap();
        let result = catalog.serve_asset(orphan.asset_id, None).await;
        assert!(matches!(result, Err(Error::NotFound)));

        let result = catalog.serve_asset(9999, None).await;
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_rebuild_index_from_rows() {
        let (_dir, store, catalog) = test_catalog();

        let cover = uploaded(&catalog, "image/png", b"png").await;
        let audio = uploaded(&catalog, "audio/mpeg", b"mp3").await;
        let artist = catalog
            .create_artist(&ArtistFields::new("Stereolab".into(), "London.".into(), cover.asset_id).unwrap())
            .unwrap();
        let album = catalog
            .create_album(&AlbumFields::new("Dots and Loops".into(), artist.artist_id, cover.asset_id).unwrap())
            .unwrap();
        catalog
            .create_song(&SongFields::new("Rainbo Conversation".into(), album.album_id, audio.asset_id).unwrap())
            .unwrap();

        // A fresh process starts with an empty index and rebuilds it
        let rebuilt = Catalog::new(
            store.clone(),
            Arc::new(SearchIndex::new()),
            Arc::new(BlobStorage::new(_dir.path())),
        );
        assert!(rebuilt.search("Stereolab").is_empty());

        assert_eq!(rebuilt.rebuild_index().unwrap(), 3);
        assert_eq!(rebuilt.search("Stereolab").len(), 1);
        assert_eq!(
            rebuilt.search("Rainbo")[0].data.artist.as_deref(),
            Some("Stereolab")
        );
    }
}

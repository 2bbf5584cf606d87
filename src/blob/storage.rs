use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader, Take};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BlobStorageError {
    #[error("object not found")]
    NotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlobStorageError {
    fn from_io(e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(e)
        }
    }
}

/// Metadata for a stored object, fetched without touching the payload.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub size: u64,
    pub content_type: String,
}

/// Byte window reader over a stored object. Forward-only and single-pass;
/// a second read requires a new call.
pub type ObjectReader = Take<BufReader<File>>;

/// Object store for asset payloads, keyed by the decimal asset id.
///
/// The container directory is provisioned lazily; a `.meta` sidecar next to
/// each object carries its content type. Writes go through a temp file and
/// a rename so a crashed upload never leaves a readable partial object.
pub struct BlobStorage {
    container: PathBuf,
}

impl BlobStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            container: data_dir.join("assets"),
        }
    }

    fn object_path(&self, asset_id: i64) -> PathBuf {
        self.container.join(asset_id.to_string())
    }

    fn meta_path(&self, asset_id: i64) -> PathBuf {
        self.container.join(format!("{asset_id}.meta"))
    }

    fn temp_path(&self) -> PathBuf {
        self.container.join("tmp").join(Uuid::new_v4().to_string())
    }

    /// Creates the container if absent. Idempotent.
    pub async fn ensure_container(&self) -> Result<(), BlobStorageError> {
        fs::create_dir_all(&self.container).await?;
        Ok(())
    }

    pub async fn put(
        &self,
        asset_id: i64,
        content_type: &str,
        data: &[u8],
    ) -> Result<(), BlobStorageError> {
        let temp_path = self.temp_path();
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_file = File::create(&temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;

        fs::write(self.meta_path(asset_id), content_type).await?;
        fs::rename(&temp_path, self.object_path(asset_id)).await?;

        Ok(())
    }

    /// Size and content type only; the payload is not opened.
    pub async fn head(&self, asset_id: i64) -> Result<ObjectInfo, BlobStorageError> {
        let metadata = fs::metadata(self.object_path(asset_id))
            .await
            .map_err(BlobStorageError::from_io)?;
        let content_type = fs::read_to_string(self.meta_path(asset_id))
            .await
            .map_err(BlobStorageError::from_io)?;

        Ok(ObjectInfo {
            size: metadata.len(),
            content_type,
        })
    }

    /// Opens a byte window of `len` bytes starting at `start` (already
    /// validated by the caller against the object size).
    pub async fn read_range(
        &self,
        asset_id: i64,
        start: u64,
        len: u64,
    ) -> Result<ObjectReader, BlobStorageError> {
        let mut file = File::open(self.object_path(asset_id))
            .await
            .map_err(BlobStorageError::from_io)?;

        file.seek(SeekFrom::Start(start)).await?;
        Ok(BufReader::new(file).take(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn read_all(mut reader: ObjectReader) -> Vec<u8> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await.unwrap();
        content
    }

    #[tokio::test]
    async fn test_put_and_head() {
        let temp_dir = TempDir::new().unwrap();
        let storage = BlobStorage::new(temp_dir.path());
        storage.ensure_container().await.unwrap();

        storage.put(1, "audio/mpeg", b"0123456789").await.unwrap();

        let info = storage.head(1).await.unwrap();
        assert_eq!(info.size, 10);
        assert_eq!(info.content_type, "audio/mpeg");
    }

    #[tokio::test]
    async fn test_read_full_and_window() {
        let temp_dir = TempDir::new().unwrap();
        let storage = BlobStorage::new(temp_dir.path());
        storage.ensure_container().await.unwrap();

        storage.put(2, "audio/mpeg", b"0123456789").await.unwrap();

        let full = read_all(storage.read_range(2, 0, 10).await.unwrap()).await;
        assert_eq!(full, b"0123456789");

        let window = read_all(storage.read_range(2, 3, 4).await.unwrap()).await;
        assert_eq!(window, b"3456");
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = BlobStorage::new(temp_dir.path());
        storage.ensure_container().await.unwrap();

        assert!(matches!(
            storage.head(404).await,
            Err(BlobStorageError::NotFound)
        ));
        assert!(matches!(
            storage.read_range(404, 0, 1).await,
            Err(BlobStorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_ensure_container_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = BlobStorage::new(temp_dir.path());

        storage.ensure_container().await.unwrap();
        storage.ensure_container().await.unwrap();
    }

    #[tokio::test]
    async fn test_put_replaces_object() {
        let temp_dir = TempDir::new().unwrap();
        let storage = BlobStorage::new(temp_dir.path());
        storage.ensure_container().await.unwrap();

        storage.put(3, "image/png", b"first").await.unwrap();
        storage.put(3, "image/png", b"second!").await.unwrap();

        let info = storage.head(3).await.unwrap();
        assert_eq!(info.size, 7);
    }
}

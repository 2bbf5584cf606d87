use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ARTIST_NAME_LENGTH: RangeInclusive<usize> = 1..=120;
pub const ARTIST_BIOGRAPHY_LENGTH: RangeInclusive<usize> = 1..=4096;
pub const ALBUM_NAME_LENGTH: RangeInclusive<usize> = 1..=120;
pub const SONG_NAME_LENGTH: RangeInclusive<usize> = 1..=120;
pub const USERNAME_LENGTH: RangeInclusive<usize> = 3..=32;
pub const PASSWORD_LENGTH: RangeInclusive<usize> = 8..=128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub artist_id: i64,
    pub name: String,
    pub biography: String,
    pub asset_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub album_id: i64,
    pub name: String,
    pub artist_id: i64,
    pub asset_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub song_id: i64,
    pub name: String,
    pub album_id: i64,
    pub asset_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A binary payload record. Created unconfirmed, flipped to `is_uploaded`
/// only after the blob is durably stored, and never deletable afterwards so
/// issued references and URLs stay stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: i64,
    pub content_type: String,
    pub is_uploaded: bool,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    #[must_use]
    pub fn is_audio(&self) -> bool {
        self.content_type.starts_with("audio/")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

fn validate_length(field: &str, value: &str, bounds: RangeInclusive<usize>) -> Result<()> {
    let length = value.chars().count();
    if !bounds.contains(&length) {
        return Err(Error::Validation(format!(
            "{field} must be between {} and {} characters long",
            bounds.start(),
            bounds.end()
        )));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<()> {
    validate_length("username", username, USERNAME_LENGTH)
}

pub fn validate_password(password: &str) -> Result<()> {
    validate_length("password", password, PASSWORD_LENGTH)
}

/// Validated artist fields. Construction is the only way to obtain a value,
/// so a name or biography outside its bounds never reaches storage.
#[derive(Debug, Clone)]
pub struct ArtistFields {
    pub name: String,
    pub biography: String,
    pub asset_id: i64,
}

impl ArtistFields {
    pub fn new(name: String, biography: String, asset_id: i64) -> Result<Self> {
        validate_length("artist name", &name, ARTIST_NAME_LENGTH)?;
        validate_length("artist biography", &biography, ARTIST_BIOGRAPHY_LENGTH)?;
        Ok(Self {
            name,
            biography,
            asset_id,
        })
    }
}

/// Validated album fields.
#[derive(Debug, Clone)]
pub struct AlbumFields {
    pub name: String,
    pub artist_id: i64,
    pub asset_id: i64,
}

impl AlbumFields {
    pub fn new(name: String, artist_id: i64, asset_id: i64) -> Result<Self> {
        validate_length("album name", &name, ALBUM_NAME_LENGTH)?;
        Ok(Self {
            name,
            artist_id,
            asset_id,
        })
    }
}

/// Validated song fields.
#[derive(Debug, Clone)]
pub struct SongFields {
    pub name: String,
    pub album_id: i64,
    pub asset_id: i64,
}

impl SongFields {
    pub fn new(name: String, album_id: i64, asset_id: i64) -> Result<Self> {
        validate_length("song name", &name, SONG_NAME_LENGTH)?;
        Ok(Self {
            name,
            album_id,
            asset_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_fields_valid() {
        let fields = ArtistFields::new("Nina Simone".into(), "Singer and pianist.".into(), 1);
        assert!(fields.is_ok());
    }

    #[test]
    fn test_artist_fields_empty_name() {
        let fields = ArtistFields::new(String::new(), "bio".into(), 1);
        assert!(matches!(fields, Err(Error::Validation(_))));
    }

    #[test]
    fn test_artist_fields_name_too_long() {
        let fields = ArtistFields::new("x".repeat(121), "bio".into(), 1);
        assert!(matches!(fields, Err(Error::Validation(_))));
    }

    #[test]
    fn test_album_fields_empty_name() {
        assert!(AlbumFields::new(String::new(), 1, 1).is_err());
    }

    #[test]
    fn test_song_fields_boundary_name() {
        assert!(SongFields::new("x".repeat(120), 1, 1).is_ok());
        assert!(SongFields::new("x".repeat(121), 1, 1).is_err());
    }

    #[test]
    fn test_username_bounds() {
        assert!(validate_username("bob").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 3 characters, 6 bytes
        assert!(validate_username("äöü").is_ok());
    }

    #[test]
    fn test_asset_content_type_classes() {
        let asset = Asset {
            asset_id: 1,
            content_type: "image/png".into(),
            is_uploaded: true,
            created_at: chrono::Utc::now(),
        };
        assert!(asset.is_image());
        assert!(!asset.is_audio());
    }
}

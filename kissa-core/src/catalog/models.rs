//! Wire formats of the Kissa backend.
//!
//! The backend stores albums as flat rows and is loose about types: ids and
//! years arrive as strings or numbers, optional columns arrive as `null`.
//! These structs absorb that and convert into the domain types.

use kissa_common::{Album, SearchCandidate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::util::content_type_for_extension;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<TextOrNumber> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(TextOrNumber::Text(s)) => s,
        Some(TextOrNumber::Integer(n)) => n.to_string(),
        Some(TextOrNumber::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Row of the `albums` table as returned by `GET /library`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AlbumRecord {
    #[serde(deserialize_with = "text_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub year: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genre: Vec<String>,
    #[serde(default)]
    pub spotify_url: Option<String>,
    #[serde(default)]
    pub discogs_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tracklist: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<AlbumRecord> for Album {
    fn from(record: AlbumRecord) -> Self {
        let mut album = Album::new(record.id, record.artist, record.title);
        album.cover_image_url = blank_as_none(record.cover_image);
        album.discogs_url = blank_as_none(record.discogs_url);
        album.year = record.year;
        album.label = record.label;
        album.set_genres(record.genre);
        album.tracklist = record.tracklist;
        album.set_spotify_url(blank_as_none(record.spotify_url));
        album
    }
}

/// Element of the `POST /search-candidates` response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CandidateRecord {
    pub discogs_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub year: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default)]
    pub thumb: Option<String>,
}

impl From<CandidateRecord> for SearchCandidate {
    fn from(record: CandidateRecord) -> Self {
        SearchCandidate {
            catalog_id: record.discogs_id,
            title: record.title,
            artist: record.artist,
            year: record.year,
            label: record.label,
            thumbnail_url: blank_as_none(record.thumb),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SearchRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddByIdRequest {
    pub discogs_id: u64,
}

/// Error body produced by the backend for non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// `detail` is a string for handled errors and a list of objects for
    /// request validation failures.
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A photo to hand to the recognition service
#[derive(Debug, Clone, PartialEq)]
pub struct ScanUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ScanUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or_default();
        let content_type = content_type_for_extension(ext).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read a photo from disk
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

use std::fmt;

use crate::spotify::spotify_album_id;

/// Server-assigned album identifier. Opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlbumId(String);

impl AlbumId {
    pub fn new(id: impl Into<String>) -> Self {
        AlbumId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlbumId {
    fn from(id: &str) -> Self {
        AlbumId::new(id)
    }
}

impl From<String> for AlbumId {
    fn from(id: String) -> Self {
        AlbumId(id)
    }
}

/// An album in the user's library.
///
/// The Spotify album id is derived from `spotify_url` and kept private so the
/// two can never disagree: set the URL through [`Album::set_spotify_url`].
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub id: AlbumId,
    pub artist: String,
    pub title: String,
    pub cover_image_url: Option<String>,
    pub discogs_url: Option<String>,
    pub year: String,
    pub label: String,
    /// Genre names, deduplicated. Order carries no meaning.
    pub genres: Vec<String>,
    pub tracklist: Vec<String>,
    spotify_url: Option<String>,
    spotify_album_id: Option<String>,
}

impl Album {
    pub fn new(id: impl Into<AlbumId>, artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            artist: artist.into(),
            title: title.into(),
            cover_image_url: None,
            discogs_url: None,
            year: String::new(),
            label: String::new(),
            genres: Vec::new(),
            tracklist: Vec::new(),
            spotify_url: None,
            spotify_album_id: None,
        }
    }

    pub fn spotify_url(&self) -> Option<&str> {
        self.spotify_url.as_deref()
    }

    /// Album id for the preview embed, present only for a well-formed Spotify URL.
    pub fn spotify_album_id(&self) -> Option<&str> {
        self.spotify_album_id.as_deref()
    }

    pub fn set_spotify_url(&mut self, url: Option<String>) {
        self.spotify_album_id = url.as_deref().and_then(spotify_album_id);
        self.spotify_url = url;
    }

    /// Replace the genre list, dropping duplicates and blank names.
    pub fn set_genres<I, S>(&mut self, genres: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for genre in genres {
            let genre = genre.into();
            if genre.trim().is_empty() || unique.contains(&genre) {
                continue;
            }
            unique.push(genre);
        }
        self.genres = unique;
    }

    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g == genre)
    }

    pub fn can_preview(&self) -> bool {
        self.spotify_album_id.is_some()
    }
}

/// An unconfirmed match returned by catalog search.
///
/// Candidates never enter the library directly: committing one makes the
/// server fetch full metadata by `catalog_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCandidate {
    pub catalog_id: u64,
    pub title: String,
    pub artist: String,
    pub year: String,
    pub label: String,
    pub thumbnail_url: Option<String>,
}

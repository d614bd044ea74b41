use std::sync::Mutex;

use kissa_common::spotify::embed_url;
use kissa_common::{Album, AlbumId};
use tracing::{debug, info};

use crate::library::{LibraryEvent, LibraryListener};
use crate::util::lock;

/// The album shown in the preview player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub album_id: AlbumId,
    pub artist: String,
    pub title: String,
    pub spotify_album_id: String,
}

impl NowPlaying {
    pub fn embed_url(&self) -> String {
        embed_url(&self.spotify_album_id)
    }
}

/// At most one previewed album. No queue, no autoplay.
#[derive(Default)]
pub struct PlaybackSession {
    current: Mutex<Option<NowPlaying>>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start previewing `album`, replacing whatever was active.
    ///
    /// Albums without a usable Spotify link are ignored; returns whether the
    /// session changed.
    pub fn play(&self, album: &Album) -> bool {
        let Some(spotify_album_id) = album.spotify_album_id() else {
            debug!("Album {} has no Spotify preview", album.id);
            return false;
        };
        info!("Previewing {} - {}", album.artist, album.title);
        *lock(&self.current) = Some(NowPlaying {
            album_id: album.id.clone(),
            artist: album.artist.clone(),
            title: album.title.clone(),
            spotify_album_id: spotify_album_id.to_string(),
        });
        true
    }

    pub fn stop(&self) {
        *lock(&self.current) = None;
    }

    pub fn current(&self) -> Option<NowPlaying> {
        lock(&self.current).clone()
    }

    pub fn embed_url(&self) -> Option<String> {
        lock(&self.current).as_ref().map(NowPlaying::embed_url)
    }

    pub fn is_playing(&self, id: &AlbumId) -> bool {
        lock(&self.current)
            .as_ref()
            .is_some_and(|now| &now.album_id == id)
    }
}

impl LibraryListener for PlaybackSession {
    fn on_library_event(&self, event: &LibraryEvent) {
        if let LibraryEvent::AlbumRemoved { id } = event {
            let mut current = lock(&self.current);
            if current.as_ref().is_some_and(|now| &now.album_id == id) {
                info!("Active album {} was deleted, stopping preview", id);
                *current = None;
            }
        }
    }
}

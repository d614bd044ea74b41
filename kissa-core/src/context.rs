use std::sync::Arc;

use kissa_common::AlbumId;

use crate::acquisition::AcquisitionWorkflow;
use crate::catalog::{CatalogService, KissaApiClient};
use crate::config::Config;
use crate::error::{CatalogError, KissaError};
use crate::library::LibraryStore;
use crate::playback::PlaybackSession;

/// Everything the presentation layer talks to, wired around one catalog
#[derive(Clone)]
pub struct Kissa {
    pub library: Arc<LibraryStore>,
    pub playback: Arc<PlaybackSession>,
    pub acquisition: Arc<AcquisitionWorkflow>,
}

impl Kissa {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        let library = Arc::new(LibraryStore::new(service.clone()));
        let playback = Arc::new(PlaybackSession::new());
        library.add_listener(playback.clone());
        let acquisition = Arc::new(AcquisitionWorkflow::new(service, library.clone()));
        Self {
            library,
            playback,
            acquisition,
        }
    }

    /// Connect to the backend named in `config`
    pub fn connect(config: &Config) -> Result<Self, CatalogError> {
        let client = KissaApiClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Preview an album from the library. Returns false if it is unknown or
    /// has nothing to preview.
    pub fn play(&self, id: &AlbumId) -> bool {
        match self.library.get(id) {
            Some(album) => self.playback.play(&album),
            None => false,
        }
    }

    /// Delete an album; stops the preview if it was playing.
    pub async fn delete(&self, id: &AlbumId) -> Result<(), KissaError> {
        self.library.remove(id).await?;
        Ok(())
    }
}

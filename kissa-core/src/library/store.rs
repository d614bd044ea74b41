use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use kissa_common::{filter_albums, genre_facets, Album, AlbumId, LibraryFilter};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::catalog::CatalogService;
use crate::error::KissaError;
use crate::util::{read, write};

/// Events emitted by the store when its collection changes
#[derive(Clone, Debug, PartialEq)]
pub enum LibraryEvent {
    /// The collection was replaced by a fresh server listing
    Refreshed { count: usize },
    /// An album was deleted on the server and dropped locally
    AlbumRemoved { id: AlbumId },
}

/// Synchronous observer of the store.
///
/// Called while the store still holds its write lock, so a listener sees the
/// change at the same instant readers do. Listeners must not call back into
/// the store.
pub trait LibraryListener: Send + Sync {
    fn on_library_event(&self, event: &LibraryEvent);
}

/// Result of a refresh that reached the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A younger refresh already published newer data
    Superseded,
}

#[derive(Default)]
struct Collection {
    albums: Vec<Album>,
    genres: Vec<String>,
    /// Sequence number of the newest listing published
    applied_seq: u64,
    /// Confirmed deletes, with the last sequence number issued before each.
    /// Listings at or below that number may still contain the album.
    deleted: Vec<(AlbumId, u64)>,
}

impl Collection {
    /// Drop albums deleted after listing `seq` was requested
    fn without_deleted(&self, seq: u64, mut albums: Vec<Album>) -> Vec<Album> {
        albums.retain(|album| {
            !self
                .deleted
                .iter()
                .any(|(id, deleted_at)| seq <= *deleted_at && id == &album.id)
        });
        albums
    }
}

/// Local mirror of the server-side library
pub struct LibraryStore {
    service: Arc<dyn CatalogService>,
    collection: RwLock<Collection>,
    next_seq: AtomicU64,
    listeners: RwLock<Vec<Arc<dyn LibraryListener>>>,
    event_tx: broadcast::Sender<LibraryEvent>,
}

impl LibraryStore {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            service,
            collection: RwLock::new(Collection::default()),
            next_seq: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
            event_tx,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn LibraryListener>) {
        write(&self.listeners).push(listener);
    }

    /// Subscribe to library events from async code
    pub fn subscribe_events(&self) -> broadcast::Receiver<LibraryEvent> {
        self.event_tx.subscribe()
    }

    /// Replace the collection with the server's current listing.
    ///
    /// All or nothing: on failure the previous albums and genres stay.
    /// A response older than the last published one is dropped. Albums
    /// deleted while the listing was in flight are left out of it.
    pub async fn refresh(&self) -> Result<RefreshOutcome, KissaError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Refreshing library (seq {})", seq);

        let albums = match self.service.list_albums().await {
            Ok(albums) => albums,
            Err(e) => {
                warn!("Library refresh {} failed, keeping current collection: {}", seq, e);
                return Err(KissaError::Sync(e));
            }
        };

        let mut collection = write(&self.collection);
        if seq <= collection.applied_seq {
            debug!(
                "Discarding stale library listing (seq {}, applied {})",
                seq, collection.applied_seq
            );
            return Ok(RefreshOutcome::Superseded);
        }
        let albums = collection.without_deleted(seq, albums);
        collection.deleted.retain(|(_, deleted_at)| *deleted_at > seq);
        let count = albums.len();
        collection.genres = genre_facets(&albums);
        collection.albums = albums;
        collection.applied_seq = seq;
        self.publish(LibraryEvent::Refreshed { count });
        drop(collection);

        info!("Library refreshed: {} albums", count);
        Ok(RefreshOutcome::Applied { count })
    }

    /// Delete an album on the server, then locally.
    ///
    /// Confirmation is the caller's job. A failed delete leaves the local
    /// collection untouched. Returns the removed album if it was present.
    pub async fn remove(&self, id: &AlbumId) -> Result<Option<Album>, KissaError> {
        if let Err(e) = self.service.delete_album(id).await {
            warn!("Not removing album {} locally: {}", id, e);
            return Err(KissaError::Sync(e));
        }

        let mut collection = write(&self.collection);
        let deleted_at = self.next_seq.load(Ordering::SeqCst);
        collection.deleted.push((id.clone(), deleted_at));

        let removed = match collection.albums.iter().position(|a| &a.id == id) {
            Some(index) => {
                let removed = collection.albums.remove(index);
                collection.genres = genre_facets(&collection.albums);
                Some(removed)
            }
            None => None,
        };
        self.publish(LibraryEvent::AlbumRemoved { id: id.clone() });
        drop(collection);

        match &removed {
            Some(album) => info!("Removed album {} ({} - {})", id, album.artist, album.title),
            None => debug!("Album {} deleted on server but not present locally", id),
        }
        Ok(removed)
    }

    /// Must be called with the collection write lock held.
    fn publish(&self, event: LibraryEvent) {
        for listener in read(&self.listeners).iter() {
            listener.on_library_event(&event);
        }
        let _ = self.event_tx.send(event);
    }

    pub fn albums(&self) -> Vec<Album> {
        read(&self.collection).albums.clone()
    }

    /// Genre facet set: every album's genres, sorted and unique
    pub fn genres(&self) -> Vec<String> {
        read(&self.collection).genres.clone()
    }

    pub fn get(&self, id: &AlbumId) -> Option<Album> {
        read(&self.collection)
            .albums
            .iter()
            .find(|a| &a.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.collection).albums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Albums matching `query` (title or artist) and `genre`, in store order
    pub fn filtered_view(&self, query: &str, genre: Option<&str>) -> Vec<Album> {
        let filter = LibraryFilter::new(query, genre.map(str::to_string));
        filter_albums(&read(&self.collection).albums, &filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ScanUpload;
    use crate::error::CatalogError;
    use kissa_common::SearchCandidate;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubCatalog {
        albums: Mutex<Vec<Album>>,
        fail: Mutex<bool>,
    }

    impl StubCatalog {
        fn error() -> CatalogError {
            CatalogError::Server {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "down".to_string(),
            }
        }
    }

    #[async_trait::async_trait]
    impl CatalogService for StubCatalog {
        async fn list_albums(&self) -> Result<Vec<Album>, CatalogError> {
            if *self.fail.lock().unwrap() {
                return Err(Self::error());
            }
            Ok(self.albums.lock().unwrap().clone())
        }

        async fn delete_album(&self, id: &AlbumId) -> Result<(), CatalogError> {
            if *self.fail.lock().unwrap() {
                return Err(Self::error());
            }
            self.albums.lock().unwrap().retain(|a| &a.id != id);
            Ok(())
        }

        async fn search_candidates(&self, _: &str) -> Result<Vec<SearchCandidate>, CatalogError> {
            Ok(Vec::new())
        }

        async fn commit_candidate(&self, _: u64) -> Result<(), CatalogError> {
            Ok(())
        }

        async fn scan_photo(&self, _: ScanUpload) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    struct Recorder(Mutex<Vec<LibraryEvent>>);

    impl LibraryListener for Recorder {
        fn on_library_event(&self, event: &LibraryEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn album(id: &str, title: &str, genres: &[&str]) -> Album {
        let mut album = Album::new(id, "Artist", title);
        album.set_genres(genres.iter().copied());
        album
    }

    fn store_with(albums: Vec<Album>) -> (Arc<StubCatalog>, LibraryStore) {
        let stub = Arc::new(StubCatalog::default());
        *stub.albums.lock().unwrap() = albums;
        let store = LibraryStore::new(stub.clone());
        (stub, store)
    }

    #[tokio::test]
    async fn test_refresh_replaces_collection_and_facets() {
        let (_, store) = store_with(vec![
            album("1", "Karma", &["Jazz"]),
            album("2", "Geogaddi", &["Electronic"]),
        ]);
        assert!(store.is_empty());

        let outcome = store.refresh().await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Applied { count: 2 });
        assert_eq!(store.len(), 2);
        assert_eq!(store.genres(), vec!["Electronic", "Jazz"]);
        assert_eq!(store.get(&AlbumId::new("2")).unwrap().title, "Geogaddi");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_collection() {
        let (stub, store) = store_with(vec![album("1", "Karma", &["Jazz"])]);
        store.refresh().await.unwrap();

        *stub.fail.lock().unwrap() = true;
        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, KissaError::Sync(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.genres(), vec!["Jazz"]);
    }

    #[tokio::test]
    async fn test_remove_notifies_listeners() {
        let (_, store) = store_with(vec![
            album("1", "Karma", &["Jazz"]),
            album("2", "Geogaddi", &["Electronic"]),
        ]);
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        store.add_listener(recorder.clone());
        let mut events = store.subscribe_events();

        store.refresh().await.unwrap();
        let removed = store.remove(&AlbumId::new("1")).await.unwrap();
        assert_eq!(removed.unwrap().title, "Karma");
        assert_eq!(store.genres(), vec!["Electronic"]);

        let seen = recorder.0.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                LibraryEvent::Refreshed { count: 2 },
                LibraryEvent::AlbumRemoved {
                    id: AlbumId::new("1")
                },
            ]
        );
        assert_eq!(events.recv().await.unwrap(), LibraryEvent::Refreshed { count: 2 });
    }

    #[tokio::test]
    async fn test_remove_of_unlisted_album_still_notifies() {
        let (_, store) = store_with(vec![album("1", "Karma", &["Jazz"])]);
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        store.add_listener(recorder.clone());

        let removed = store.remove(&AlbumId::new("1")).await.unwrap();
        assert!(removed.is_none());
        assert_eq!(
            recorder.0.lock().unwrap().clone(),
            vec![LibraryEvent::AlbumRemoved {
                id: AlbumId::new("1")
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_album() {
        let (stub, store) = store_with(vec![album("1", "Karma", &["Jazz"])]);
        store.refresh().await.unwrap();
        *stub.fail.lock().unwrap() = true;

        assert!(store.remove(&AlbumId::new("1")).await.is_err());
        assert!(store.get(&AlbumId::new("1")).is_some());
    }

    #[tokio::test]
    async fn test_filtered_view_preserves_order() {
        let (_, store) = store_with(vec![
            album("1", "Karma", &["Jazz"]),
            album("2", "Geogaddi", &["Electronic"]),
            album("3", "Promises", &["Jazz"]),
        ]);
        store.refresh().await.unwrap();

        assert_eq!(store.filtered_view("", None), store.albums());
        let jazz: Vec<String> = store
            .filtered_view("", Some("Jazz"))
            .into_iter()
            .map(|a| a.id.to_string())
            .collect();
        assert_eq!(jazz, vec!["1", "3"]);
        assert_eq!(store.filtered_view("GEO", None).len(), 1);
    }
}

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use kissa_core::catalog::{CatalogService, ScanUpload};
use kissa_core::{Album, AlbumId, CatalogError, SearchCandidate};
use reqwest::StatusCode;
use tokio::sync::oneshot;

/// Initialize tracing for tests with proper test output handling
#[allow(dead_code)]
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true)
        .try_init();
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Delete,
    Search,
    Commit,
    Scan,
}

#[allow(dead_code)]
#[derive(Default)]
struct FakeState {
    albums: Vec<Album>,
    candidates: HashMap<String, Vec<SearchCandidate>>,
    /// What a commit of each catalog id adds to the library
    releases: HashMap<u64, Album>,
    scan_result: Option<Album>,
    failing: HashMap<Op, String>,
    holds: HashMap<Op, VecDeque<oneshot::Receiver<()>>>,
    calls: HashMap<Op, usize>,
    search_queries: Vec<String>,
}

/// In-memory backend. Responses are computed when the call starts, then
/// optionally held until the test releases them.
#[allow(dead_code)]
#[derive(Default, Clone)]
pub struct FakeCatalog {
    state: Arc<Mutex<FakeState>>,
}

#[allow(dead_code)]
impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_albums(albums: Vec<Album>) -> Self {
        let fake = Self::new();
        fake.set_albums(albums);
        fake
    }

    pub fn set_albums(&self, albums: Vec<Album>) {
        self.state.lock().unwrap().albums = albums;
    }

    pub fn server_albums(&self) -> Vec<Album> {
        self.state.lock().unwrap().albums.clone()
    }

    pub fn add_candidates(&self, query: &str, candidates: Vec<SearchCandidate>) {
        self.state
            .lock()
            .unwrap()
            .candidates
            .insert(query.to_string(), candidates);
    }

    /// Album the server creates when `catalog_id` is committed
    pub fn add_release(&self, catalog_id: u64, album: Album) {
        self.state.lock().unwrap().releases.insert(catalog_id, album);
    }

    pub fn set_scan_result(&self, album: Album) {
        self.state.lock().unwrap().scan_result = Some(album);
    }

    /// Make every call of `op` fail with `message` until `recover`
    pub fn fail(&self, op: Op, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(op, message.to_string());
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().unwrap().failing.remove(&op);
    }

    /// Hold the next call of `op` until the returned sender fires
    pub fn hold_next(&self, op: Op) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .unwrap()
            .holds
            .entry(op)
            .or_default()
            .push_back(rx);
        tx
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().search_queries.clone()
    }

    /// Yield until `op` has been called `n` times
    pub async fn wait_for_calls(&self, op: Op, n: usize) {
        while self.calls(op) < n {
            tokio::task::yield_now().await;
        }
    }

    /// Count the call and check the failure switch. Returns the hold to wait
    /// on, if any.
    fn begin(&self, op: Op) -> (Option<oneshot::Receiver<()>>, Option<String>) {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(op).or_default() += 1;
        let hold = state.holds.get_mut(&op).and_then(VecDeque::pop_front);
        (hold, state.failing.get(&op).cloned())
    }

    async fn finish<T>(
        hold: Option<oneshot::Receiver<()>>,
        failure: Option<String>,
        result: T,
    ) -> Result<T, CatalogError> {
        if let Some(rx) = hold {
            let _ = rx.await;
        }
        match failure {
            Some(message) => Err(CatalogError::Server {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message,
            }),
            None => Ok(result),
        }
    }
}

#[async_trait::async_trait]
impl CatalogService for FakeCatalog {
    async fn list_albums(&self) -> Result<Vec<Album>, CatalogError> {
        let (hold, failure) = self.begin(Op::List);
        let albums = self.server_albums();
        Self::finish(hold, failure, albums).await
    }

    async fn delete_album(&self, id: &AlbumId) -> Result<(), CatalogError> {
        let (hold, failure) = self.begin(Op::Delete);
        let result = Self::finish(hold, failure, ()).await;
        if result.is_ok() {
            self.state.lock().unwrap().albums.retain(|a| &a.id != id);
        }
        result
    }

    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchCandidate>, CatalogError> {
        let (hold, failure) = self.begin(Op::Search);
        let candidates = {
            let mut state = self.state.lock().unwrap();
            state.search_queries.push(query.to_string());
            state.candidates.get(query).cloned().unwrap_or_default()
        };
        Self::finish(hold, failure, candidates).await
    }

    async fn commit_candidate(&self, catalog_id: u64) -> Result<(), CatalogError> {
        let (hold, failure) = self.begin(Op::Commit);
        Self::finish(hold, failure, ()).await?;
        let mut state = self.state.lock().unwrap();
        match state.releases.get(&catalog_id).cloned() {
            Some(album) => {
                state.albums.push(album);
                Ok(())
            }
            None => Err(CatalogError::Server {
                status: StatusCode::NOT_FOUND,
                message: "Album introuvable sur Discogs.".to_string(),
            }),
        }
    }

    async fn scan_photo(&self, _upload: ScanUpload) -> Result<(), CatalogError> {
        let (hold, failure) = self.begin(Op::Scan);
        Self::finish(hold, failure, ()).await?;
        let mut state = self.state.lock().unwrap();
        match state.scan_result.clone() {
            Some(album) => {
                state.albums.push(album);
                Ok(())
            }
            None => Err(CatalogError::Server {
                status: StatusCode::NOT_FOUND,
                message: "Texte illisible sur la photo.".to_string(),
            }),
        }
    }
}

/// Album with a Spotify link
#[allow(dead_code)]
pub fn album(id: &str, artist: &str, title: &str, genres: &[&str]) -> Album {
    let mut album = Album::new(id, artist, title);
    album.set_genres(genres.iter().copied());
    album.set_spotify_url(Some(format!(
        "https://open.spotify.com/album/sp{}",
        id.replace('-', "")
    )));
    album
}

#[allow(dead_code)]
pub fn candidate(catalog_id: u64, artist: &str, title: &str) -> SearchCandidate {
    SearchCandidate {
        catalog_id,
        title: format!("{artist} - {title}"),
        artist: artist.to_string(),
        year: "2007".to_string(),
        label: "Shitkatapult".to_string(),
        thumbnail_url: None,
    }
}

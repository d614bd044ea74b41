use kissa_common::{Album, AlbumId, SearchCandidate};

use crate::catalog::models::ScanUpload;
use crate::error::CatalogError;

/// Remote side of Kissa: the persistent library plus the catalog lookups
/// that feed it.
///
/// Every call is a single request/response with no retry.
#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Full library, in server order
    async fn list_albums(&self) -> Result<Vec<Album>, CatalogError>;

    async fn delete_album(&self, id: &AlbumId) -> Result<(), CatalogError>;

    /// Candidates for free text, in relevance order
    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchCandidate>, CatalogError>;

    /// Resolve a catalog id to full metadata and persist it as a library album
    async fn commit_candidate(&self, catalog_id: u64) -> Result<(), CatalogError>;

    /// Recognise a cover photo and persist the matching album
    async fn scan_photo(&self, upload: ScanUpload) -> Result<(), CatalogError>;
}

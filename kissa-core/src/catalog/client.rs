use kissa_common::{Album, AlbumId, SearchCandidate};
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::catalog::models::{
    AddByIdRequest, AlbumRecord, CandidateRecord, ErrorBody, ScanUpload, SearchRequest,
};
use crate::catalog::service::CatalogService;
use crate::config::Config;
use crate::error::CatalogError;

/// HTTP client for the Kissa backend
#[derive(Clone)]
pub struct KissaApiClient {
    client: Client,
    base_url: String,
}

impl KissaApiClient {
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into `CatalogError::Server`, reading the
    /// `detail` field of the error body when there is one.
    async fn check(response: Response) -> Result<Response, CatalogError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.map_err(CatalogError::from_reqwest)?;
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(error_body) => error_body.message(),
            Err(_) if !body.trim().is_empty() => body.trim().to_string(),
            Err(_) => status.canonical_reason().unwrap_or_default().to_string(),
        };
        Err(CatalogError::Server { status, message })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CatalogError> {
        let bytes = response.bytes().await.map_err(CatalogError::from_reqwest)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl CatalogService for KissaApiClient {
    async fn list_albums(&self) -> Result<Vec<Album>, CatalogError> {
        let url = self.url("/library");
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;
        let records: Vec<AlbumRecord> = match Self::check(response).await {
            Ok(response) => Self::decode(response).await?,
            Err(e) => {
                warn!("Library fetch failed: {}", e);
                return Err(e);
            }
        };
        info!("Fetched {} albums", records.len());
        Ok(records.into_iter().map(Album::from).collect())
    }

    async fn delete_album(&self, id: &AlbumId) -> Result<(), CatalogError> {
        let url = self.url(&format!("/album/{}", urlencoding::encode(id.as_str())));
        info!("DELETE {}", url);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;
        if let Err(e) = Self::check(response).await {
            warn!("Delete of album {} failed: {}", id, e);
            return Err(e);
        }
        Ok(())
    }

    async fn search_candidates(&self, query: &str) -> Result<Vec<SearchCandidate>, CatalogError> {
        let url = self.url("/search-candidates");
        info!("POST {} query={:?}", url, query);
        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query })
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;
        let records: Vec<CandidateRecord> = match Self::check(response).await {
            Ok(response) => Self::decode(response).await?,
            Err(e) => {
                warn!("Candidate search for {:?} failed: {}", query, e);
                return Err(e);
            }
        };
        info!("Search for {:?} returned {} candidates", query, records.len());
        Ok(records.into_iter().map(SearchCandidate::from).collect())
    }

    async fn commit_candidate(&self, catalog_id: u64) -> Result<(), CatalogError> {
        let url = self.url("/add-by-id");
        info!("POST {} discogs_id={}", url, catalog_id);
        let response = self
            .client
            .post(&url)
            .json(&AddByIdRequest {
                discogs_id: catalog_id,
            })
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;
        if let Err(e) = Self::check(response).await {
            warn!("Commit of catalog id {} failed: {}", catalog_id, e);
            return Err(e);
        }
        Ok(())
    }

    async fn scan_photo(&self, upload: ScanUpload) -> Result<(), CatalogError> {
        let url = self.url("/scan");
        info!(
            "POST {} file={} ({} bytes, {})",
            url,
            upload.file_name,
            upload.bytes.len(),
            upload.content_type
        );
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)?;
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(CatalogError::from_reqwest)?;
        if let Err(e) = Self::check(response).await {
            warn!("Scan failed: {}", e);
            return Err(e);
        }
        Ok(())
    }
}

use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the Kissa backend
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Server error ({status}): {message}")]
    Server { status: StatusCode, message: String },
    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}

impl CatalogError {
    /// Message reported by the backend, if it sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            CatalogError::Server { message, .. } if !message.is_empty() => Some(message),
            CatalogError::InvalidUpload(message) => Some(message),
            _ => None,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout
        } else {
            CatalogError::Request(err)
        }
    }
}

/// Failure of a user-facing operation
#[derive(Error, Debug)]
pub enum KissaError {
    #[error("Could not sync the library: {0}")]
    Sync(CatalogError),
    #[error("Search failed: {0}")]
    Search(CatalogError),
    #[error("Could not add the album: {0}")]
    Commit(CatalogError),
    #[error("Scan failed: {0}")]
    Scan(CatalogError),
    #[error("A scan is already in progress")]
    ScanBusy,
}

impl KissaError {
    /// Text for the blocking notification shown to the user.
    ///
    /// Prefers the reason given by the backend ("Album introuvable", ...)
    /// over a generic line for the operation.
    pub fn user_message(&self) -> String {
        let (fallback, source) = match self {
            KissaError::Sync(e) => ("Could not reach the library server.", e),
            KissaError::Search(e) => ("Search failed.", e),
            KissaError::Commit(e) => ("Could not add this album.", e),
            KissaError::Scan(e) => ("Could not recognise this cover.", e),
            KissaError::ScanBusy => return "A scan is already in progress.".to_string(),
        };
        match source {
            CatalogError::Timeout => format!("{fallback} The server took too long to answer."),
            other => other
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
        }
    }

    /// Underlying transport failure, if any
    pub fn catalog_error(&self) -> Option<&CatalogError> {
        match self {
            KissaError::Sync(e)
            | KissaError::Search(e)
            | KissaError::Commit(e)
            | KissaError::Scan(e) => Some(e),
            KissaError::ScanBusy => None,
        }
    }
}

mod client;
pub mod models;
mod service;

pub use client::KissaApiClient;
pub use models::ScanUpload;
pub use service::CatalogService;

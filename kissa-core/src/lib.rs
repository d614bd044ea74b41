pub mod acquisition;
pub mod catalog;
pub mod config;
mod context;
pub mod error;
pub mod library;
pub mod playback;
pub mod util;

pub use context::Kissa;
pub use error::{CatalogError, KissaError};
pub use kissa_common::{Album, AlbumId, SearchCandidate};

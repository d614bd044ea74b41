mod album;
mod library_filter;
pub mod spotify;

pub use album::{Album, AlbumId, SearchCandidate};
pub use library_filter::{filter_albums, genre_facets, LibraryFilter};

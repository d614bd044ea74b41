use crate::Album;

/// Text and genre filter applied to the library grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    /// Case-insensitive substring matched against title or artist.
    pub query: String,
    /// Exact genre name the album must carry.
    pub genre: Option<String>,
}

impl LibraryFilter {
    pub fn new(query: impl Into<String>, genre: Option<String>) -> Self {
        Self {
            query: query.into(),
            genre,
        }
    }

    pub fn matches(&self, album: &Album) -> bool {
        let needle = self.query.to_lowercase();
        let matches_text = album.title.to_lowercase().contains(&needle)
            || album.artist.to_lowercase().contains(&needle);
        let matches_genre = match &self.genre {
            Some(genre) => album.has_genre(genre),
            None => true,
        };
        matches_text && matches_genre
    }
}

/// Albums passing `filter`, in library order.
pub fn filter_albums(albums: &[Album], filter: &LibraryFilter) -> Vec<Album> {
    albums
        .iter()
        .filter(|album| filter.matches(album))
        .cloned()
        .collect()
}

/// Union of every album's genres, deduplicated and sorted.
pub fn genre_facets(albums: &[Album]) -> Vec<String> {
    let mut genres: Vec<String> = albums
        .iter()
        .flat_map(|album| album.genres.iter().cloned())
        .collect();
    genres.sort();
    genres.dedup();
    genres
}

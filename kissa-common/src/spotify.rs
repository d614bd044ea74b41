//! Spotify album links and the preview embed.

const ALBUM_SEGMENT: &str = "/album/";
const EMBED_BASE: &str = "https://open.spotify.com/embed/album/";

/// Extract the album id from a Spotify album URL.
///
/// Takes the path segment after `/album/`, stopping at a query string,
/// fragment or further path segment. Anything that does not yield a
/// non-empty alphanumeric id is `None`.
pub fn spotify_album_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once(ALBUM_SEGMENT)?;
    let end = rest.find(['?', '#', '/']).unwrap_or(rest.len());
    let id = &rest[..end];
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(id.to_string())
}

/// URL of the embeddable preview player for an album id.
pub fn embed_url(album_id: &str) -> String {
    format!("{EMBED_BASE}{album_id}?utm_source=generator&theme=0")
}

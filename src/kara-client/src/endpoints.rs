//! Server routes, relative to the configured base URL.

use kara_core::EntryId;
use url::form_urlencoded;

pub const PLAYLIST: &str = "playlist/";
pub const PLAYER_STATUS: &str = "playlist/player/status/";
pub const PLAYER_MANAGE: &str = "playlist/player/manage/";
pub const LIBRARY_SONGS: &str = "library/songs/";

pub fn playlist_entry(id: EntryId) -> String {
    format!("{PLAYLIST}{id}/")
}

/// First page of the catalog filtered by title; an empty query is unfiltered.
pub fn library_search(query: &str) -> String {
    library_url(None, query)
}

/// Last page of the catalog for `query`.
pub fn library_last(query: &str) -> String {
    library_url(Some("last"), query)
}

fn library_url(page: Option<&str>, query: &str) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    if let Some(page) = page {
        params.append_pair("page", page);
    }
    if !query.is_empty() {
        params.append_pair("title", query);
    }
    let params = params.finish();
    if params.is_empty() {
        LIBRARY_SONGS.to_string()
    } else {
        format!("{LIBRARY_SONGS}?{params}")
    }
}

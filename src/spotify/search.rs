use crate::{
    spotify::gateway::{ApiError, RequestGateway},
    types::{SearchResponse, SearchResult},
};

pub const SEARCH_TYPES: &str = "album,artist,playlist,track";

impl RequestGateway {
    /// Searches albums, artists, playlists and tracks at once.
    ///
    /// Results are flattened in the order tracks, albums, playlists, artists;
    /// `null` entries the API sometimes returns are skipped.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>, ApiError> {
        let res: SearchResponse = self
            .get(
                "/search",
                &[
                    ("limit", limit.to_string()),
                    ("type", SEARCH_TYPES.to_string()),
                    ("q", query.to_string()),
                ],
            )
            .await?;

        Ok(flatten(res))
    }
}

fn flatten(res: SearchResponse) -> Vec<SearchResult> {
    let tracks = res.tracks.items.into_iter().flatten().map(SearchResult::Track);
    let albums = res.albums.items.into_iter().flatten().map(SearchResult::Album);
    let playlists = res
        .playlists
        .items
        .into_iter()
        .flatten()
        .map(SearchResult::Playlist);
    let artists = res.artists.items.into_iter().flatten().map(SearchResult::Artist);

    tracks.chain(albums).chain(playlists).chain(artists).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_orders_kinds_and_skips_nulls() {
        let res: SearchResponse = serde_json::from_value(serde_json::json!({
            "albums": { "items": [{ "id": "al1", "name": "Album" }] },
            "artists": { "items": [{ "id": "ar1", "name": "Artist" }] },
            "playlists": { "items": [null, { "id": "pl1", "name": "Mix", "owner": { "id": "u1" } }] },
            "tracks": { "items": [{ "id": "t1", "name": "Track" }] }
        }))
        .unwrap();

        let kinds: Vec<&str> = flatten(res).iter().map(SearchResult::kind).collect();
        assert_eq!(kinds, vec!["track", "album", "playlist", "artist"]);
    }
}

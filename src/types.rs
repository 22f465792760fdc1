use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Body returned by the accounts service for both grant types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// The persisted access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A credential needs a refresh once `now + margin` reaches its expiry.
    /// Without expiry information it is treated as fresh.
    pub fn needs_refresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => now + margin >= expires_at,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub available_markets: Vec<String>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

/// A catalog track. Values are never mutated once decoded; attaching the
/// owning album produces a new value with [`Track::with_album`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub album: Option<Album>,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub explicit: bool,
}

impl Track {
    /// Returns a copy of this track pointing back at `album`.
    #[must_use]
    pub fn with_album(&self, album: Album) -> Track {
        Track {
            album: Some(album),
            ..self.clone()
        }
    }

    /// The preview clip URL, if present and well formed.
    pub fn preview_audio_url(&self) -> Option<Url> {
        self.preview_url
            .as_deref()
            .and_then(|raw| Url::parse(raw).ok())
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }

    pub fn uri(&self) -> String {
        format!("spotify:track:{}", self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
    pub owner: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub explicit_content: HashMap<String, bool>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icons: Vec<Image>,
}

/// The `items` envelope every paged endpoint uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReleasesResponse {
    pub albums: Page<Album>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturedPlaylistsResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub playlists: Page<Playlist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Page<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPlaylistsResponse {
    pub playlists: Page<Playlist>,
}

/// Search results come back with `null` holes for removed items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub albums: Page<Option<Album>>,
    pub artists: Page<Option<Artist>>,
    pub playlists: Page<Option<Playlist>>,
    pub tracks: Page<Option<Track>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Artist(Artist),
    Album(Album),
    Track(Track),
    Playlist(Playlist),
}

impl SearchResult {
    pub fn title(&self) -> &str {
        match self {
            SearchResult::Artist(a) => &a.name,
            SearchResult::Album(a) => &a.name,
            SearchResult::Track(t) => &t.name,
            SearchResult::Playlist(p) => &p.name,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SearchResult::Artist(a) => &a.id,
            SearchResult::Album(a) => &a.id,
            SearchResult::Track(t) => &t.id,
            SearchResult::Playlist(p) => &p.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SearchResult::Artist(_) => "artist",
            SearchResult::Album(_) => "album",
            SearchResult::Track(_) => "track",
            SearchResult::Playlist(_) => "playlist",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub available_markets: Vec<String>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub total_tracks: u32,
    pub tracks: Page<Track>,
}

impl AlbumDetails {
    /// The summary album record for this detail response.
    pub fn album(&self) -> Album {
        Album {
            id: self.id.clone(),
            name: self.name.clone(),
            album_type: self.album_type.clone(),
            total_tracks: self.total_tracks,
            available_markets: self.available_markets.clone(),
            external_urls: self.external_urls.clone(),
            images: self.images.clone(),
            release_date: self.release_date.clone(),
            artists: self.artists.clone(),
        }
    }

    /// Album tracks do not carry their album; hand out copies that do, so the
    /// player can show artwork.
    pub fn tracks_with_album(&self) -> Vec<Track> {
        let album = self.album();
        self.tracks
            .items
            .iter()
            .map(|t| t.with_album(album.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<String>,
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: HashMap<String, String>,
    pub owner: User,
    pub tracks: Page<PlaylistItem>,
}

impl PlaylistDetails {
    pub fn tracks(&self) -> Vec<Track> {
        self.tracks
            .items
            .iter()
            .filter_map(|item| item.track.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAlbum {
    #[serde(default)]
    pub added_at: String,
    pub album: Album,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAlbumsResponse {
    pub items: Vec<SavedAlbum>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableGenresResponse {
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackUri {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTracksFromPlaylistRequest {
    pub tracks: Vec<TrackUri>,
}

/// Everything the home screen shows.
#[derive(Debug, Clone, Default)]
pub struct HomeFeed {
    pub new_releases: Vec<Album>,
    pub featured_playlists: Vec<Playlist>,
    pub recommended_tracks: Vec<Track>,
}

/// What the player UI binds to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub title: String,
    pub subtitle: Option<String>,
    pub artwork_url: Option<Url>,
}

impl NowPlaying {
    pub fn of(track: &Track) -> Self {
        Self {
            title: track.name.clone(),
            subtitle: track.primary_artist().map(str::to_string),
            artwork_url: track
                .album
                .as_ref()
                .and_then(|a| a.images.first())
                .and_then(|img| Url::parse(&img.url).ok()),
        }
    }
}

#[derive(Tabled)]
pub struct AlbumTableRow {
    pub name: String,
    pub artists: String,
    pub released: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub owner: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    #[tabled(rename = "#")]
    pub position: usize,
    pub name: String,
    pub artists: String,
    pub preview: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct SearchTableRow {
    pub kind: String,
    pub name: String,
    pub id: String,
}

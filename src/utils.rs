use std::collections::{BTreeSet, HashSet};

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::seq::IndexedRandom;

use crate::types::{Album, Artist, Playlist, Track};

/// Maximum number of seed genres the recommendations endpoint accepts.
pub const MAX_GENRE_SEEDS: usize = 5;

/// Builds the value of an HTTP Basic `Authorization` header.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let raw = format!("{client_id}:{client_secret}");
    format!("Basic {}", STANDARD.encode(raw.as_bytes()))
}

/// Picks up to [`MAX_GENRE_SEEDS`] distinct genres at random.
pub fn pick_genre_seeds(genres: &[String]) -> BTreeSet<String> {
    let unique: Vec<&String> = {
        let mut seen = HashSet::new();
        genres.iter().filter(|g| seen.insert(*g)).collect()
    };
    let amount = unique.len().min(MAX_GENRE_SEEDS);
    unique
        .choose_multiple(&mut rand::rng(), amount)
        .map(|g| (*g).clone())
        .collect()
}

pub fn join_artist_names(artists: &[Artist]) -> String {
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn remove_duplicate_albums(albums: &mut Vec<Album>) {
    let mut seen_ids = HashSet::new();
    albums.retain(|album| seen_ids.insert(album.id.clone()));
}

pub fn remove_duplicate_playlists(playlists: &mut Vec<Playlist>) {
    let mut seen_ids = HashSet::new();
    playlists.retain(|playlist| seen_ids.insert(playlist.id.clone()));
}

/// Formats a track duration as `m:ss`.
pub fn format_duration(duration_ms: u64) -> String {
    let secs = duration_ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Parses a volume given in percent (`0`-`100`) into the `0.0..=1.0` range.
pub fn parse_volume(input: &str) -> Result<f32, String> {
    let percent: u8 = input
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| format!("`{input}` is not a volume between 0 and 100"))?;
    if percent > 100 {
        return Err(format!("`{input}` is not a volume between 0 and 100"));
    }
    Ok(f32::from(percent) / 100.0)
}

/// Counts how many of `tracks` can actually be previewed.
pub fn playable_count(tracks: &[Track]) -> usize {
    tracks
        .iter()
        .filter(|t| t.preview_audio_url().is_some())
        .count()
}

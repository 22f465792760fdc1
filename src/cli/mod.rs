//! # CLI Module
//!
//! User-facing commands. Each command receives the [`Session`] built at
//! startup, calls into the gateway, the credential manager or the playback
//! controller, and renders the outcome with the colored log macros, spinners
//! and tables.
//!
//! ## Commands
//!
//! - [`auth`], [`logout`], [`status`] - sign in through the local callback
//!   server, forget the stored credential, show who is signed in
//! - [`home`] - new releases, featured playlists and recommended tracks
//! - [`new_releases`], [`featured_playlists`], [`categories`],
//!   [`category_playlists`] - browse the catalog
//! - [`search`] - search albums, artists, playlists and tracks at once
//! - [`album`], [`playlist`] - show a single album or playlist
//! - [`saved_albums`], [`user_playlists`] - the user's library
//! - [`create_playlist`], [`add_track`], [`remove_track`] - edit playlists
//! - [`play`] - play previews of an album, a playlist or a track with
//!   interactive transport controls
//!
//! ## Usage Patterns
//!
//! ```bash
//! spotlite auth
//! spotlite home
//! spotlite search "daft punk"
//! spotlite album 4m2880jivSbbyEGAKfITCa --save
//! spotlite play album 4m2880jivSbbyEGAKfITCa
//! ```
//!
//! Commands terminate the process through `error!` when they cannot do
//! anything useful; the library modules they call never do.
//!
//! [`Session`]: crate::management::Session

mod account;
mod browse;
mod library;
mod play;
mod search;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::{Table, Tabled};

use crate::{
    info,
    management::AuthError,
    spotify::gateway::ApiError,
    types::{Album, AlbumTableRow, Playlist, PlaylistTableRow, Track, TrackTableRow},
    utils,
};

pub use account::{auth, logout, status};
pub use browse::{categories, category_playlists, featured_playlists, home, new_releases};
pub use library::{
    add_track, album, create_playlist, playlist, remove_track, saved_albums, user_playlists,
};
pub use play::{PlaySource, play};
pub use search::search;

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        info!("Nothing to show.");
        return;
    }
    println!("{}", Table::new(rows));
}

fn album_rows(albums: &[Album]) -> Vec<AlbumTableRow> {
    albums
        .iter()
        .map(|a| AlbumTableRow {
            name: a.name.clone(),
            artists: utils::join_artist_names(&a.artists),
            released: a.release_date.clone(),
            id: a.id.clone(),
        })
        .collect()
}

fn playlist_rows(playlists: &[Playlist]) -> Vec<PlaylistTableRow> {
    playlists
        .iter()
        .map(|p| PlaylistTableRow {
            name: p.name.clone(),
            owner: p
                .owner
                .display_name
                .clone()
                .unwrap_or_else(|| p.owner.id.clone()),
            id: p.id.clone(),
        })
        .collect()
}

fn track_rows(tracks: &[Track]) -> Vec<TrackTableRow> {
    tracks
        .iter()
        .enumerate()
        .map(|(i, t)| TrackTableRow {
            position: i + 1,
            name: t.name.clone(),
            artists: utils::join_artist_names(&t.artists),
            preview: if t.preview_audio_url().is_some() {
                utils::format_duration(t.duration_ms)
            } else {
                "-".to_string()
            },
            id: t.id.clone(),
        })
        .collect()
}

/// Turns an API failure into something a user can act on.
fn describe(err: &ApiError) -> String {
    match err {
        ApiError::Auth(AuthError::SignedOut) => {
            "Not signed in. Run `spotlite auth` first.".to_string()
        }
        ApiError::Auth(AuthError::MissingRefreshToken) => {
            "The stored session cannot be renewed. Run `spotlite auth` again.".to_string()
        }
        ApiError::RateLimited {
            retry_after: Some(secs),
        } => format!("Spotify is rate limiting requests. Try again in {secs} seconds."),
        other => other.to_string(),
    }
}

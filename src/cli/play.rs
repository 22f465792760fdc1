use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    cli::{describe, print_table, spinner, track_rows},
    error, info,
    management::Session,
    playback::{PlaybackError, PlaybackHandle},
    types::{NowPlaying, Track},
    utils, warning,
};

/// What `play` should load.
#[derive(Debug, Clone)]
pub enum PlaySource {
    Album(String),
    Playlist(String),
    Track(String),
}

const CONTROLS: &str = "Controls: [p] play/pause  [n] next  [b] back  [v 0-100] volume  [q] quit";

/// Plays previews and reads transport commands from stdin until `q`.
pub async fn play(session: &Session, source: PlaySource, start: usize) {
    let handle = spawn_player();

    match source {
        PlaySource::Track(id) => {
            let track = match session.gateway.track(&id).await {
                Ok(track) => track,
                Err(e) => error!("Cannot fetch track {}: {}", id, describe(&e)),
            };
            match handle.play_track(track).await {
                Ok(true) => {}
                Ok(false) => {
                    warning!("This track has no preview.");
                    return;
                }
                Err(e) => error!("{}", e),
            }
        }
        PlaySource::Album(id) => {
            let pb = spinner("Fetching album...");
            let details = session.gateway.album_details(&id).await;
            pb.finish_and_clear();
            match details {
                Ok(details) => start_queue(&handle, details.tracks_with_album(), start).await,
                Err(e) => error!("Cannot fetch album {}: {}", id, describe(&e)),
            }
        }
        PlaySource::Playlist(id) => {
            let pb = spinner("Fetching playlist...");
            let details = session.gateway.playlist_details(&id).await;
            pb.finish_and_clear();
            match details {
                Ok(details) => start_queue(&handle, details.tracks(), start).await,
                Err(e) => error!("Cannot fetch playlist {}: {}", id, describe(&e)),
            }
        }
    }

    info!("{}", CONTROLS);
    if let Err(e) = control_loop(&handle).await {
        error!("{}", e);
    }
}

async fn start_queue(handle: &PlaybackHandle, tracks: Vec<Track>, start: usize) {
    let playable = utils::playable_count(&tracks);
    if playable == 0 {
        error!("None of these tracks has a preview.");
    }
    if playable < tracks.len() {
        warning!(
            "{} of {} tracks have no preview and are skipped.",
            tracks.len() - playable,
            tracks.len()
        );
    }
    print_table(track_rows(&tracks));

    if let Err(e) = handle.play_queue(tracks, start).await {
        error!("Cannot start playback: {}", e);
    }
}

async fn control_loop(handle: &PlaybackHandle) -> Result<(), PlaybackError> {
    let mut now_playing = handle.now_playing();
    show(now_playing.borrow_and_update().as_ref());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            changed = now_playing.changed() => {
                if changed.is_err() {
                    return Err(PlaybackError::ControllerGone);
                }
                show(now_playing.borrow_and_update().as_ref());
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else {
                    return Ok(());
                };
                let mut parts = line.split_whitespace();
                match parts.next() {
                    Some("p") => handle.toggle_play_pause().await?,
                    Some("n") => handle.next().await?,
                    Some("b") => handle.previous().await?,
                    Some("v") => match parts.next().map(utils::parse_volume) {
                        Some(Ok(volume)) => handle.set_volume(volume).await?,
                        Some(Err(e)) => warning!("{}", e),
                        None => warning!("Usage: v <0-100>"),
                    },
                    Some("q") => return Ok(()),
                    Some(_) => info!("{}", CONTROLS),
                    None => {}
                }
            }
        }
    }
}

fn show(now_playing: Option<&NowPlaying>) {
    match now_playing {
        Some(np) => match &np.subtitle {
            Some(artist) => info!("Now playing: {} - {}", np.title, artist),
            None => info!("Now playing: {}", np.title),
        },
        None => info!("Nothing is playing."),
    }
}

#[cfg(feature = "audio")]
fn spawn_player() -> PlaybackHandle {
    use crate::playback::RodioEngine;

    match PlaybackHandle::spawn_with(RodioEngine::new) {
        Ok((handle, _task)) => handle,
        Err(e) => error!("Cannot open audio output: {}", e),
    }
}

#[cfg(not(feature = "audio"))]
fn spawn_player() -> PlaybackHandle {
    error!("This build has no audio output. Rebuild with `--features audio` to play previews.")
}

use crate::{
    cli::{album_rows, describe, playlist_rows, print_table, spinner, track_rows},
    error, info,
    management::Session,
    success,
    types::Track,
    utils, warning,
};

pub async fn album(session: &Session, album_id: &str, save: bool) {
    let pb = spinner("Fetching album...");
    let details = session.gateway.album_details(album_id).await;
    pb.finish_and_clear();

    let details = match details {
        Ok(details) => details,
        Err(e) => error!("Cannot fetch album {}: {}", album_id, describe(&e)),
    };

    info!(
        "{} by {} ({})",
        details.name,
        utils::join_artist_names(&details.artists),
        details.release_date
    );
    let tracks = details.tracks_with_album();
    print_table(track_rows(&tracks));

    if save {
        match session.gateway.save_album(album_id).await {
            Ok(()) => success!("Saved {} to your library.", details.name),
            Err(e) => warning!("Cannot save album: {}", describe(&e)),
        }
    }
}

pub async fn playlist(session: &Session, playlist_id: &str) {
    let pb = spinner("Fetching playlist...");
    let details = session.gateway.playlist_details(playlist_id).await;
    pb.finish_and_clear();

    match details {
        Ok(details) => {
            info!(
                "{} by {}",
                details.name,
                details
                    .owner
                    .display_name
                    .as_deref()
                    .unwrap_or(&details.owner.id)
            );
            if let Some(description) = details.description.as_deref().filter(|d| !d.is_empty()) {
                info!("{}", description);
            }
            print_table(track_rows(&details.tracks()));
        }
        Err(e) => error!("Cannot fetch playlist {}: {}", playlist_id, describe(&e)),
    }
}

pub async fn saved_albums(session: &Session) {
    let pb = spinner("Fetching saved albums...");
    let albums = session.gateway.current_user_albums().await;
    pb.finish_and_clear();

    match albums {
        Ok(albums) => print_table(album_rows(&albums)),
        Err(e) => error!("Cannot fetch saved albums: {}", describe(&e)),
    }
}

pub async fn user_playlists(session: &Session, limit: u32) {
    let pb = spinner("Fetching playlists...");
    let playlists = session.gateway.current_user_playlists(limit).await;
    pb.finish_and_clear();

    match playlists {
        Ok(playlists) => print_table(playlist_rows(&playlists)),
        Err(e) => error!("Cannot fetch playlists: {}", describe(&e)),
    }
}

pub async fn create_playlist(session: &Session, name: &str) {
    if name.trim().is_empty() {
        error!("Playlist name must not be empty.");
    }

    match session.gateway.create_playlist(name).await {
        Ok(playlist) => success!("Created playlist {} ({}).", playlist.name, playlist.id),
        Err(e) => error!("Cannot create playlist: {}", describe(&e)),
    }
}

pub async fn add_track(session: &Session, playlist_id: &str, track_id: &str) {
    let track = fetch_track(session, track_id).await;
    match session
        .gateway
        .add_track_to_playlist(&track, playlist_id)
        .await
    {
        Ok(snapshot) => success!("Added {} (snapshot {}).", track.name, snapshot),
        Err(e) => error!("Cannot add {} to the playlist: {}", track.name, describe(&e)),
    }
}

pub async fn remove_track(session: &Session, playlist_id: &str, track_id: &str) {
    let track = fetch_track(session, track_id).await;
    match session
        .gateway
        .remove_track_from_playlist(&track, playlist_id)
        .await
    {
        Ok(snapshot) => success!("Removed {} (snapshot {}).", track.name, snapshot),
        Err(e) => error!(
            "Cannot remove {} from the playlist: {}",
            track.name,
            describe(&e)
        ),
    }
}

async fn fetch_track(session: &Session, track_id: &str) -> Track {
    match session.gateway.track(track_id).await {
        Ok(track) => track,
        Err(e) => error!("Cannot fetch track {}: {}", track_id, describe(&e)),
    }
}

use tabled::Tabled;

use crate::{
    cli::{album_rows, describe, playlist_rows, print_table, spinner, track_rows},
    error, info,
    management::Session,
};

#[derive(Tabled)]
struct CategoryTableRow {
    name: String,
    id: String,
}

pub async fn home(session: &Session) {
    let pb = spinner("Loading home feed...");
    let feed = session.gateway.home_feed().await;
    pb.finish_and_clear();

    let feed = match feed {
        Ok(feed) => feed,
        Err(e) => error!("Cannot load the home feed: {}", describe(&e)),
    };

    info!("New releases");
    print_table(album_rows(&feed.new_releases));
    info!("Featured playlists");
    print_table(playlist_rows(&feed.featured_playlists));
    if !feed.recommended_tracks.is_empty() {
        info!("Recommended for you");
        print_table(track_rows(&feed.recommended_tracks));
    }
}

pub async fn new_releases(session: &Session, limit: u32) {
    let pb = spinner("Fetching new releases...");
    let albums = session.gateway.new_releases(limit).await;
    pb.finish_and_clear();

    match albums {
        Ok(albums) => print_table(album_rows(&albums)),
        Err(e) => error!("Cannot fetch new releases: {}", describe(&e)),
    }
}

pub async fn featured_playlists(session: &Session, limit: u32) {
    let pb = spinner("Fetching featured playlists...");
    let playlists = session.gateway.featured_playlists(limit).await;
    pb.finish_and_clear();

    match playlists {
        Ok(playlists) => print_table(playlist_rows(&playlists)),
        Err(e) => error!("Cannot fetch featured playlists: {}", describe(&e)),
    }
}

pub async fn categories(session: &Session, limit: u32) {
    let pb = spinner("Fetching categories...");
    let categories = session.gateway.categories(limit).await;
    pb.finish_and_clear();

    match categories {
        Ok(categories) => print_table(
            categories
                .into_iter()
                .map(|c| CategoryTableRow {
                    name: c.name,
                    id: c.id,
                })
                .collect(),
        ),
        Err(e) => error!("Cannot fetch categories: {}", describe(&e)),
    }
}

pub async fn category_playlists(session: &Session, category_id: &str, limit: u32) {
    let pb = spinner("Fetching category playlists...");
    let playlists = session
        .gateway
        .category_playlists(category_id, limit)
        .await;
    pb.finish_and_clear();

    match playlists {
        Ok(playlists) => print_table(playlist_rows(&playlists)),
        Err(e) => error!(
            "Cannot fetch playlists for category {}: {}",
            category_id,
            describe(&e)
        ),
    }
}

use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::{
    spotify::gateway::{ApiError, RequestGateway},
    types::{
        AddTracksToPlaylistRequest, Album, AlbumDetails, CreatePlaylistRequest, Page, Playlist,
        PlaylistDetails, RemoveTracksFromPlaylistRequest, SavedAlbumsResponse, Track, TrackUri,
        UserProfile,
    },
};

impl RequestGateway {
    /// `GET /me`
    pub async fn current_user_profile(&self) -> Result<UserProfile, ApiError> {
        self.get("/me", &[]).await
    }

    /// `GET /tracks/{id}`
    pub async fn track(&self, track_id: &str) -> Result<Track, ApiError> {
        self.get(&format!("/tracks/{track_id}"), &[]).await
    }

    /// `GET /albums/{id}`
    pub async fn album_details(&self, album_id: &str) -> Result<AlbumDetails, ApiError> {
        self.get(&format!("/albums/{album_id}"), &[]).await
    }

    /// `GET /playlists/{id}`
    pub async fn playlist_details(&self, playlist_id: &str) -> Result<PlaylistDetails, ApiError> {
        self.get(&format!("/playlists/{playlist_id}"), &[]).await
    }

    /// `GET /me/albums`
    pub async fn current_user_albums(&self) -> Result<Vec<Album>, ApiError> {
        let res: SavedAlbumsResponse = self.get("/me/albums", &[]).await?;
        Ok(res.items.into_iter().map(|saved| saved.album).collect())
    }

    /// `GET /me/playlists`
    pub async fn current_user_playlists(&self, limit: u32) -> Result<Vec<Playlist>, ApiError> {
        let res: Page<Playlist> = self
            .get("/me/playlists", &[("limit", limit.to_string())])
            .await?;
        Ok(res.items)
    }

    /// `PUT /me/albums?ids={id}`. Only a plain `200 OK` counts as saved.
    pub async fn save_album(&self, album_id: &str) -> Result<(), ApiError> {
        let (status, _) = self
            .send_json::<Value>(Method::PUT, "/me/albums", &[("ids", album_id.to_string())], None)
            .await?;

        if status != StatusCode::OK {
            return Err(ApiError::Rejected(format!(
                "saving album {album_id} answered {status}"
            )));
        }
        Ok(())
    }

    /// Creates a playlist owned by the signed-in user.
    ///
    /// Looks up the user id through `/me` first, then posts to
    /// `/users/{user_id}/playlists`. The playlist counts as created only when
    /// the answer carries an `id`.
    pub async fn create_playlist(&self, name: &str) -> Result<Playlist, ApiError> {
        let profile = self.current_user_profile().await?;
        let path = format!("/users/{}/playlists", profile.id);
        let body = CreatePlaylistRequest {
            name: name.to_string(),
        };

        let (_, json) = self.send_json(Method::POST, &path, &[], Some(&body)).await?;
        if json.get("id").and_then(Value::as_str).is_none() {
            return Err(ApiError::Rejected(format!(
                "creating playlist {name} returned no id"
            )));
        }

        serde_json::from_value(json).map_err(|source| ApiError::Decode {
            endpoint: path,
            source,
        })
    }

    /// `POST /playlists/{id}/tracks`. Returns the new snapshot id.
    pub async fn add_track_to_playlist(
        &self,
        track: &Track,
        playlist_id: &str,
    ) -> Result<String, ApiError> {
        let body = AddTracksToPlaylistRequest {
            uris: vec![track.uri()],
        };
        let path = format!("/playlists/{playlist_id}/tracks");
        let (_, json) = self.send_json(Method::POST, &path, &[], Some(&body)).await?;
        snapshot_id(json, "adding track")
    }

    /// `DELETE /playlists/{id}/tracks`. Returns the new snapshot id.
    pub async fn remove_track_from_playlist(
        &self,
        track: &Track,
        playlist_id: &str,
    ) -> Result<String, ApiError> {
        let body = RemoveTracksFromPlaylistRequest {
            tracks: vec![TrackUri { uri: track.uri() }],
        };
        let path = format!("/playlists/{playlist_id}/tracks");
        let (_, json) = self
            .send_json(Method::DELETE, &path, &[], Some(&body))
            .await?;
        snapshot_id(json, "removing track")
    }
}

fn snapshot_id(json: Value, action: &str) -> Result<String, ApiError> {
    json.get("snapshot_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Rejected(format!("{action} returned no snapshot_id")))
}

//! # Spotify Integration Module
//!
//! This module is the integration layer between Spotlite and the Spotify Web
//! API. It handles the OAuth token endpoint and every authenticated call the
//! application makes.
//!
//! ## Architecture
//!
//! ```text
//! Application Layer (CLI, Playback)
//!          ↓
//! RequestGateway (bearer token from the CredentialManager)
//!     ├── Browse (new releases, featured playlists, categories, recommendations)
//!     ├── Search
//!     └── Library (profile, albums, playlists, playlist editing)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! - [`auth`] - [`auth::AccountsClient`], the token endpoint client used for
//!   the authorization-code exchange and for refreshes. Requests use HTTP
//!   Basic of the client id and secret.
//! - [`gateway`] - [`gateway::RequestGateway`], which obtains a valid token
//!   before every request and turns responses into typed results.
//! - [`browse`], [`search`], [`library`] - one method on the gateway per
//!   endpoint.
//!
//! ## API Coverage
//!
//! | Purpose | Method | Path |
//! |---|---|---|
//! | New releases | GET | `/browse/new-releases?limit=N` |
//! | Featured playlists | GET | `/browse/featured-playlists?limit=N` |
//! | Categories | GET | `/browse/categories?limit=N` |
//! | Category playlists | GET | `/browse/categories/{id}/playlists` |
//! | Genre seeds | GET | `/recommendations/available-genre-seeds` |
//! | Recommendations | GET | `/recommendations?seed_genres=...` |
//! | Search | GET | `/search?type=album,artist,playlist,track&q=...` |
//! | Track | GET | `/tracks/{id}` |
//! | Album details | GET | `/albums/{id}` |
//! | Playlist details | GET | `/playlists/{id}` |
//! | Current user profile | GET | `/me` |
//! | Saved albums | GET | `/me/albums` |
//! | User playlists | GET | `/me/playlists` |
//! | Save album | PUT | `/me/albums?ids={id}` |
//! | Create playlist | POST | `/users/{user_id}/playlists` |
//! | Add track to playlist | POST | `/playlists/{id}/tracks` |
//! | Remove track from playlist | DELETE | `/playlists/{id}/tracks` |
//!
//! ## Error Handling
//!
//! Nothing is retried automatically. Transport failures, undecodable bodies,
//! non-success statuses and rate limiting are reported as distinct
//! [`gateway::ApiError`] variants so presentation code can pick between an
//! alert and a silent retry.

pub mod auth;
pub mod browse;
pub mod gateway;
pub mod library;
pub mod search;

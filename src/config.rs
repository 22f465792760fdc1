//! Configuration management for Spotlite.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage application
//! configuration including Spotify API credentials, server settings, and other
//! runtime parameters.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use thiserror::Error;

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_SCOPE: &str = "user-read-private playlist-modify-public playlist-read-private playlist-modify-private user-follow-read user-library-modify user-library-read user-read-email";

/// Seconds before expiry at which a token is considered due for refresh.
pub const DEFAULT_REFRESH_MARGIN_SECS: i64 = 300;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),
    #[error("invalid configuration value {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("cannot prepare configuration directory: {0}")]
    Io(String),
}

/// Static client configuration used for the OAuth flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl AuthConfig {
    /// Gathers the OAuth client configuration from the environment.
    ///
    /// Client id, client secret and redirect URI are required. Scope and the
    /// two accounts-service URLs fall back to the public defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: spotify_client_id().ok_or(ConfigError::Missing("SPOTIFY_API_AUTH_CLIENT_ID"))?,
            client_secret: spotify_client_secret()
                .ok_or(ConfigError::Missing("SPOTIFY_API_AUTH_CLIENT_SECRET"))?,
            redirect_uri: spotify_redirect_uri()
                .ok_or(ConfigError::Missing("SPOTIFY_API_REDIRECT_URI"))?,
            scope: spotify_scope().unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            authorize_url: spotify_apiauth_url().unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: spotify_apitoken_url().unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
        })
    }
}

/// Settings for the Web API and the local callback server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub server_addr: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: spotify_apiurl().unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            server_addr: server_addr().unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
        }
    }
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the necessary directory structure if it doesn't exist and loads
/// environment variables from `spotlite/.env` under the platform-specific
/// local data directory. A missing `.env` file is not an error: every value
/// can also come from the process environment.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotlite/.env`
/// - macOS: `~/Library/Application Support/spotlite/.env`
/// - Windows: `%LOCALAPPDATA%/spotlite/.env`
///
/// # Errors
///
/// Returns an error if the directory cannot be created or if an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), ConfigError> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| ConfigError::Io(e.to_string()))?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| ConfigError::Invalid {
            key: ".env",
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// Returns the directory where Spotlite keeps its `.env` and preferences.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotlite");
    path
}

/// Returns the address the local OAuth callback server binds to
/// (`SERVER_ADDRESS`, e.g. `127.0.0.1:8888`).
pub fn server_addr() -> Option<String> {
    non_empty("SERVER_ADDRESS")
}

/// Returns the client id registered on the Spotify developer dashboard
/// (`SPOTIFY_API_AUTH_CLIENT_ID`).
pub fn spotify_client_id() -> Option<String> {
    non_empty("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// Returns the client secret (`SPOTIFY_API_AUTH_CLIENT_SECRET`).
///
/// # Security Note
///
/// The client secret should be kept confidential and never exposed in logs
/// or version control.
pub fn spotify_client_secret() -> Option<String> {
    non_empty("SPOTIFY_API_AUTH_CLIENT_SECRET")
}

/// Returns the OAuth redirect URI (`SPOTIFY_API_REDIRECT_URI`). It must match
/// the redirect URI registered in the Spotify application settings.
pub fn spotify_redirect_uri() -> Option<String> {
    non_empty("SPOTIFY_API_REDIRECT_URI")
}

/// Returns the space separated scopes requested during sign-in
/// (`SPOTIFY_API_AUTH_SCOPE`).
pub fn spotify_scope() -> Option<String> {
    non_empty("SPOTIFY_API_AUTH_SCOPE")
}

/// Returns the OAuth authorization URL (`SPOTIFY_API_AUTH_URL`).
pub fn spotify_apiauth_url() -> Option<String> {
    non_empty("SPOTIFY_API_AUTH_URL")
}

/// Returns the Web API base URL (`SPOTIFY_API_URL`).
pub fn spotify_apiurl() -> Option<String> {
    non_empty("SPOTIFY_API_URL")
}

/// Returns the OAuth token exchange URL (`SPOTIFY_API_TOKEN_URL`).
pub fn spotify_apitoken_url() -> Option<String> {
    non_empty("SPOTIFY_API_TOKEN_URL")
}

/// Returns how long before expiry a token gets refreshed.
///
/// Reads `SPOTLITE_REFRESH_MARGIN_SECS`; unparsable or negative values fall
/// back to [`DEFAULT_REFRESH_MARGIN_SECS`].
pub fn refresh_margin() -> chrono::Duration {
    let secs = non_empty("SPOTLITE_REFRESH_MARGIN_SECS")
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v >= 0)
        .unwrap_or(DEFAULT_REFRESH_MARGIN_SECS);
    chrono::Duration::seconds(secs)
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

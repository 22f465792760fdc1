//! Spotlite Library
//!
//! This library provides the building blocks of a small Spotify Web API client:
//! an OAuth credential manager that keeps every request behind a valid access
//! token, a request gateway for the catalog and library endpoints, and a
//! playback controller that drives preview clips through an audio engine.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `management` - Credential lifecycle and the durable preference store
//! - `playback` - Play queue, transport controls and the audio engine seam
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```
//! use spotlite::{config, management};
//!
//! #[tokio::main]
//! async fn main() -> spotlite::Res<()> {
//!     config::load_env().await?;
//!     let session = management::Session::open().await?;
//!     println!("signed in: {}", session.credentials.is_signed_in());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod management;
pub mod playback;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for command-level glue code.
///
/// Core components return their own typed errors; this alias is used where
/// several of them meet, such as CLI commands and application startup.
///
/// # Example
///
/// ```
/// use spotlite::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Refreshing access token...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Used to provide positive feedback when operations complete successfully.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// success!("Saved album {}", name);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// This macro terminates the process with exit code 1. It is meant for the
/// command-line layer only; library components return typed errors instead.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable issues such as a failed token refresh or a response
/// body that could not be decoded.
///
/// # Example
///
/// ```
/// warning!("Token refresh failed: {}", err);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}

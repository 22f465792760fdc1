//! # API Module
//!
//! HTTP endpoints served by the local callback server while the user signs
//! in with Spotify.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the authorization-code redirect, exchanges the
//!   code through the [`crate::management::CredentialManager`] and publishes
//!   the [`SignInOutcome`] to whoever is waiting. A redirect without a `code`
//!   (for example `?error=access_denied`) counts as a failed sign-in.
//! - [`health`] - Status, version and whether a credential is stored.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use spotlite::api::{CallbackState, callback, health};
//!
//! let state = CallbackState::new(credentials);
//! let app = Router::new()
//!     .route("/callback", get(callback::<FileStore, AccountsClient>))
//!     .route("/health", get(health::<FileStore, AccountsClient>))
//!     .layer(Extension(state));
//! ```

mod callback;
mod health;

pub use callback::{CallbackState, SignInOutcome, callback};
pub use health::health;

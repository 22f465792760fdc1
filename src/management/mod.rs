mod auth;
mod session;
mod store;

pub use auth::AuthError;
pub use auth::CredentialManager;
pub use auth::TokenEndpoint;
pub use auth::TokenSource;
pub use session::Credentials;
pub use session::Session;
pub use store::FileStore;
pub use store::KEY_ACCESS_TOKEN;
pub use store::KEY_EXPIRES_AT;
pub use store::KEY_REFRESH_TOKEN;
pub use store::MemoryStore;
pub use store::PreferenceStore;
pub use store::StoreError;

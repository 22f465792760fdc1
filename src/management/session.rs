use std::sync::Arc;

use crate::{
    Res,
    config::{self, ApiConfig, AuthConfig},
    management::{CredentialManager, FileStore},
    spotify::{auth::AccountsClient, gateway::RequestGateway},
};

/// The credential manager used by the application: preferences on disk,
/// tokens from the Spotify accounts service.
pub type Credentials = CredentialManager<FileStore, AccountsClient>;

/// Services that live for one application session.
///
/// Built once at startup and handed to whoever needs them; nothing in the
/// crate reaches for global state.
#[derive(Clone)]
pub struct Session {
    pub credentials: Arc<Credentials>,
    pub gateway: RequestGateway,
    pub api: ApiConfig,
}

impl Session {
    /// Reads configuration from the environment and loads the stored
    /// credential from the data directory.
    pub async fn open() -> Res<Self> {
        let auth = AuthConfig::from_env()?;
        let api = ApiConfig::from_env();
        let store = FileStore::load_default().await?;
        Ok(Self::assemble(auth, api, store))
    }

    pub fn assemble(auth: AuthConfig, api: ApiConfig, store: FileStore) -> Self {
        let http = reqwest::Client::new();
        let accounts = AccountsClient::new(auth.clone(), http.clone());
        let credentials = Arc::new(
            CredentialManager::new(auth, store, accounts)
                .with_refresh_margin(config::refresh_margin()),
        );
        let gateway = RequestGateway::new(credentials.clone(), http, &api.base_url);

        Self {
            credentials,
            gateway,
            api,
        }
    }
}

use async_trait::async_trait;
use reqwest::{Client, header::AUTHORIZATION};

use crate::{
    config::AuthConfig,
    management::{AuthError, TokenEndpoint},
    types::TokenResponse,
    utils,
};

/// Talks to the Spotify accounts service token endpoint.
///
/// Both grant types are sent as form posts authenticated with HTTP Basic of
/// the client id and secret.
#[derive(Clone)]
pub struct AccountsClient {
    config: AuthConfig,
    http: Client,
}

impl AccountsClient {
    pub fn new(config: AuthConfig, http: Client) -> Self {
        Self { config, http }
    }

    /// Posts a grant to the token endpoint and decodes the token response.
    ///
    /// # Error Conditions
    ///
    /// - network failures map to [`AuthError::Transport`]
    /// - non-2xx answers (invalid code, revoked refresh token, bad client
    ///   credentials) map to [`AuthError::Rejected`] with the response body
    /// - bodies that are not a token response map to [`AuthError::Decode`]
    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let res = self
            .http
            .post(&self.config.token_url)
            .header(
                AUTHORIZATION,
                utils::basic_auth_header(&self.config.client_id, &self.config.client_secret),
            )
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| AuthError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TokenEndpoint for AccountsClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

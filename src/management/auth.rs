use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::{
    config::{AuthConfig, DEFAULT_REFRESH_MARGIN_SECS},
    info,
    management::store::{KEY_ACCESS_TOKEN, KEY_EXPIRES_AT, KEY_REFRESH_TOKEN, PreferenceStore},
    types::{Credential, TokenResponse},
    warning,
};

/// Failures of the sign-in and token refresh flows.
///
/// The type is `Clone` because the outcome of a single refresh is handed to
/// every caller that queued up behind it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("not signed in")]
    SignedOut,
    #[error("stored credential has no refresh token")]
    MissingRefreshToken,
    #[error("token request failed: {0}")]
    Transport(String),
    #[error("token response could not be decoded: {0}")]
    Decode(String),
    #[error("token request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("cannot persist credential: {0}")]
    Store(String),
    #[error("token refresh was abandoned before it completed")]
    Cancelled,
    #[error("signed out while the token refresh was in flight")]
    Superseded,
}

/// The network side of the OAuth flows.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchanges an authorization code for a token pair.
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError>;

    /// Trades a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

/// Anything that can hand out an access token that is good to use right now.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn valid_token(&self) -> Result<String, AuthError>;
}

type Waiter = oneshot::Sender<Result<String, AuthError>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    // bumped on sign-in and sign-out; a refresh started under an older
    // generation must not write its result
    generation: u64,
    waiters: Vec<Waiter>,
}

enum Plan {
    Ready(String),
    Wait(oneshot::Receiver<Result<String, AuthError>>),
    Refresh { refresh_token: String, generation: u64 },
}

/// Owns the OAuth credential and gates every authenticated request behind a
/// token that stays valid for at least the refresh margin.
///
/// At most one refresh request is outstanding at any time. Callers that ask
/// for a token while a refresh is in flight are queued and receive the
/// outcome of that refresh, in the order they arrived.
///
/// The manager is constructed once per application session and shared by
/// reference (usually `Arc<CredentialManager<..>>`).
pub struct CredentialManager<S, E> {
    config: AuthConfig,
    store: S,
    endpoint: E,
    margin: Duration,
    refresh: Mutex<RefreshState>,
}

impl<S, E> CredentialManager<S, E>
where
    S: PreferenceStore,
    E: TokenEndpoint,
{
    pub fn new(config: AuthConfig, store: S, endpoint: E) -> Self {
        Self {
            config,
            store,
            endpoint,
            margin: Duration::seconds(DEFAULT_REFRESH_MARGIN_SECS),
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Builds the authorization-code request URL the user signs in at.
    ///
    /// Returns `None` when the client configuration cannot produce a URL.
    pub fn sign_in_url(&self) -> Option<Url> {
        if self.config.client_id.is_empty() || self.config.redirect_uri.is_empty() {
            return None;
        }

        Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("scope", self.config.scope.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("show_dialog", "TRUE"),
            ],
        )
        .ok()
    }

    pub fn is_signed_in(&self) -> bool {
        self.store.get(KEY_ACCESS_TOKEN).is_some()
    }

    /// The persisted credential, if signed in.
    pub fn credential(&self) -> Option<Credential> {
        let access_token = self.store.get(KEY_ACCESS_TOKEN)?;
        let expires_at = self
            .store
            .get(KEY_EXPIRES_AT)
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|at| at.with_timezone(&Utc));

        Some(Credential {
            access_token,
            refresh_token: self.store.get(KEY_REFRESH_TOKEN),
            expires_at,
        })
    }

    pub fn is_refreshing(&self) -> bool {
        self.state().in_flight
    }

    /// Number of callers currently queued behind an in-flight refresh.
    pub fn pending_waiters(&self) -> usize {
        self.state().waiters.len()
    }

    /// Exchanges the authorization code from the sign-in redirect for a
    /// credential and stores it.
    ///
    /// A rejected exchange keeps the previous state. `AuthError::Store` means
    /// the user is signed in for this process but the credential did not
    /// reach the disk.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<(), AuthError> {
        let response = self.endpoint.exchange_code(code).await.inspect_err(|e| {
            warning!("Token exchange failed: {}", e);
        })?;

        {
            let mut state = self.state();
            state.generation += 1;
            self.cache_token(&response, None);
        }
        self.persist().await
    }

    /// Returns an access token that is valid for at least the refresh margin.
    ///
    /// - While a refresh is in flight, the call waits for its outcome instead
    ///   of issuing another request.
    /// - When the stored token is due, this call performs the refresh and
    ///   every caller queued meanwhile receives the same result.
    /// - Otherwise the stored token is returned without touching the network.
    ///
    /// A failed refresh leaves the stale credential in place, so the next call
    /// tries again.
    pub async fn with_valid_token(&self) -> Result<String, AuthError> {
        let plan = {
            let mut state = self.state();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                Plan::Wait(rx)
            } else {
                let credential = self.credential().ok_or(AuthError::SignedOut)?;
                if credential.needs_refresh(Utc::now(), self.margin) {
                    let refresh_token = credential
                        .refresh_token
                        .ok_or(AuthError::MissingRefreshToken)?;
                    state.in_flight = true;
                    Plan::Refresh {
                        refresh_token,
                        generation: state.generation,
                    }
                } else {
                    Plan::Ready(credential.access_token)
                }
            }
        };

        match plan {
            Plan::Ready(token) => Ok(token),
            Plan::Wait(rx) => rx.await.unwrap_or(Err(AuthError::Cancelled)),
            Plan::Refresh {
                refresh_token,
                generation,
            } => self.run_refresh(refresh_token, generation).await,
        }
    }

    /// Refreshes the credential when it is due.
    ///
    /// Returns `Ok(false)` without any request when a refresh is already in
    /// flight or the token is not due yet, `Ok(true)` after a successful
    /// refresh. Callers queued through [`Self::with_valid_token`] while this
    /// refresh runs are still served by it.
    pub async fn refresh_if_needed(&self) -> Result<bool, AuthError> {
        let (refresh_token, generation) = {
            let mut state = self.state();
            if state.in_flight {
                return Ok(false);
            }

            let credential = self.credential().ok_or(AuthError::SignedOut)?;
            if !credential.needs_refresh(Utc::now(), self.margin) {
                return Ok(false);
            }

            let refresh_token = credential
                .refresh_token
                .ok_or(AuthError::MissingRefreshToken)?;
            state.in_flight = true;
            (refresh_token, state.generation)
        };

        self.run_refresh(refresh_token, generation)
            .await
            .map(|_| true)
    }

    /// Clears the credential. Calling it again is harmless.
    ///
    /// Takes effect immediately in memory; [`Self::persist`] makes it stick
    /// across restarts.
    pub fn sign_out(&self) {
        let mut state = self.state();
        state.generation += 1;
        for key in [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_EXPIRES_AT] {
            self.store.remove(key);
        }
    }

    /// Writes the current credential to durable storage.
    pub async fn persist(&self) -> Result<(), AuthError> {
        self.store
            .flush()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }

    async fn run_refresh(&self, refresh_token: String, generation: u64) -> Result<String, AuthError> {
        let guard = InFlight {
            refresh: &self.refresh,
            armed: true,
        };

        info!("Refreshing access token...");
        let response = self.endpoint.refresh(&refresh_token).await;

        let (outcome, waiters) = {
            let mut state = self.state();
            let outcome = match response {
                Ok(_) if state.generation != generation => Err(AuthError::Superseded),
                Ok(response) => Ok(self.cache_token(&response, Some(&refresh_token))),
                Err(e) => {
                    warning!("Token refresh failed: {}", e);
                    Err(e)
                }
            };
            (outcome, guard.complete(&mut state))
        };

        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }

        // The new token is already usable; a failed write only costs a
        // refresh after the next restart.
        if outcome.is_ok() {
            if let Err(e) = self.persist().await {
                warning!("{}", e);
            }
        }
        outcome
    }

    /// Puts a token response into the store and returns the new access token.
    ///
    /// The refresh token is only replaced when the response carries one.
    fn cache_token(&self, response: &TokenResponse, previous_refresh_token: Option<&str>) -> String {
        let expires_at = Utc::now() + Duration::seconds(response.expires_in);
        let refresh_token = response.refresh_token.as_deref().or(previous_refresh_token);

        self.store.set(KEY_ACCESS_TOKEN, &response.access_token);
        self.store.set(KEY_EXPIRES_AT, &expires_at.to_rfc3339());
        if let Some(refresh_token) = refresh_token {
            self.store.set(KEY_REFRESH_TOKEN, refresh_token);
        }

        response.access_token.clone()
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl<S, E> TokenSource for CredentialManager<S, E>
where
    S: PreferenceStore,
    E: TokenEndpoint,
{
    async fn valid_token(&self) -> Result<String, AuthError> {
        self.with_valid_token().await
    }
}

/// Clears the in-flight flag if the refreshing future is dropped early, and
/// releases everyone waiting on it.
struct InFlight<'a> {
    refresh: &'a Mutex<RefreshState>,
    armed: bool,
}

impl InFlight<'_> {
    fn complete(mut self, state: &mut RefreshState) -> Vec<Waiter> {
        self.armed = false;
        state.in_flight = false;
        std::mem::take(&mut state.waiters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let waiters = {
            let mut state = self
                .refresh
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(Err(AuthError::Cancelled));
        }
    }
}

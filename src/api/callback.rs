use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::watch;

use crate::{
    management::{CredentialManager, PreferenceStore, TokenEndpoint},
    warning,
};

/// How the last sign-in redirect ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    SignedIn,
    Failed(String),
}

/// Shared by the callback server's handlers.
///
/// `outcome` starts as `None` and is set once per redirect, so a command
/// waiting for sign-in can watch it.
pub struct CallbackState<S, E> {
    pub credentials: Arc<CredentialManager<S, E>>,
    pub outcome: Arc<watch::Sender<Option<SignInOutcome>>>,
}

impl<S, E> CallbackState<S, E> {
    pub fn new(credentials: Arc<CredentialManager<S, E>>) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            credentials,
            outcome: Arc::new(outcome),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SignInOutcome>> {
        self.outcome.subscribe()
    }
}

impl<S, E> Clone for CallbackState<S, E> {
    fn clone(&self) -> Self {
        Self {
            credentials: Arc::clone(&self.credentials),
            outcome: Arc::clone(&self.outcome),
        }
    }
}

pub async fn callback<S, E>(
    Query(params): Query<HashMap<String, String>>,
    Extension(state): Extension<CallbackState<S, E>>,
) -> Html<&'static str>
where
    S: PreferenceStore + 'static,
    E: TokenEndpoint + 'static,
{
    let Some(code) = params.get("code") else {
        let reason = params
            .get("error")
            .cloned()
            .unwrap_or_else(|| "missing authorization code".to_string());
        warning!("Sign-in was not completed: {}", reason);
        state.outcome.send_replace(Some(SignInOutcome::Failed(reason)));
        return Html("<h4>Login failed.</h4><p>No authorization code was received.</p>");
    };

    match state.credentials.exchange_code_for_token(code).await {
        Ok(()) => {
            state.outcome.send_replace(Some(SignInOutcome::SignedIn));
            Html("<h2>Authentication successful.</h2><p>Close this browser window.</p>")
        }
        Err(e) => {
            state
                .outcome
                .send_replace(Some(SignInOutcome::Failed(e.to_string())));
            Html("<h4>Login failed.</h4>")
        }
    }
}

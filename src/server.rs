use std::{io, net::SocketAddr, str::FromStr};

use axum::{Extension, Router, routing::get};
use thiserror::Error;

use crate::{
    api::{self, CallbackState},
    management::{PreferenceStore, TokenEndpoint},
};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid server address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("callback server failed: {0}")]
    Io(#[from] io::Error),
}

pub fn router<S, E>(state: CallbackState<S, E>) -> Router
where
    S: PreferenceStore + 'static,
    E: TokenEndpoint + 'static,
{
    Router::new()
        .route("/health", get(api::health::<S, E>))
        .route("/callback", get(api::callback::<S, E>))
        .layer(Extension(state))
}

/// Serves the callback routes on `addr` until the task is dropped.
pub async fn start_api_server<S, E>(addr: &str, state: CallbackState<S, E>) -> Result<(), ServerError>
where
    S: PreferenceStore + 'static,
    E: TokenEndpoint + 'static,
{
    let addr = SocketAddr::from_str(addr).map_err(|source| ServerError::InvalidAddress {
        addr: addr.to_string(),
        source,
    })?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

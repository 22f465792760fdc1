use std::{sync::Arc, time::Duration};

use reqwest::{Client, Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

use crate::{
    management::{AuthError, TokenSource},
    warning,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("no valid access token: {0}")]
    Auth(#[from] AuthError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("rate limited by the API (retry after {retry_after:?} seconds)")]
    RateLimited { retry_after: Option<u64> },
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// The single place authenticated Web API requests go through.
///
/// Every request first asks the [`TokenSource`] for a valid access token, so
/// expired credentials are refreshed before anything is sent. Failures are
/// never retried here; callers decide whether to try again.
#[derive(Clone)]
pub struct RequestGateway {
    tokens: Arc<dyn TokenSource>,
    http: Client,
    base_url: String,
}

impl RequestGateway {
    pub fn new(tokens: Arc<dyn TokenSource>, http: Client, base_url: &str) -> Self {
        Self {
            tokens,
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET`s `path` and decodes the JSON body into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let (_, body) = self.send::<()>(Method::GET, path, query, None).await?;
        decode(path, &body)
    }

    /// Sends `body` as JSON and returns the raw JSON answer.
    pub async fn send_json<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<(StatusCode, Value), ApiError> {
        let (status, body) = self.send(method, path, query, body).await?;
        if body.trim().is_empty() {
            return Ok((status, Value::Null));
        }
        Ok((status, decode(path, &body)?))
    }

    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<(StatusCode, String), ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let url = Url::parse(&url).map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;
        let token = self.tokens.valid_token().await?;

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .timeout(REQUEST_TIMEOUT);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(ApiError::RateLimited { retry_after });
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok((status, body))
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|source| {
        warning!("Cannot decode response from {}: {}", endpoint, source);
        ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        }
    })
}

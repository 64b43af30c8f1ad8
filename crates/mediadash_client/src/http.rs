use std::sync::Arc;

use client_logging::{client_debug, client_error, client_info, client_trace, client_warn};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::endpoints;
use crate::error::map_reqwest_error;
use crate::refresh::{RefreshCoordinator, Ticket};
use crate::types::RefreshTokenRequest;
use crate::{ApiConfig, ApiError, Credentials, FailureKind, TokenStore};

/// Notified when a refresh fails and the stored session has been wiped.
///
/// Front ends use this to send the user back to the login entry point.
pub trait SessionObserver: Send + Sync {
    fn session_expired(&self, error: &ApiError);
}

/// Default observer: only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSessionObserver;

impl SessionObserver for LogSessionObserver {
    fn session_expired(&self, error: &ApiError) {
        client_warn!("Session expired; login required ({})", error);
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    segments: Vec<String>,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    refresh_on_unauthorized: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: None,
            refresh_on_unauthorized: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Appends one percent-encoded path segment.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// A 401 on this request means bad credentials, not an expired token
    /// (login, signup), so it is returned as-is instead of triggering a refresh.
    pub fn without_refresh(mut self) -> Self {
        self.refresh_on_unauthorized = false;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// HTTP client for the one backend origin.
///
/// Attaches the stored access token to every request. On a 401 it refreshes
/// the token pair once (single-flight across concurrent requests) and replays
/// the request a single time with the new token.
pub struct HttpClient {
    client: reqwest::Client,
    config: ApiConfig,
    tokens: TokenStore,
    refresh: RefreshCoordinator,
    observer: Arc<dyn SessionObserver>,
}

impl HttpClient {
    pub fn new(config: ApiConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            config,
            tokens,
            refresh: RefreshCoordinator::new(),
            observer: Arc::new(LogSessionObserver),
        })
    }

    pub fn with_session_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Sends `request` and decodes a successful JSON body into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    /// Sends `request`, returning the response only when its status is a success.
    pub async fn execute(&self, request: ApiRequest) -> Result<reqwest::Response, ApiError> {
        let response = self
            .dispatch(&request, self.tokens.access_token().as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED || !request.refresh_on_unauthorized {
            return ensure_success(response).await;
        }

        client_debug!("{} {} rejected with 401", request.method, request.path);
        let access_token = self.refreshed_access_token().await?;

        // The replay is the single retry; a second 401 is final.
        let response = self.dispatch(&request, Some(&access_token)).await?;
        ensure_success(response).await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self
            .config
            .endpoint(&request.path, &request.segments, &request.query)?;
        client_trace!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        builder.send().await.map_err(map_reqwest_error)
    }

    /// Waits for the running refresh, or runs one if none is in flight.
    async fn refreshed_access_token(&self) -> Result<String, ApiError> {
        let lease = match self.refresh.join() {
            Ticket::Wait(rx) => {
                return rx.await.unwrap_or_else(|_| {
                    Err(ApiError::new(
                        FailureKind::SessionExpired,
                        "token refresh was abandoned",
                    ))
                });
            }
            Ticket::Lead(lease) => lease,
        };

        client_info!("Access token rejected; refreshing credentials");
        let outcome = self.refresh_credentials().await;
        match &outcome {
            Ok(_) => {
                let released = lease.settle(outcome.clone());
                client_info!("Token refresh succeeded; resumed {} parked request(s)", released);
            }
            Err(err) => {
                if let Err(storage_err) = self.tokens.clear() {
                    client_error!("Failed to clear stored session: {}", storage_err);
                }
                let released = lease.settle(outcome.clone());
                client_warn!(
                    "Token refresh failed ({}): {}; rejected {} parked request(s)",
                    err.kind,
                    err,
                    released
                );
                self.observer.session_expired(err);
            }
        }
        outcome
    }

    /// Exchanges the stored refresh token for a new pair and persists it.
    async fn refresh_credentials(&self) -> Result<String, ApiError> {
        let refresh_token = self.tokens.refresh_token().ok_or_else(|| {
            ApiError::new(FailureKind::SessionExpired, "No refresh token available")
        })?;

        let url = self.config.endpoint(endpoints::REFRESH_TOKEN, &[], &[])?;
        let response = self
            .client
            .post(url)
            .json(&RefreshTokenRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let response = ensure_success(response)
            .await
            .map_err(|err| err.with_kind(FailureKind::SessionExpired))?;
        let credentials: Credentials = response
            .json()
            .await
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;

        self.tokens.set_credentials(&credentials)?;
        client_debug!(
            "Stored refreshed access token {}",
            client_logging::redact_token(&credentials.access_token)
        );
        Ok(credentials.access_token)
    }
}

/// Turns a non-success response into an error carrying the backend's `message`.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let kind = if status == StatusCode::UNAUTHORIZED {
        FailureKind::Unauthorized
    } else {
        FailureKind::HttpStatus(status.as_u16())
    };
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty());

    Err(match message {
        Some(message) => ApiError::from_backend(kind, message),
        None => ApiError::new(kind, status.to_string()),
    })
}

//! Outbound request pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use portal_protocol::{ErrorBody, HealthResponse, routes};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ClientError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether a request carries the default bearer header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    /// Send the default header, if one is set.
    Default,
    /// Never send a bearer header.
    Anonymous,
}

/// What an interceptor gets to see of a response.
#[derive(Debug, Clone)]
pub struct ResponseOutcome {
    pub method: Method,
    pub path: String,
    pub status: StatusCode,
    /// Bearer token the request carried, if any.
    pub bearer: Option<String>,
}

impl ResponseOutcome {
    /// The request carried a bearer header.
    pub fn authenticated(&self) -> bool {
        self.bearer.is_some()
    }
}

/// Stage run on every response before the caller sees it.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn on_response(&self, outcome: &ResponseOutcome);
}

/// HTTP client for the portal server.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: RwLock<Option<String>>,
    interceptors: RwLock<Vec<Arc<dyn ResponseInterceptor>>>,
}

impl ApiClient {
    /// Client with the default request timeout.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self::with_http(base_url, http))
    }

    /// Client on top of a preconfigured `reqwest::Client`.
    pub fn with_http(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            token: RwLock::new(None),
            interceptors: RwLock::new(Vec::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set or clear the default bearer token.
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Register a response interceptor. Interceptors run in registration order.
    pub async fn add_interceptor(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.interceptors.write().await.push(interceptor);
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: Credentials,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        self.send(self.http.get(&url), Method::GET, path, credentials)
            .await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        credentials: Credentials,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        self.send(self.http.post(&url).json(body), Method::POST, path, credentials)
            .await
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get_json(routes::HEALTH, Credentials::Anonymous).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: Method,
        path: &str,
        credentials: Credentials,
    ) -> Result<T, ClientError> {
        let bearer = match credentials {
            Credentials::Default => self.token.read().await.clone(),
            Credentials::Anonymous => None,
        };

        let request = match &bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(ClientError::Transport)?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "Response received");

        let outcome = ResponseOutcome {
            method,
            path: path.to_string(),
            status,
            bearer,
        };
        // Snapshot so interceptors may register others without deadlocking.
        let interceptors = self.interceptors.read().await.clone();
        for interceptor in interceptors {
            interceptor.on_response(&outcome).await;
        }

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .map(|body| body.error);
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response.json::<T>().await.map_err(ClientError::Decode)
    }
}

//! HTTP client implementation

use std::time::Duration;

use deploy_api::ErrorResponse;
use reqwest::{header, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::errors::DeployerError;
use crate::utils::user_agent;

/// HTTP client for one API root
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
    request_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, DeployerError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| DeployerError::ConfigError(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DeployerError::ConfigError(format!(
                "{} cannot be used as an API root",
                base_url
            )));
        }

        // No overall timeout on the client; streams stay open indefinitely
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: None,
            request_timeout,
        })
    }

    /// Send `Authorization: Bearer` with every request
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL extended with already-unescaped path segments
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Make a POST request and decode the JSON answer
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, DeployerError> {
        let response = self.send_post(segments, body).await?;
        let text = response
            .text()
            .await
            .map_err(|e| DeployerError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            error!("Unexpected response body: {}", e);
            DeployerError::ProtocolViolation(format!("Invalid response body: {}", e))
        })
    }

    /// Make a POST request, ignoring the answer body
    pub async fn post_empty<B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), DeployerError> {
        self.send_post(segments, body).await?;
        Ok(())
    }

    async fn send_post<B: Serialize>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Response, DeployerError> {
        let url = self.url(segments);
        debug!("POST {}", url);

        let request = self.authorize(self.client.post(url).timeout(self.request_timeout).json(body));
        let response = request
            .send()
            .await
            .map_err(|e| DeployerError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("HTTP POST failed: {} - {}", status, body);
            return Err(rejection(status, &body));
        }
        Ok(response)
    }

    /// Open a `text/event-stream` response
    pub async fn get_stream(&self, segments: &[&str]) -> Result<Response, DeployerError> {
        let url = self.url(segments);
        debug!("GET {} (event stream)", url);

        let request = self.authorize(
            self.client
                .get(url)
                .header(header::ACCEPT, "text/event-stream")
                .header(header::CACHE_CONTROL, "no-cache"),
        );
        let response = request
            .send()
            .await
            .map_err(|e| DeployerError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            error!("Event stream refused: {}", status);
            return Err(DeployerError::Transport(format!(
                "event stream answered {}",
                status
            )));
        }
        Ok(response)
    }
}

/// Error for a non-2xx answer, preferring the server's `error` field
fn rejection(status: reqwest::StatusCode, body: &str) -> DeployerError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| format!("{}: {}", status, body));
    DeployerError::RejectedByServer(message)
}

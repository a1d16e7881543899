use std::time::Duration;

use rendezvous_domain::RendezvousError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{status_error, InfraError};

/// Thin reqwest wrapper that maps transport and status failures onto the
/// domain taxonomy.
///
/// Each request is sent exactly once; retries belong to the caller's retry
/// executor so that attempt counts and breaker bookkeeping stay accurate.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, RendezvousError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send the request and fail on any non-success status.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, RendezvousError> {
        let request = builder.build().map_err(|err| RendezvousError::from(InfraError::from(err)))?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, path = url.path(), "sending HTTP request");

        let response = self.client.execute(request).await.map_err(|err| {
            debug!(%method, path = url.path(), error = %err, "HTTP request failed");
            RendezvousError::from(InfraError::from(err))
        })?;

        let status = response.status();
        debug!(%method, path = url.path(), %status, "received HTTP response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &truncate(&body, 512)))
    }

    /// Send the request and decode a JSON body.
    pub async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T, RendezvousError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(builder).await?;
        response.json::<T>().await.map_err(|err| RendezvousError::from(InfraError::from(err)))
    }
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), user_agent: None, default_headers: None }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, RendezvousError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| RendezvousError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}

//! Access tokens from a stored refresh token
//!
//! Google access tokens live for about an hour. The provider refreshes on
//! demand and caches the result until shortly before it expires.

use std::time::Duration;

use reqwest::Method;
use rendezvous_domain::{GoogleConfig, RendezvousError, Result};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::types::TokenResponse;
use crate::http::HttpClient;

/// Refresh this long before the reported expiry
const EXPIRY_SKEW: Duration = Duration::from_secs(60);
/// Assumed lifetime when the token endpoint omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// OAuth2 refresh-token grant with an in-memory access token cache
pub struct GoogleTokenProvider {
    http: HttpClient,
    token_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleTokenProvider {
    pub fn new(http: HttpClient, config: &GoogleConfig) -> Self {
        Self {
            http,
            token_url: config.token_url.clone(),
            client_id: non_empty(config.client_id.as_deref()),
            client_secret: non_empty(config.client_secret.as_deref()),
            refresh_token: non_empty(config.refresh_token.as_deref()),
            cached: Mutex::new(None),
        }
    }

    /// Whether a refresh token is configured at all
    pub fn has_credentials(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some()
    }

    /// Current access token, refreshed when missing or about to expire
    ///
    /// Missing or rejected credentials surface as `Unauthorized`.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let token = self.refresh().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next call refreshes
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    async fn refresh(&self) -> Result<CachedToken> {
        let (Some(client_id), Some(refresh_token)) = (&self.client_id, &self.refresh_token) else {
            return Err(RendezvousError::Unauthorized(
                "google credentials are not configured".into(),
            ));
        };

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", client_id.as_str()),
            ("refresh_token", refresh_token.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        debug!("refreshing google access token");
        let request = self.http.request(Method::POST, &self.token_url).form(&form);
        let response: TokenResponse = self.http.send_json(request).await.map_err(|err| match err {
            // invalid_grant and invalid_client both come back as 400
            RendezvousError::InvalidInput(message) => {
                warn!(%message, "google token refresh rejected");
                RendezvousError::Unauthorized(format!("token refresh rejected: {message}"))
            }
            other => other,
        })?;

        let lifetime = response
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Duration::from_secs(secs.unsigned_abs()))
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Ok(CachedToken {
            value: response.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_SKEW),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

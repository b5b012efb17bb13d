//! Access token providers.
//!
//! The engine asks for a token before every remote call. Providers decide
//! where the token comes from and how long it may be reused.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{check_response, transport_error, RemoteFuture, REQUEST_TIMEOUT};
use crate::error::{Result, ScrubError};
use crate::utils::settings::{get_env_var, get_env_vars};

/// Environment variables holding a personal access token, in priority order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Source of GitHub access tokens.
pub trait TokenProvider: Send + Sync {
    /// Returns a token that is valid right now, or fails with `AuthRequired`.
    fn access_token(&self) -> RemoteFuture<'_, String>;
}

/// Provider for a fixed personal access token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Wraps an existing token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Reads the token from `GITHUB_TOKEN` or `GH_TOKEN` (environment, then settings).
    pub fn from_env() -> Result<Self> {
        let token = get_env_vars(&TOKEN_ENV_VARS).map_err(|_| {
            ScrubError::AuthRequired(format!(
                "GitHub not connected. Set one of: {}",
                TOKEN_ENV_VARS.join(", ")
            ))
        })?;
        Ok(Self::new(token))
    }
}

impl TokenProvider for StaticTokenProvider {
    fn access_token(&self) -> RemoteFuture<'_, String> {
        Box::pin(async move {
            if self.token.trim().is_empty() {
                return Err(ScrubError::AuthRequired(
                    "GitHub token is empty".to_string(),
                ));
            }
            Ok(self.token.clone())
        })
    }
}

#[derive(Debug, Deserialize)]
struct ConnectionList {
    #[serde(default)]
    items: Vec<Connection>,
}

#[derive(Debug, Deserialize)]
struct Connection {
    #[serde(default)]
    settings: Option<ConnectionSettings>,
}

#[derive(Debug, Deserialize)]
struct ConnectionSettings {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
    #[serde(default)]
    oauth: Option<OAuthSettings>,
}

#[derive(Debug, Deserialize)]
struct OAuthSettings {
    #[serde(default)]
    credentials: Option<OAuthCredentials>,
}

#[derive(Debug, Deserialize)]
struct OAuthCredentials {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Provider that obtains an OAuth token from the hosting environment's
/// connector service.
///
/// A token is only reused while its advertised expiry lies in the future;
/// tokens without an expiry are fetched again on every call.
pub struct ConnectorTokenProvider {
    http: Client,
    /// Base URL of the connector service, e.g. `https://connectors.example`.
    base_url: String,
    /// Value of the `X_REPLIT_TOKEN` identity header.
    identity: String,
    cache: Mutex<Option<CachedToken>>,
}

impl ConnectorTokenProvider {
    /// Creates a provider for a connector service.
    pub fn new(base_url: impl Into<String>, identity: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ScrubError::Remote(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            identity: identity.into(),
            cache: Mutex::new(None),
        })
    }

    /// Builds a provider from `REPLIT_CONNECTORS_HOSTNAME` and
    /// `REPL_IDENTITY` / `WEB_REPL_RENEWAL`.
    pub fn from_env() -> Result<Self> {
        let hostname = get_env_var("REPLIT_CONNECTORS_HOSTNAME").map_err(|_| {
            ScrubError::AuthRequired("REPLIT_CONNECTORS_HOSTNAME is not set".to_string())
        })?;
        let identity = connector_identity().ok_or_else(|| {
            ScrubError::AuthRequired("X_REPLIT_TOKEN not found for repl/depl".to_string())
        })?;
        Self::new(format!("https://{hostname}"), identity)
    }

    async fn fetch(&self) -> Result<(String, Option<DateTime<Utc>>)> {
        let context = "connector token";
        let url = format!(
            "{}/api/v2/connection?include_secrets=true&connector_names=github",
            self.base_url
        );
        debug!(url = %url, "Requesting GitHub token from connector service");

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("X_REPLIT_TOKEN", &self.identity)
            .send()
            .await
            .map_err(|e| transport_error(context, e))?;
        let response = check_response(response, context).await?;
        let list: ConnectionList = response
            .json()
            .await
            .map_err(|e| ScrubError::Remote(format!("{context}: unexpected response: {e}")))?;

        let settings = list
            .items
            .into_iter()
            .next()
            .and_then(|c| c.settings)
            .ok_or_else(|| ScrubError::AuthRequired("GitHub not connected".to_string()))?;

        let expires_at = settings
            .expires_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));

        let token = settings
            .access_token
            .or_else(|| settings.oauth.and_then(|o| o.credentials).and_then(|c| c.access_token))
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ScrubError::AuthRequired("GitHub not connected".to_string()))?;

        Ok((token, expires_at))
    }
}

impl TokenProvider for ConnectorTokenProvider {
    fn access_token(&self) -> RemoteFuture<'_, String> {
        Box::pin(async move {
            let mut cache = self.cache.lock().await;

            if let Some(cached) = cache.as_ref() {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.token.clone());
                }
                debug!("Cached connector token expired");
            }

            let (token, expires_at) = self.fetch().await?;
            *cache = expires_at.map(|expires_at| CachedToken {
                token: token.clone(),
                expires_at,
            });
            Ok(token)
        })
    }
}

pub(crate) fn connector_identity() -> Option<String> {
    get_env_var("REPL_IDENTITY")
        .map(|v| format!("repl {v}"))
        .or_else(|_| get_env_var("WEB_REPL_RENEWAL").map(|v| format!("depl {v}")))
        .ok()
}

/// Picks the connector service when the environment provides one, otherwise
/// a personal access token.
pub fn default_token_provider() -> Result<Box<dyn TokenProvider>> {
    if get_env_var("REPLIT_CONNECTORS_HOSTNAME").is_ok() && connector_identity().is_some() {
        info!("Using connector service for GitHub credentials");
        return Ok(Box::new(ConnectorTokenProvider::from_env()?));
    }
    Ok(Box::new(StaticTokenProvider::from_env()?))
}

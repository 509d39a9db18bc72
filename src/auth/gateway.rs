//! Gateway access tokens
//!
//! The gateway is reachable only with a bearer token. It comes either from
//! configuration as-is, or from an OAuth2 client-credentials grant against the
//! configured token endpoint.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::Result;
use crate::config::GatewayConfig;
use crate::error::Error;
use crate::tools::GatewayConnection;

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Client-credentials request
#[derive(Debug, Serialize)]
struct ClientCredentialsRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
}

/// An access token and when it stops being usable
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: String, expires_in_secs: Option<i64>) -> Self {
        let expires_at = expires_in_secs.map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        Self { token, expires_at }
    }

    /// Check if the token is expired or about to expire
    ///
    /// Returns true if the token expires within the next 5 minutes
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() + chrono::Duration::minutes(5) >= expires,
            None => false,
        }
    }
}

/// Fetches and caches gateway tokens via the client-credentials grant
pub struct GatewayTokenProvider {
    endpoint: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
    http_client: Client,
    cached: Mutex<Option<AccessToken>>,
}

impl GatewayTokenProvider {
    pub fn new(endpoint: &str, client_id: &str, client_secret: &str, scope: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            scope: scope.map(str::to_string),
            http_client: Client::new(),
            cached: Mutex::new(None),
        }
    }

    /// Build a provider from gateway config, if it carries client credentials
    pub fn from_config(config: &GatewayConfig) -> Option<Self> {
        match (&config.token_endpoint, &config.client_id, &config.client_secret) {
            (Some(endpoint), Some(id), Some(secret)) => {
                Some(Self::new(endpoint, id, secret, config.scope.as_deref()))
            }
            _ => None,
        }
    }

    /// Get a valid access token, fetching a new one when the cached one expired
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            tracing::debug!("Using cached gateway token");
            return Ok(token.token.clone());
        }

        let token = self.fetch().await?;
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch(&self) -> Result<AccessToken> {
        let request = ClientCredentialsRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            scope: self.scope.as_deref(),
        };

        let response = self.http_client
            .post(&self.endpoint)
            .form(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(Error::Auth(format!("Gateway token request failed: {}", error_text)));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(AccessToken::new(token_response.access_token, token_response.expires_in))
    }
}

/// Where the gateway's bearer token comes from
enum TokenSource {
    Static(String),
    ClientCredentials(GatewayTokenProvider),
}

/// A configured gateway and its token source.
///
/// Keep one for as long as the process serves conversations: client-credentials
/// tokens are cached here and only fetched again once they are about to expire.
pub struct GatewayAuth {
    url: String,
    source: TokenSource,
}

impl GatewayAuth {
    /// `None` means the gateway is not configured, or is configured without any
    /// way to obtain a token; runs then go ahead without gateway tools.
    pub fn from_config(config: Option<&GatewayConfig>) -> Option<Self> {
        let config = config.filter(|g| !g.url.is_empty())?;

        let source = match (&config.access_token, GatewayTokenProvider::from_config(config)) {
            (Some(token), _) if !token.is_empty() => TokenSource::Static(token.clone()),
            (_, Some(provider)) => TokenSource::ClientCredentials(provider),
            _ => {
                tracing::warn!("Gateway {} has no access token or client credentials; skipping", config.url);
                return None;
            }
        };

        Some(Self {
            url: config.url.clone(),
            source,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connection details with a currently valid token
    pub async fn connection(&self) -> Result<GatewayConnection> {
        let access_token = match &self.source {
            TokenSource::Static(token) => token.clone(),
            TokenSource::ClientCredentials(provider) => provider.access_token().await?,
        };

        Ok(GatewayConnection {
            url: self.url.clone(),
            access_token,
        })
    }
}

/// Resolve an optional gateway into a usable connection.
pub async fn resolve_gateway(auth: Option<&GatewayAuth>) -> Result<Option<GatewayConnection>> {
    match auth {
        Some(auth) => auth.connection().await.map(Some),
        None => Ok(None),
    }
}

//! OAuth2 client-credentials flow for the Microsoft identity platform.
//!
//! 1. POST client id + secret to the tenant token endpoint
//! 2. Cache the access token in memory
//! 3. Fetch a new one shortly before it expires

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::GraphError;

pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub expires_at: Option<i64>, // Unix timestamp
    pub token_type: String,
    pub scope: Option<String>,
}

/// App registration used for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub authority: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
}

impl ClientCredentials {
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

/// Request an app-only access token.
pub async fn acquire_token(
    client: &Client,
    creds: &ClientCredentials,
) -> Result<OAuthTokens, GraphError> {
    let scope = creds.scopes.join(" ");
    let params = [
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.as_str()),
        ("scope", scope.as_str()),
        ("grant_type", "client_credentials"),
    ];

    let resp = client
        .post(creds.token_url())
        .form(&params)
        .send()
        .await
        .map_err(|e| GraphError::TokenAcquisition(e.to_string()))?;

    let body: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| GraphError::TokenAcquisition(e.to_string()))?;

    if let Some(error) = body.get("error") {
        let detail = body
            .get("error_description")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(GraphError::TokenAcquisition(detail));
    }

    let access_token = body["access_token"]
        .as_str()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GraphError::TokenAcquisition("no access_token in response".into()))?
        .to_string();

    let expires_in = body.get("expires_in").and_then(|v| v.as_i64());
    let expires_at = expires_in.map(|ei| chrono::Utc::now().timestamp() + ei);

    Ok(OAuthTokens {
        access_token,
        expires_at,
        token_type: body["token_type"].as_str().unwrap_or("Bearer").to_string(),
        scope: body.get("scope").and_then(|v| v.as_str()).map(String::from),
    })
}

/// Check if tokens are expired (with 60s buffer).
pub fn is_expired(tokens: &OAuthTokens) -> bool {
    match tokens.expires_at {
        Some(exp) => chrono::Utc::now().timestamp() > exp - 60,
        None => false,
    }
}

/// In-process token cache shared by concurrent requests.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: Mutex<Option<OAuthTokens>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a valid access token, acquiring a new one if needed.
    pub async fn access_token(
        &self,
        client: &Client,
        creds: &ClientCredentials,
    ) -> Result<String, GraphError> {
        let mut guard = self.tokens.lock().await;
        if let Some(tokens) = guard.as_ref() {
            if !is_expired(tokens) {
                return Ok(tokens.access_token.clone());
            }
        }

        let fresh = acquire_token(client, creds).await?;
        tracing::debug!(expires_at = ?fresh.expires_at, "acquired Graph access token");
        let token = fresh.access_token.clone();
        *guard = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn clear(&self) {
        *self.tokens.lock().await = None;
    }
}

//! Connection records consumed read-only by the enablement flow.
//!
//! Only the connection identifier matters for enablement (it scopes the
//! disable request), but listings carry credentials too. Credentials are a
//! tagged variant per auth mode so callers match on the mode instead of
//! probing for optional fields.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Credentials {
    #[serde(rename = "OAUTH2")]
    OAuth2 {
        access_token: String,
        #[serde(default)]
        refresh_token: Option<String>,
        #[serde(default)]
        expires_at: Option<String>,
    },
    #[serde(rename = "OAUTH1")]
    OAuth1 {
        oauth_token: String,
        oauth_token_secret: String,
    },
    ApiKey {
        #[serde(rename = "apiKey")]
        api_key: String,
    },
    Basic {
        username: String,
        #[serde(default)]
        password: Option<String>,
    },
    App {
        access_token: String,
        #[serde(default)]
        expires_at: Option<String>,
    },
}

impl Credentials {
    pub fn auth_mode(&self) -> &'static str {
        match self {
            Credentials::OAuth2 { .. } => "OAUTH2",
            Credentials::OAuth1 { .. } => "OAUTH1",
            Credentials::ApiKey { .. } => "API_KEY",
            Credentials::Basic { .. } => "BASIC",
            Credentials::App { .. } => "APP",
        }
    }

    /// Token expiry, for the modes that issue expiring tokens.
    pub fn expires_at(&self) -> Option<&str> {
        match self {
            Credentials::OAuth2 { expires_at, .. } | Credentials::App { expires_at, .. } => {
                expires_at.as_deref()
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Connection {
    pub connection_id: String,
    #[serde(default)]
    pub provider_config_key: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// Source of connection identifiers scoped to one integration.
pub trait ConnectionLister {
    fn connection_ids(&self, provider_config_key: &str) -> Vec<String>;
}

impl ConnectionLister for [Connection] {
    fn connection_ids(&self, provider_config_key: &str) -> Vec<String> {
        self.iter()
            .filter(|connection| {
                connection.provider_config_key.is_empty()
                    || connection.provider_config_key == provider_config_key
            })
            .map(|connection| connection.connection_id.clone())
            .collect()
    }
}

impl ConnectionLister for Vec<Connection> {
    fn connection_ids(&self, provider_config_key: &str) -> Vec<String> {
        self.as_slice().connection_ids(provider_config_key)
    }
}

//! Frontend configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load `config.json`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(u16),

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Authentication configuration
pub struct AuthConfig;

impl AuthConfig {
    /// Refresh the bearer token when fewer than this many seconds of validity remain
    pub const TOKEN_MIN_VALIDITY_SECS: i64 = 5;

    /// Appended to the identity server URL to end the session
    pub const LOGOUT_REDIRECT_SUFFIX: &'static str =
        "/realms/PNC.REDHAT.COM/tokens/logout?redirect_uri=/pnc-web/index.html";

    /// Session storage key for the pending login state
    pub const LOGIN_STATE_KEY: &'static str = "pnc_login_state";
}

/// Pagination defaults
pub struct PageConfig;

impl PageConfig {
    pub const DEFAULT_PAGE_SIZE: u32 = 10;
}

/// Deployment flavour; the request and error interceptors only run in `Prod`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    #[default]
    #[serde(other)]
    Dev,
}

/// Runtime configuration, served next to the application as `config.json`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub environment: Environment,
    /// Base URL of the REST API
    pub rest_url: String,
    /// Location of the Keycloak adapter JSON
    pub keycloak_config_url: String,
    /// Websocket publishing build status changes; empty disables the feed
    pub notifications_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_origin("")
    }
}

impl AppConfig {
    pub const FILE_NAME: &'static str = "config.json";

    /// Defaults for a console served from `origin`
    pub fn for_origin(origin: &str) -> Self {
        let origin = origin.trim_end_matches('/');
        let ws_origin = origin
            .replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1);
        Self {
            environment: Environment::Dev,
            rest_url: format!("{origin}/pnc-rest/rest"),
            keycloak_config_url: format!("{origin}/pnc-web/keycloak.json"),
            notifications_url: format!("{ws_origin}/pnc-rest/ws/build-records/notifications"),
        }
    }

    /// Parse `config.json`; missing keys keep their defaults for `origin`
    pub fn from_json(origin: &str, json: &str) -> Result<Self, serde_json::Error> {
        let mut value = serde_json::to_value(Self::for_origin(origin))?;
        let overrides: serde_json::Value = serde_json::from_str(json)?;
        if let (Some(base), serde_json::Value::Object(overrides)) =
            (value.as_object_mut(), overrides)
        {
            base.extend(overrides);
        }
        serde_json::from_value(value)
    }

    /// Fetch `config.json` from `origin`, falling back to the defaults
    pub async fn load(origin: &str) -> Self {
        let url = format!("{}/pnc-web/{}", origin.trim_end_matches('/'), Self::FILE_NAME);
        match Self::fetch(origin, &url).await {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, %url, "using default configuration");
                Self::for_origin(origin)
            }
        }
    }

    async fn fetch(origin: &str, url: &str) -> Result<Self, ConfigError> {
        let response = reqwest::get(url).await?;
        if !response.status().is_success() {
            return Err(ConfigError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        Ok(Self::from_json(origin, &body)?)
    }

    pub fn interceptors_enabled(&self) -> bool {
        self.environment == Environment::Prod
    }
}

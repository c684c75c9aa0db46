//! PNC REST client

pub mod builds;
pub mod error;
pub mod interceptor;
pub mod users;

use error::ClientError;
use interceptor::Interceptors;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;

/// PNC REST API client
#[derive(Clone, Debug)]
pub struct PncClient {
    client: Client,
    base_url: String,
    interceptors: Interceptors,
}

impl PncClient {
    /// Create a new client without interceptors
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> PncClientBuilder {
        PncClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a request builder for a path below the base URL
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// Execute a request and decode the JSON body
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        match self.execute_optional(request).await? {
            Some(value) => Ok(value),
            None => serde_json::from_value(serde_json::Value::Null)
                .map_err(|error| self.interceptors.after_failure(error.into())),
        }
    }

    /// Execute a request whose success may carry no body (`204 No Content`)
    pub async fn execute_optional<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        self.send(request)
            .await
            .map_err(|error| self.interceptors.after_failure(error))
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>, ClientError> {
        let request = self.interceptors.before_send(request).await?;
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            Ok(None)
        } else if status.is_success() {
            Ok(Some(response.json().await?))
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "request failed");
            Err(ClientError::from_status(status, &body))
        }
    }
}

/// Builder for PncClient
#[derive(Default)]
pub struct PncClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    interceptors: Interceptors,
}

impl PncClientBuilder {
    /// Set the base URL, e.g. `https://pnc.example.com/pnc-rest/rest`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout (native only)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Install request/error interceptors
    pub fn interceptors(mut self, interceptors: Interceptors) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<PncClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        #[cfg(target_arch = "wasm32")]
        let _ = self.timeout; // Timeouts not supported on WASM

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder = client_builder.user_agent("pnc-web/0.1.0");
        }

        let client = client_builder.build()?;

        Ok(PncClient {
            client,
            base_url,
            interceptors: self.interceptors,
        })
    }
}

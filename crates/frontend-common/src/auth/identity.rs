//! Identity provider seam
//!
//! The console authenticates against a single identity provider. The session
//! only needs a handful of operations from it, captured by [`IdentityClient`].

use async_trait::async_trait;
use thiserror::Error;

/// Identity provider error types
///
/// Cloneable so every caller waiting on one token refresh gets the outcome.
#[derive(Clone, Debug, Error)]
pub enum IdentityError {
    /// Network failure talking to the identity server
    #[error("Identity request failed: {0}")]
    Request(String),

    /// The identity server refused a request
    #[error("Identity server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The adapter configuration is unusable
    #[error("Invalid identity configuration: {0}")]
    Configuration(String),

    /// The login callback does not belong to a login we started
    #[error("Login state mismatch")]
    StateMismatch,

    /// The identity server reported a failed login
    #[error("Login denied: {0}")]
    Denied(String),

    /// No tokens are held
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl From<reqwest::Error> for IdentityError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error.to_string())
    }
}

/// Result of a `login-required` initialisation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// Tokens were obtained; the session is usable
    Authenticated,
    /// The page is navigating to the identity provider's login form
    Redirecting,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait(?Send)]
pub trait IdentityClient {
    /// Complete a pending login or start an interactive one
    async fn init_login_required(&self) -> Result<InitOutcome, IdentityError>;

    /// Current access token, if any
    fn token(&self) -> Option<String>;

    /// Refresh the access token if it expires within `min_validity_secs`.
    ///
    /// Returns whether a refresh happened.
    async fn update_token(&self, min_validity_secs: i64) -> Result<bool, IdentityError>;

    /// Base URL of the identity server, e.g. `https://sso.example.com/auth`
    fn auth_server_url(&self) -> String;

    /// Login name carried by the current token
    fn username(&self) -> Option<String>;
}

//! Request and error interceptors installed on the PNC client in production

use super::session::AuthService;
use crate::config::AuthConfig;
use crate::notifications::Notifications;
use async_trait::async_trait;
use pnc_http::{ClientError, ErrorInterceptor, Interceptors, RequestInterceptor};
use std::rc::Rc;

/// Message of the rejection returned when the token cannot be refreshed
pub const REFRESH_FAILED: &str = "Failed to refresh token";

/// Generic notification for failures without a server message
pub const UNEXPECTED_ERROR: &str = "An unexpected server error has occurred";

/// Refreshes the session token and attaches it as a bearer header
pub struct BearerInterceptor {
    auth: AuthService,
}

impl BearerInterceptor {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }
}

#[async_trait(?Send)]
impl RequestInterceptor for BearerInterceptor {
    async fn intercept(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let Some(identity) = self.auth.identity() else {
            tracing::debug!("no identity client; sending request without credentials");
            return Ok(request);
        };
        if identity.token().is_none() {
            return Ok(request);
        }

        if let Err(error) = identity
            .update_token(AuthConfig::TOKEN_MIN_VALIDITY_SECS)
            .await
        {
            tracing::warn!(%error, "token refresh failed");
            return Err(ClientError::Rejected(REFRESH_FAILED.into()));
        }

        match identity.token() {
            Some(token) => Ok(request.bearer_auth(token)),
            None => Err(ClientError::Rejected(REFRESH_FAILED.into())),
        }
    }
}

/// What a failed request leads to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureAction {
    Logout,
    Notify(String),
    Ignore,
}

impl FailureAction {
    pub fn for_error(error: &ClientError) -> Self {
        match error.status() {
            Some(401) => Self::Logout,
            Some(403) => Self::Notify("Forbidden".into()),
            Some(404) => Self::Notify("Not found".into()),
            Some(0) | None => Self::Ignore,
            Some(_) => Self::Notify(
                error
                    .error_message()
                    .unwrap_or(UNEXPECTED_ERROR)
                    .to_string(),
            ),
        }
    }
}

/// Turns failed responses into a logout or a single error notification
pub struct ErrorNotifier {
    auth: AuthService,
    notifications: Notifications,
}

impl ErrorNotifier {
    pub fn new(auth: AuthService, notifications: Notifications) -> Self {
        Self {
            auth,
            notifications,
        }
    }
}

impl ErrorInterceptor for ErrorNotifier {
    fn on_error(&self, error: &ClientError) {
        match FailureAction::for_error(error) {
            FailureAction::Logout => {
                tracing::warn!("session timeout?");
                self.auth.logout();
            }
            FailureAction::Notify(message) => self.notifications.error(message),
            FailureAction::Ignore => {}
        }
    }
}

/// Both interceptors bound to one session
pub fn session_interceptors(auth: &AuthService, notifications: &Notifications) -> Interceptors {
    Interceptors::none()
        .with_request(Rc::new(BearerInterceptor::new(auth.clone())))
        .with_error(Rc::new(ErrorNotifier::new(
            auth.clone(),
            notifications.clone(),
        )))
}

//! Hooks around every request issued by [`PncClient`](super::PncClient)
//!
//! The console runs on a single-threaded event loop, so interceptors are
//! shared through `Rc` and their futures are not required to be `Send`.

use super::ClientError;
use async_trait::async_trait;
use std::fmt;
use std::rc::Rc;

/// Runs before a request is sent.
///
/// Returning an error aborts the request; it is never forwarded to the server.
#[async_trait(?Send)]
pub trait RequestInterceptor {
    async fn intercept(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ClientError>;
}

/// Observes every failed request.
///
/// Side effects are fire-and-forget: the client still returns the original
/// error to its caller after the interceptor ran.
pub trait ErrorInterceptor {
    fn on_error(&self, error: &ClientError);
}

/// The interceptors installed on a client
#[derive(Clone, Default)]
pub struct Interceptors {
    pub request: Option<Rc<dyn RequestInterceptor>>,
    pub error: Option<Rc<dyn ErrorInterceptor>>,
}

impl Interceptors {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_request(mut self, interceptor: Rc<dyn RequestInterceptor>) -> Self {
        self.request = Some(interceptor);
        self
    }

    pub fn with_error(mut self, interceptor: Rc<dyn ErrorInterceptor>) -> Self {
        self.error = Some(interceptor);
        self
    }

    pub(crate) async fn before_send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        match &self.request {
            Some(interceptor) => interceptor.intercept(request).await,
            None => Ok(request),
        }
    }

    pub(crate) fn after_failure(&self, error: ClientError) -> ClientError {
        if let Some(interceptor) = &self.error {
            interceptor.on_error(&error);
        }
        error
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("request", &self.request.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

//! PNC HTTP client
//!
//! Typed access to the PNC REST API used by the web console. Requests pass
//! through an optional [`client::interceptor::RequestInterceptor`] before they
//! are sent, and every failed response is reported to an optional
//! [`client::interceptor::ErrorInterceptor`] before the error is returned.

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::interceptor::{ErrorInterceptor, Interceptors, RequestInterceptor};
pub use client::{PncClient, PncClientBuilder};
pub use types::{BuildRecord, BuildStatus, Page, PageQuery, SortOrder, User};

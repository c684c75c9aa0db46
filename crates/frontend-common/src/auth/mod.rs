//! Authentication module

pub mod identity;
pub mod interceptor;
pub mod keycloak;
pub mod session;

// Re-export commonly used items
pub use identity::{IdentityClient, IdentityError, InitOutcome};
pub use interceptor::{session_interceptors, BearerInterceptor, ErrorNotifier, FailureAction};
pub use keycloak::{AdapterConfig, KeycloakClient};
pub use session::AuthService;

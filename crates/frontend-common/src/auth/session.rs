//! Session context shared by the HTTP layer and the UI
//!
//! [`AuthService`] owns the identity client and the authenticated flag. It is
//! cheap to clone; clones share the same session.

use super::identity::{IdentityClient, IdentityError, InitOutcome};
use super::keycloak::KeycloakClient;
use crate::config::AuthConfig;
use crate::env::BrowserEnv;
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::watch;

#[derive(Default)]
struct SessionState {
    identity: Option<Rc<dyn IdentityClient>>,
    /// Survives logout so a repeated logout still knows where to go
    auth_server_url: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    env: Rc<dyn BrowserEnv>,
    state: Rc<RefCell<SessionState>>,
    authenticated: Rc<watch::Sender<bool>>,
}

impl AuthService {
    pub fn new(env: Rc<dyn BrowserEnv>) -> Self {
        Self {
            env,
            state: Rc::new(RefCell::new(SessionState::default())),
            authenticated: Rc::new(watch::channel(false).0),
        }
    }

    /// Log in with the Keycloak adapter configuration found at `config_url`.
    ///
    /// Any failure reloads the page.
    pub async fn login(&self, config_url: &str) -> Result<InitOutcome, IdentityError> {
        tracing::debug!("Begin login");
        match KeycloakClient::from_config_url(config_url, self.env.clone()).await {
            Ok(client) => self.login_with(Rc::new(client)).await,
            Err(error) => self.login_failed(error),
        }
    }

    /// Log in through an already constructed identity client
    pub async fn login_with(
        &self,
        identity: Rc<dyn IdentityClient>,
    ) -> Result<InitOutcome, IdentityError> {
        {
            let mut state = self.state.borrow_mut();
            state.auth_server_url = Some(identity.auth_server_url());
            state.identity = Some(identity.clone());
        }

        match identity.init_login_required().await {
            Ok(InitOutcome::Authenticated) => {
                tracing::info!(user = ?identity.username(), "Login Successful");
                self.authenticated.send_replace(true);
                Ok(InitOutcome::Authenticated)
            }
            Ok(InitOutcome::Redirecting) => Ok(InitOutcome::Redirecting),
            Err(error) => self.login_failed(error),
        }
    }

    fn login_failed(&self, error: IdentityError) -> Result<InitOutcome, IdentityError> {
        tracing::error!(%error, "Login Failed");
        self.env.reload();
        Err(error)
    }

    /// Drop the session and send the browser to the identity server's logout page
    pub fn logout(&self) {
        tracing::debug!("Begin logout");
        let auth_server_url = {
            let mut state = self.state.borrow_mut();
            let url = state
                .identity
                .as_ref()
                .map(|identity| identity.auth_server_url())
                .or_else(|| state.auth_server_url.clone());
            state.identity = None;
            url
        };
        self.authenticated.send_replace(false);

        match auth_server_url {
            Some(url) => self
                .env
                .assign(&format!("{url}{}", AuthConfig::LOGOUT_REDIRECT_SUFFIX)),
            None => tracing::warn!("logout before any login; nothing to redirect to"),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    /// The identity client of the current session
    pub fn identity(&self) -> Option<Rc<dyn IdentityClient>> {
        self.state.borrow().identity.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.identity().and_then(|identity| identity.username())
    }

    /// Observe the authenticated flag from now on
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }
}

impl PartialEq for AuthService {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

//! Keycloak identity client
//!
//! Implements the authorization-code login of a public Keycloak client and
//! refresh-token renewal of the access token.

use super::identity::{IdentityClient, IdentityError, InitOutcome};
use crate::config::AuthConfig;
use crate::env::BrowserEnv;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

/// Query parameters Keycloak appends to the redirect URI after login
const CALLBACK_PARAMS: [&str; 5] = ["code", "state", "session_state", "iss", "error"];

/// Keycloak adapter configuration (`keycloak.json`)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AdapterConfig {
    pub realm: String,
    #[serde(rename = "auth-server-url")]
    pub auth_server_url: String,
    /// Client id
    pub resource: String,
}

impl AdapterConfig {
    fn realm_url(&self) -> String {
        format!(
            "{}/realms/{}",
            self.auth_server_url.trim_end_matches('/'),
            self.realm
        )
    }

    pub fn authorization_endpoint(&self) -> String {
        format!("{}/protocol/openid-connect/auth", self.realm_url())
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/protocol/openid-connect/token", self.realm_url())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    preferred_username: Option<String>,
}

/// Decode the payload of a JWT without verifying it
fn decode_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[derive(Clone, Debug)]
struct TokenSet {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_at = response
            .expires_in
            .map(|secs| now + Duration::seconds(secs))
            .or_else(|| {
                decode_claims(&response.access_token)
                    .and_then(|claims| claims.exp)
                    .and_then(|exp| DateTime::from_timestamp(exp, 0))
            });

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at,
        }
    }

    /// Keycloak semantics: expired when less than `min_validity_secs` remain
    fn expires_within(&self, min_validity_secs: i64, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at - now < Duration::seconds(min_validity_secs))
    }
}

/// POST one grant to the token endpoint
async fn request_tokens(
    http: &reqwest::Client,
    endpoint: &str,
    form: &[(&str, &str)],
) -> Result<TokenSet, IdentityError> {
    let response = http.post(endpoint).form(form).send().await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        return Err(IdentityError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let tokens: TokenResponse = response.json().await?;
    Ok(TokenSet::from_response(tokens, Utc::now()))
}

/// Refresh-token grant; the old refresh token stays in use when Keycloak
/// does not rotate it.
async fn refresh_tokens(
    http: reqwest::Client,
    config: AdapterConfig,
    refresh_token: String,
) -> Result<TokenSet, IdentityError> {
    let mut tokens = request_tokens(
        &http,
        &config.token_endpoint(),
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", &refresh_token),
            ("client_id", &config.resource),
        ],
    )
    .await?;

    if tokens.refresh_token.is_none() {
        tokens.refresh_token = Some(refresh_token);
    }
    Ok(tokens)
}

type PendingRefresh = Shared<LocalBoxFuture<'static, Result<TokenSet, IdentityError>>>;

/// Keycloak client for a browser page
pub struct KeycloakClient {
    config: AdapterConfig,
    http: reqwest::Client,
    env: Rc<dyn BrowserEnv>,
    tokens: RefCell<Option<TokenSet>>,
    /// At most one refresh grant is in flight; concurrent callers await it
    refreshing: RefCell<Option<PendingRefresh>>,
}

impl KeycloakClient {
    pub fn new(config: AdapterConfig, env: Rc<dyn BrowserEnv>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            env,
            tokens: RefCell::new(None),
            refreshing: RefCell::new(None),
        }
    }

    /// Fetch the adapter configuration from `config_url`
    pub async fn from_config_url(
        config_url: &str,
        env: Rc<dyn BrowserEnv>,
    ) -> Result<Self, IdentityError> {
        let response = reqwest::get(config_url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Configuration(format!(
                "{config_url} answered {status}"
            )));
        }
        let config: AdapterConfig = response
            .json()
            .await
            .map_err(|e| IdentityError::Configuration(e.to_string()))?;

        tracing::debug!(realm = %config.realm, client = %config.resource, "loaded keycloak adapter");
        Ok(Self::new(config, env))
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// URL of the identity provider's login form for a login started at `redirect_uri`
    pub fn login_url(&self, redirect_uri: &str, state: &str) -> String {
        let mut url = match Url::parse(&self.config.authorization_endpoint()) {
            Ok(url) => url,
            Err(_) => return self.config.authorization_endpoint(),
        };
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.resource)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", state)
            .append_pair("response_mode", "query")
            .append_pair("response_type", "code")
            .append_pair("scope", "openid");
        url.into()
    }

    /// The refresh already in flight, or a new one if the token is about to expire
    fn pending_refresh(
        &self,
        min_validity_secs: i64,
    ) -> Result<Option<PendingRefresh>, IdentityError> {
        let mut refreshing = self.refreshing.borrow_mut();
        if let Some(pending) = refreshing.as_ref() {
            return Ok(Some(pending.clone()));
        }

        let current = self
            .tokens
            .borrow()
            .clone()
            .ok_or(IdentityError::NotAuthenticated)?;
        if !current.expires_within(min_validity_secs, Utc::now()) {
            return Ok(None);
        }
        let refresh_token = current
            .refresh_token
            .ok_or(IdentityError::NotAuthenticated)?;

        let pending = refresh_tokens(self.http.clone(), self.config.clone(), refresh_token)
            .boxed_local()
            .shared();
        *refreshing = Some(pending.clone());
        Ok(Some(pending))
    }

    async fn complete_login(&self, callback: &Url) -> Result<InitOutcome, IdentityError> {
        let param = |name: &str| {
            callback
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        let expected_state = self.env.session_get(AuthConfig::LOGIN_STATE_KEY);
        self.env.session_remove(AuthConfig::LOGIN_STATE_KEY);
        let redirect_uri = strip_callback_params(callback);
        self.env.replace_url(&redirect_uri);

        if let Some(error) = param("error") {
            return Err(IdentityError::Denied(error));
        }
        if expected_state.is_none() || param("state") != expected_state {
            return Err(IdentityError::StateMismatch);
        }
        let code = param("code").ok_or(IdentityError::StateMismatch)?;

        let tokens = request_tokens(
            &self.http,
            &self.config.token_endpoint(),
            &[
                ("grant_type", "authorization_code"),
                ("code", &code),
                ("client_id", &self.config.resource),
                ("redirect_uri", &redirect_uri),
            ],
        )
        .await?;
        *self.tokens.borrow_mut() = Some(tokens);

        Ok(InitOutcome::Authenticated)
    }
}

/// Remove the parameters Keycloak added on the way back from login
fn strip_callback_params(url: &Url) -> String {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !CALLBACK_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut clean = url.clone();
    clean.set_query(None);
    if !kept.is_empty() {
        clean.query_pairs_mut().extend_pairs(kept);
    }
    clean.into()
}

#[async_trait(?Send)]
impl IdentityClient for KeycloakClient {
    async fn init_login_required(&self) -> Result<InitOutcome, IdentityError> {
        let current = Url::parse(&self.env.current_url())
            .map_err(|e| IdentityError::Configuration(format!("page URL: {e}")))?;

        let is_callback = current
            .query_pairs()
            .any(|(key, _)| key == "code" || key == "error");
        if is_callback {
            return self.complete_login(&current).await;
        }

        let state = uuid::Uuid::new_v4().to_string();
        self.env.session_set(AuthConfig::LOGIN_STATE_KEY, &state);
        let login_url = self.login_url(&strip_callback_params(&current), &state);
        tracing::debug!(%login_url, "redirecting to login");
        self.env.assign(&login_url);

        Ok(InitOutcome::Redirecting)
    }

    fn token(&self) -> Option<String> {
        self.tokens
            .borrow()
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    async fn update_token(&self, min_validity_secs: i64) -> Result<bool, IdentityError> {
        let Some(pending) = self.pending_refresh(min_validity_secs)? else {
            return Ok(false);
        };

        let result = pending.clone().await;
        {
            let mut refreshing = self.refreshing.borrow_mut();
            if refreshing
                .as_ref()
                .is_some_and(|current| current.ptr_eq(&pending))
            {
                *refreshing = None;
            }
        }

        let tokens = result?;
        tracing::debug!("access token refreshed");
        *self.tokens.borrow_mut() = Some(tokens);
        Ok(true)
    }

    fn auth_server_url(&self) -> String {
        self.config.auth_server_url.trim_end_matches('/').to_string()
    }

    fn username(&self) -> Option<String> {
        self.tokens
            .borrow()
            .as_ref()
            .and_then(|tokens| decode_claims(&tokens.access_token))
            .and_then(|claims| claims.preferred_username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::testing::RecordingEnv;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = "http://localhost:9090/pnc-web/index.html";

    fn adapter(server: &MockServer) -> AdapterConfig {
        AdapterConfig {
            realm: "PNC.REDHAT.COM".into(),
            auth_server_url: format!("{}/auth", server.uri()),
            resource: "pncweb".into(),
        }
    }

    fn jwt(claims: serde_json::Value) -> String {
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("eyJhbGciOiJub25lIn0.{payload}.sig")
    }

    async fn mount_token(server: &MockServer, grant: &str, body: serde_json::Value, expect: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/realms/PNC.REDHAT.COM/protocol/openid-connect/token"))
            .and(body_string_contains(format!("grant_type={grant}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expect)
            .mount(server)
            .await;
    }

    /// Log in through a code callback, handing out a token valid for `expires_in`
    async fn logged_in(server: &MockServer, expires_in: i64) -> (KeycloakClient, Rc<RecordingEnv>) {
        mount_token(
            server,
            "authorization_code",
            json!({
                "access_token": jwt(json!({ "preferred_username": "jdoe" })),
                "expires_in": expires_in,
                "refresh_token": "refresh-1"
            }),
            1,
        )
        .await;

        let env = Rc::new(RecordingEnv::at(&format!("{PAGE}?state=s1&code=c1")));
        env.session_set(AuthConfig::LOGIN_STATE_KEY, "s1");
        let client = KeycloakClient::new(adapter(server), env.clone());
        assert_eq!(
            client.init_login_required().await.unwrap(),
            InitOutcome::Authenticated
        );
        (client, env)
    }

    #[tokio::test]
    async fn test_from_config_url_reads_adapter_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pnc-web/keycloak.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "realm": "PNC.REDHAT.COM",
                "auth-server-url": "https://sso.example.com/auth/",
                "resource": "pncweb",
                "public-client": true
            })))
            .mount(&server)
            .await;

        let client = KeycloakClient::from_config_url(
            &format!("{}/pnc-web/keycloak.json", server.uri()),
            Rc::new(RecordingEnv::at(PAGE)),
        )
        .await
        .unwrap();

        assert_eq!(client.auth_server_url(), "https://sso.example.com/auth");
        assert_eq!(
            client.config().token_endpoint(),
            "https://sso.example.com/auth/realms/PNC.REDHAT.COM/protocol/openid-connect/token"
        );
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn test_init_without_callback_redirects_to_login() {
        let server = MockServer::start().await;
        let env = Rc::new(RecordingEnv::at(PAGE));
        let client = KeycloakClient::new(adapter(&server), env.clone());

        let outcome = client.init_login_required().await.unwrap();
        assert_eq!(outcome, InitOutcome::Redirecting);

        let state = env.session_get(AuthConfig::LOGIN_STATE_KEY).unwrap();
        let assigned = env.assigned.borrow();
        assert_eq!(assigned.len(), 1);
        let login = Url::parse(&assigned[0]).unwrap();
        assert_eq!(
            login.path(),
            "/auth/realms/PNC.REDHAT.COM/protocol/openid-connect/auth"
        );
        let pairs: Vec<(String, String)> = login.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("state".into(), state)));
        assert!(pairs.contains(&("redirect_uri".into(), PAGE.into())));
        assert!(pairs.contains(&("client_id".into(), "pncweb".into())));
    }

    #[tokio::test]
    async fn test_callback_exchanges_code_and_cleans_address_bar() {
        let server = MockServer::start().await;
        let (client, env) = logged_in(&server, 300).await;

        assert!(client.token().is_some());
        assert_eq!(client.username().as_deref(), Some("jdoe"));
        assert_eq!(env.replaced.borrow().as_slice(), &[PAGE.to_string()]);
        assert!(env.session_get(AuthConfig::LOGIN_STATE_KEY).is_none());
    }

    #[tokio::test]
    async fn test_callback_with_foreign_state_is_rejected() {
        let server = MockServer::start().await;
        let env = Rc::new(RecordingEnv::at(&format!("{PAGE}?state=forged&code=c1")));
        env.session_set(AuthConfig::LOGIN_STATE_KEY, "s1");
        let client = KeycloakClient::new(adapter(&server), env);

        let result = client.init_login_required().await;
        assert!(matches!(result, Err(IdentityError::StateMismatch)));
        assert!(client.token().is_none());
    }

    #[tokio::test]
    async fn test_callback_error_is_reported() {
        let server = MockServer::start().await;
        let env = Rc::new(RecordingEnv::at(&format!("{PAGE}?error=access_denied&state=s1")));
        let client = KeycloakClient::new(adapter(&server), env);

        let result = client.init_login_required().await;
        assert!(matches!(result, Err(IdentityError::Denied(ref e)) if e == "access_denied"));
    }

    #[tokio::test]
    async fn test_update_token_keeps_fresh_token() {
        let server = MockServer::start().await;
        let (client, _env) = logged_in(&server, 300).await;
        mount_token(&server, "refresh_token", json!({ "access_token": "never" }), 0).await;

        assert!(!client.update_token(AuthConfig::TOKEN_MIN_VALIDITY_SECS).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_token_refreshes_within_grace_window() {
        let server = MockServer::start().await;
        let (client, _env) = logged_in(&server, 3).await;
        mount_token(
            &server,
            "refresh_token",
            json!({ "access_token": "fresh", "expires_in": 300, "refresh_token": "refresh-2" }),
            1,
        )
        .await;

        assert!(client.update_token(AuthConfig::TOKEN_MIN_VALIDITY_SECS).await.unwrap());
        assert_eq!(client.token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_concurrent_updates_share_one_refresh() {
        let server = MockServer::start().await;
        let (client, _env) = logged_in(&server, 1).await;
        mount_token(
            &server,
            "refresh_token",
            json!({ "access_token": "fresh", "expires_in": 300, "refresh_token": "refresh-2" }),
            1,
        )
        .await;

        let (first, second) = futures::join!(
            client.update_token(AuthConfig::TOKEN_MIN_VALIDITY_SECS),
            client.update_token(AuthConfig::TOKEN_MIN_VALIDITY_SECS)
        );

        assert!(first.unwrap());
        assert!(second.unwrap());
        assert_eq!(client.token().as_deref(), Some("fresh"));
        let grants = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|request| String::from_utf8_lossy(&request.body).contains("grant_type=refresh_token"))
            .count();
        assert_eq!(grants, 1);
    }

    #[tokio::test]
    async fn test_refresh_without_new_refresh_token_keeps_old_one() {
        let server = MockServer::start().await;
        let (client, _env) = logged_in(&server, 1).await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "short-lived", "expires_in": 1 })),
            )
            .expect(2)
            .mount(&server)
            .await;

        assert!(client.update_token(AuthConfig::TOKEN_MIN_VALIDITY_SECS).await.unwrap());
        assert!(client.update_token(AuthConfig::TOKEN_MIN_VALIDITY_SECS).await.unwrap());
        assert_eq!(client.token().as_deref(), Some("short-lived"));
    }

    #[tokio::test]
    async fn test_update_token_failure_is_an_error() {
        let server = MockServer::start().await;
        let (client, _env) = logged_in(&server, 1).await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let result = client.update_token(AuthConfig::TOKEN_MIN_VALIDITY_SECS).await;
        assert!(matches!(result, Err(IdentityError::Server { status: 400, .. })));
    }

    #[test]
    fn test_expiry_falls_back_to_jwt_exp() {
        let now = Utc::now();
        let tokens = TokenSet::from_response(
            TokenResponse {
                access_token: jwt(json!({ "exp": now.timestamp() + 2 })),
                expires_in: None,
                refresh_token: None,
            },
            now,
        );

        assert!(tokens.expires_within(5, now));
        assert!(!tokens.expires_within(1, now));
    }
}

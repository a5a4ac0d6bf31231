//! Main client: applies recipes, attaches credentials, tracks the session.

use crate::auth::{extract_access_token, Credentials, Session};
use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::{ConfigError, ForwardResult};
use crate::recipe::{ForwardingRecipe, SessionEffect};
use crate::transport::HttpTransport;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Anything that can carry out a forwarding recipe.
///
/// [`RelayClient`] is the production implementation; the dispatch layer only
/// depends on this trait.
#[async_trait::async_trait]
pub trait Forward: Send + Sync {
    async fn forward(
        &self,
        recipe: &ForwardingRecipe,
        arguments: Map<String, Value>,
    ) -> ForwardResult<Value>;
}

/// Client relaying recipe-shaped calls to the BugRelay API.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: HttpTransport,
    credentials: Credentials,
}

impl RelayClient {
    /// Create a new client builder.
    pub fn builder() -> RelayClientBuilder {
        RelayClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        let session = Session::new(config.default_bearer_token.clone());
        let credentials = Credentials::new(session, config.api_key.clone());
        let http = HttpTransport::new(Arc::new(config))?;

        Ok(Self { http, credentials })
    }

    pub fn config(&self) -> &ClientConfig {
        self.http.config()
    }

    /// The session bearer token slot shared by every clone of this client.
    pub fn session(&self) -> &Session {
        &self.credentials.session
    }

    async fn apply_session_effect(&self, recipe: &ForwardingRecipe, response: &Value) {
        match recipe.session {
            SessionEffect::None => {}
            SessionEffect::Capture => match extract_access_token(response) {
                Some(token) => {
                    self.credentials.session.set_token(token).await;
                    info!(tool = recipe.tool, "Session bearer token updated");
                }
                None => warn!(
                    tool = recipe.tool,
                    "Authentication call succeeded without an access token in the response"
                ),
            },
            SessionEffect::Clear => {
                self.credentials.session.clear().await;
                info!(tool = recipe.tool, "Session bearer token cleared");
            }
        }
    }
}

#[async_trait::async_trait]
impl Forward for RelayClient {
    async fn forward(
        &self,
        recipe: &ForwardingRecipe,
        arguments: Map<String, Value>,
    ) -> ForwardResult<Value> {
        let request = recipe.prepare(&self.config().base_url, arguments)?;

        let auth = self
            .credentials
            .resolve_headers(request.bearer_token.as_deref())
            .await;
        if auth.is_empty() && recipe.requires_auth {
            debug!(
                tool = recipe.tool,
                "No credentials available for an authenticated endpoint, sending anyway"
            );
        }

        let response = self.http.send(&request, auth).await?;
        self.apply_session_effect(recipe, &response).await;
        Ok(response)
    }
}

/// Builder for creating a RelayClient.
pub struct RelayClientBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    default_bearer_token: Option<String>,
    timeout: Duration,
    max_retries: u32,
}

impl RelayClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            default_bearer_token: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }

    /// Set the base URL of the BugRelay API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the static API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Seed the session with a bearer token.
    pub fn default_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.default_bearer_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the declared retry budget.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<RelayClient, ConfigError> {
        let base_url = Url::parse(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "base URL must be an http(s) URL, got {}",
                base_url
            )));
        }

        let config = ClientConfig {
            base_url,
            api_key: self.api_key.filter(|k| !k.is_empty()),
            default_bearer_token: self.default_bearer_token.filter(|t| !t.is_empty()),
            timeout: self.timeout,
            max_retries: self.max_retries,
        };

        RelayClient::from_config(config)
    }
}

impl Default for RelayClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::API_KEY_HEADER;
    use crate::recipe::{Fields, HttpMethod};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN: ForwardingRecipe =
        ForwardingRecipe::new("login_user", HttpMethod::Post, "/api/v1/auth/login")
            .body(Fields::Remaining)
            .required(&["email", "password"])
            .session(SessionEffect::Capture);

    const LOGOUT: ForwardingRecipe =
        ForwardingRecipe::new("logout_user", HttpMethod::Post, "/api/v1/auth/logout")
            .authenticated()
            .session(SessionEffect::Clear);

    const PROFILE: ForwardingRecipe =
        ForwardingRecipe::new("get_user_profile", HttpMethod::Get, "/api/v1/auth/profile")
            .authenticated();

    const REFRESH: ForwardingRecipe =
        ForwardingRecipe::new("refresh_token", HttpMethod::Post, "/api/v1/auth/refresh")
            .body(Fields::Only(&["refresh_token"]))
            .required(&["refresh_token"])
            .session(SessionEffect::Capture);

    const OAUTH_CALLBACK: ForwardingRecipe = ForwardingRecipe::new(
        "handle_oauth_callback",
        HttpMethod::Get,
        "/api/v1/auth/oauth/callback/{provider}",
    )
    .path_params(&["provider"])
    .query(Fields::Only(&["code", "state"]))
    .required(&["code"])
    .session(SessionEffect::Capture);

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_builder_rejects_bad_urls() {
        assert!(matches!(
            RelayClient::builder().base_url("not a url").build(),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            RelayClient::builder().base_url("mailto:bugs@example.com").build(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_builder_defaults() {
        let client = RelayClient::builder().build().unwrap();
        assert_eq!(client.config().base_url.as_str(), "http://localhost:8080/");
        assert_eq!(client.config().timeout, Duration::from_secs(30));
        assert!(client.config().api_key.is_none());
    }

    #[tokio::test]
    async fn test_login_captures_session_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "LOGIN_SUCCESS",
                "data": {"access_token": "jwt-abc", "refresh_token": "r", "expires_in": 3600}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/auth/profile"))
            .and(header("authorization", "Bearer jwt-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "a@b.c"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = RelayClient::builder()
            .base_url(server.uri())
            .api_key("static-key")
            .build()
            .unwrap();

        client
            .forward(&LOGIN, args(json!({"email": "a@b.c", "password": "pw"})))
            .await
            .unwrap();
        assert_eq!(client.session().token().await.as_deref(), Some("jwt-abc"));

        let profile = client.forward(&PROFILE, Map::new()).await.unwrap();
        assert_eq!(profile, json!({"email": "a@b.c"}));
    }

    #[tokio::test]
    async fn test_oauth_callback_captures_session_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/auth/oauth/callback/github"))
            .and(query_param("code", "gh-code"))
            .and(query_param("state", "xyz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-oauth",
                "user": {"email": "a@b.c"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RelayClient::builder().base_url(server.uri()).build().unwrap();
        client
            .forward(
                &OAUTH_CALLBACK,
                args(json!({"provider": "github", "code": "gh-code", "state": "xyz"})),
            )
            .await
            .unwrap();

        assert_eq!(client.session().token().await.as_deref(), Some("jwt-oauth"));
        let received = server.received_requests().await.unwrap();
        assert!(received[0].body.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_replaces_session_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/refresh"))
            .and(header("authorization", "Bearer expired"))
            .and(body_json(json!({"refresh_token": "r-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"access_token": "jwt-fresh", "expires_in": 3600}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RelayClient::builder()
            .base_url(server.uri())
            .default_bearer_token("expired")
            .build()
            .unwrap();

        client
            .forward(&REFRESH, args(json!({"refresh_token": "r-1"})))
            .await
            .unwrap();

        assert_eq!(client.session().token().await.as_deref(), Some("jwt-fresh"));
    }

    #[tokio::test]
    async fn test_concurrent_logins_last_completed_wins() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(body_partial_json(json!({"email": "slow@b.c"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": {"access_token": "token-slow"}}))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(body_partial_json(json!({"email": "fast@b.c"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"access_token": "token-fast"}})),
            )
            .mount(&server)
            .await;

        let client = RelayClient::builder().base_url(server.uri()).build().unwrap();
        let slow_client = client.clone();
        let fast_client = client.clone();

        let slow = tokio::spawn(async move {
            slow_client
                .forward(&LOGIN, args(json!({"email": "slow@b.c", "password": "pw"})))
                .await
        });
        let fast = tokio::spawn(async move {
            fast_client
                .forward(&LOGIN, args(json!({"email": "fast@b.c", "password": "pw"})))
                .await
        });

        // every read in between sees a whole token or none
        let watcher = {
            let session = client.session().clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let token = session.token().await;
                    assert!(matches!(
                        token.as_deref(),
                        None | Some("token-fast") | Some("token-slow")
                    ));
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
        };

        fast.await.unwrap().unwrap();
        slow.await.unwrap().unwrap();
        watcher.await.unwrap();

        assert_eq!(client.session().token().await.as_deref(), Some("token-slow"));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_untouched() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"code": "INVALID_CREDENTIALS", "message": "Invalid email or password"}})),
            )
            .mount(&server)
            .await;

        let client = RelayClient::builder()
            .base_url(server.uri())
            .default_bearer_token("seeded")
            .build()
            .unwrap();

        let err = client
            .forward(&LOGIN, args(json!({"email": "a@b.c", "password": "wrong"})))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "HTTP 401: Invalid email or password");
        assert_eq!(client.session().token().await.as_deref(), Some("seeded"));
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_falls_back_to_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/logout"))
            .and(header("authorization", "Bearer seeded"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/auth/profile"))
            .and(header(API_KEY_HEADER, "static-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = RelayClient::builder()
            .base_url(server.uri())
            .api_key("static-key")
            .default_bearer_token("seeded")
            .build()
            .unwrap();

        client.forward(&LOGOUT, Map::new()).await.unwrap();
        assert!(client.session().token().await.is_none());

        client.forward(&PROFILE, Map::new()).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let profile_request = received
            .iter()
            .find(|r| r.url.path() == "/api/v1/auth/profile")
            .unwrap();
        assert!(!profile_request.headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_argument_error_makes_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = RelayClient::builder().base_url(server.uri()).build().unwrap();
        let err = client
            .forward(&LOGIN, args(json!({"email": "a@b.c"})))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing required argument: password");
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Port 9 (discard) on localhost is essentially never listening
        let client = RelayClient::builder()
            .base_url("http://127.0.0.1:9")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let err = client.forward(&PROFILE, Map::new()).await.unwrap_err();
        assert!(err.to_string().starts_with("Request failed:"));
    }
}

//! Credential selection for outbound requests.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The bearer token obtained by a successful login-style call.
///
/// Cloning shares the same slot. Reads and writes go through one lock, and a
/// write replaces the whole value, so no reader sees a partial update.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(initial)),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }
}

/// The single credential attached to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer(String),
    ApiKey(String),
}

impl AuthScheme {
    fn header(&self) -> Option<(HeaderName, HeaderValue)> {
        match self {
            Self::Bearer(token) => HeaderValue::from_str(&format!("Bearer {}", token))
                .ok()
                .map(|value| (AUTHORIZATION, mark_sensitive(value))),
            Self::ApiKey(key) => HeaderValue::from_str(key)
                .ok()
                .map(|value| (HeaderName::from_static(API_KEY_HEADER), mark_sensitive(value))),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "bearer",
            Self::ApiKey(_) => "api_key",
        }
    }
}

fn mark_sensitive(mut value: HeaderValue) -> HeaderValue {
    value.set_sensitive(true);
    value
}

/// Everything the resolver can draw on besides the per-call token.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub session: Session,
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn new(session: Session, api_key: Option<String>) -> Self {
        Self { session, api_key }
    }

    /// Pick the credential for one call.
    ///
    /// Precedence: the per-call bearer token, then the session token, then the
    /// static API key. Empty strings count as absent.
    pub async fn resolve(&self, per_call_token: Option<&str>) -> Option<AuthScheme> {
        if let Some(token) = per_call_token.filter(|t| !t.is_empty()) {
            return Some(AuthScheme::Bearer(token.to_string()));
        }
        if let Some(token) = self.session.token().await.filter(|t| !t.is_empty()) {
            return Some(AuthScheme::Bearer(token));
        }
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(|key| AuthScheme::ApiKey(key.to_string()))
    }

    /// Resolve the authentication headers for one call: zero or one entry.
    pub async fn resolve_headers(&self, per_call_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(scheme) = self.resolve(per_call_token).await {
            match scheme.header() {
                Some((name, value)) => {
                    headers.insert(name, value);
                }
                None => tracing::warn!(
                    scheme = scheme.kind(),
                    "Credential contains characters not allowed in a header, sending unauthenticated"
                ),
            }
        }
        headers
    }
}

/// Find the access token in a login-style response.
///
/// BugRelay wraps it as `{"data": {"access_token": ...}}`; a bare top-level
/// `access_token` is accepted too.
pub fn extract_access_token(response: &Value) -> Option<&str> {
    response
        .get("data")
        .and_then(|data| data.get("access_token"))
        .or_else(|| response.get("access_token"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
}

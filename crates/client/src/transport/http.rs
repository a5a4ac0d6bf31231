//! HTTP transport for the BugRelay client.

use crate::config::{ClientConfig, USER_AGENT};
use crate::error::{ConfigError, ForwardError, ForwardResult};
use crate::recipe::PreparedRequest;
use reqwest::{header, Client};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// HTTP transport issuing one request per prepared call.
///
/// The inner [`Client`] pools connections and is shared by every clone, so
/// concurrent calls reuse it freely.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, ConfigError> {
        if config.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue one request. No retries happen here.
    ///
    /// A 2xx body is parsed and returned verbatim (an empty body becomes `null`).
    /// Any other status becomes [`ForwardError::Backend`]; connection failures,
    /// timeouts and unparseable bodies become [`ForwardError::Transport`].
    pub async fn send(
        &self,
        request: &PreparedRequest,
        auth: header::HeaderMap,
    ) -> ForwardResult<Value> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.clone())
            .headers(auth);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, path = %request.url.path(), "Sending backend request");
        let started = Instant::now();

        let response = builder
            .send()
            .await
            .map_err(|e| ForwardError::from_transport(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ForwardError::from_transport(&e))?;

        debug!(
            method = %request.method,
            path = %request.url.path(),
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend responded"
        );

        if !status.is_success() {
            return Err(ForwardError::from_response(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| ForwardError::Transport(format!("malformed response body: {}", e)))
    }
}

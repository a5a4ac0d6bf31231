//! Error types for the BugRelay client.
//!
//! Every failure the forwarder can produce is a [`ForwardError`]. The MCP layer
//! never sees these directly: they pass through [`NormalizedError`] first, which
//! is the only shape that reaches a caller.

use serde_json::Value;
use std::fmt;

/// Result type for forwarding operations.
pub type ForwardResult<T> = Result<T, ForwardError>;

/// Failures raised while translating a tool invocation into an HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// A required argument was absent or null.
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// An argument was present but unusable (wrong type, empty path segment).
    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Backend {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// The call could not complete: connect failure, timeout, unreadable body.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The tool name has no dispatch entry.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ForwardError {
    /// Build a backend error from a status code and the raw response body.
    ///
    /// The message is taken from the body's `error` field when the body is JSON.
    /// BugRelay nests errors as `{"error": {"code", "message", "details"}}`, so an
    /// object-valued `error` contributes its `message`. Anything else falls back to
    /// the raw text.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();

        if let Some(error) = parsed.as_ref().and_then(|v| v.get("error")) {
            match error {
                Value::String(message) => {
                    let details = parsed
                        .as_ref()
                        .and_then(|v| v.get("details"))
                        .map(render_value);
                    return Self::Backend {
                        status,
                        message: message.clone(),
                        details,
                    };
                }
                Value::Object(fields) => {
                    let message = fields
                        .get("message")
                        .map(render_value)
                        .unwrap_or_else(|| error.to_string());
                    return Self::Backend {
                        status,
                        message,
                        details: fields.get("details").map(render_value),
                    };
                }
                Value::Null => {}
                other => {
                    return Self::Backend {
                        status,
                        message: other.to_string(),
                        details: None,
                    };
                }
            }
        }

        let text = body.trim();
        if text.is_empty() {
            let reason = reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|code| code.canonical_reason())
                .unwrap_or("empty response body");
            return Self::Backend {
                status,
                message: reason.to_string(),
                details: None,
            };
        }

        // Proxies answer with HTML pages; the summary stays one short line and
        // the full body moves to details.
        let message = summarize_body(text);
        let details = (message != text).then(|| text.to_string());
        Self::Backend {
            status,
            message,
            details,
        }
    }

    /// Describe a reqwest failure, including its source chain.
    ///
    /// reqwest's own message ("error sending request for url ...") hides the
    /// interesting part ("Connection refused") in the source errors.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Transport(format!("request timed out ({})", chain(err)));
        }
        Self::Transport(chain(err))
    }
}

fn chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}

/// Longest raw body text echoed into a summary.
const MAX_SUMMARY_CHARS: usize = 200;

fn summarize_body(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(MAX_SUMMARY_CHARS) {
        Some((cut, _)) => format!("{}...", &collapsed[..cut]),
        None => collapsed,
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Failures building a client from configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The base URL did not parse.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A setting is out of range or malformed.
    #[error("Configuration error: {0}")]
    Invalid(String),

    /// reqwest refused the client settings.
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// The caller-visible form of any failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedError {
    pub summary: String,
    pub detail: Option<String>,
}

impl NormalizedError {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for NormalizedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

impl std::error::Error for NormalizedError {}

/// Convert a forwarding failure into caller-visible text.
pub fn normalize(error: &ForwardError) -> NormalizedError {
    let normalized = NormalizedError::new(error.to_string());
    match error {
        ForwardError::Backend {
            details: Some(details),
            ..
        } => normalized.with_detail(details.clone()),
        _ => normalized,
    }
}

impl From<ForwardError> for NormalizedError {
    fn from(error: ForwardError) -> Self {
        normalize(&error)
    }
}

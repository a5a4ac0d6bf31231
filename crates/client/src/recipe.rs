//! Forwarding recipes: the static description of how a tool becomes an HTTP call.
//!
//! A recipe names the method, a path template with `{placeholders}`, and which
//! arguments travel as path segments, query parameters, or JSON body fields.
//! [`ForwardingRecipe::prepare`] applies a recipe to an argument bag without any
//! I/O, so every validation failure happens before the network is touched.

use crate::error::{ForwardError, ForwardResult};
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

/// Argument reserved for a per-call bearer token. Never forwarded.
pub const AUTH_TOKEN_ARG: &str = "auth_token";

/// HTTP methods a recipe may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// GET and DELETE requests never carry a body.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Self::Get | Self::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Which arguments a destination (query string or body) receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fields {
    /// Nothing.
    None,
    /// Every argument not consumed by the path or an explicit query list.
    Remaining,
    /// Exactly these names, when present.
    Only(&'static [&'static str]),
}

/// What a successful call does to the session bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    None,
    /// Store the access token from the response.
    Capture,
    /// Forget the current token.
    Clear,
}

/// Static rule translating one tool invocation into one HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardingRecipe {
    pub tool: &'static str,
    pub method: HttpMethod,
    pub path: &'static str,
    pub path_params: &'static [&'static str],
    pub query: Fields,
    pub body: Fields,
    /// Non-path arguments that must be present and non-null.
    pub required: &'static [&'static str],
    /// Values used for body or query fields the caller left out.
    pub defaults: &'static [(&'static str, &'static str)],
    /// The backend rejects this call without credentials.
    pub requires_auth: bool,
    pub session: SessionEffect,
}

impl ForwardingRecipe {
    /// A recipe with no path params, query, body, or requirements.
    pub const fn new(tool: &'static str, method: HttpMethod, path: &'static str) -> Self {
        Self {
            tool,
            method,
            path,
            path_params: &[],
            query: Fields::None,
            body: Fields::None,
            required: &[],
            defaults: &[],
            requires_auth: false,
            session: SessionEffect::None,
        }
    }

    pub const fn path_params(mut self, names: &'static [&'static str]) -> Self {
        self.path_params = names;
        self
    }

    pub const fn query(mut self, fields: Fields) -> Self {
        self.query = fields;
        self
    }

    pub const fn body(mut self, fields: Fields) -> Self {
        self.body = fields;
        self
    }

    pub const fn required(mut self, names: &'static [&'static str]) -> Self {
        self.required = names;
        self
    }

    pub const fn defaults(mut self, pairs: &'static [(&'static str, &'static str)]) -> Self {
        self.defaults = pairs;
        self
    }

    pub const fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub const fn session(mut self, effect: SessionEffect) -> Self {
        self.session = effect;
        self
    }

    /// Validate arguments and lay out the request: URL, query pairs, body.
    pub fn prepare(&self, base_url: &Url, mut arguments: Map<String, Value>) -> ForwardResult<PreparedRequest> {
        let bearer_token = match arguments.remove(AUTH_TOKEN_ARG) {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => Some(token),
            Some(_) => {
                return Err(ForwardError::InvalidArgument {
                    field: AUTH_TOKEN_ARG.to_string(),
                    reason: "expected a string".to_string(),
                })
            }
        };

        for name in self.required {
            if is_absent(arguments.get(*name)) {
                return Err(ForwardError::MissingArgument((*name).to_string()));
            }
        }

        let mut segments = Vec::with_capacity(self.path_params.len());
        for name in self.path_params {
            let value = arguments
                .remove(*name)
                .filter(|v| !v.is_null())
                .ok_or_else(|| ForwardError::MissingArgument((*name).to_string()))?;
            segments.push((*name, path_segment(name, &value)?));
        }

        let url = self.build_url(base_url, &segments)?;

        for (name, value) in self.defaults {
            if is_absent(arguments.get(*name)) {
                arguments.insert((*name).to_string(), Value::String((*value).to_string()));
            }
        }

        let query_args = take_fields(&mut arguments, self.query);
        let mut query = Vec::new();
        for (name, value) in query_args {
            push_query_pair(&mut query, &name, &value);
        }

        let body_args = take_fields(&mut arguments, self.body);
        let body = if self.method.allows_body() && !matches!(self.body, Fields::None) {
            Some(Value::Object(body_args))
        } else {
            None
        };

        Ok(PreparedRequest {
            method: self.method,
            url,
            query,
            body,
            bearer_token,
        })
    }

    fn build_url(&self, base_url: &Url, segments: &[(&str, String)]) -> ForwardResult<Url> {
        let mut url = base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ForwardError::Transport(format!("base URL cannot carry a path: {}", base_url))
            })?;
            path.pop_if_empty();
            for part in self.path.split('/').filter(|p| !p.is_empty()) {
                match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                    Some(placeholder) => {
                        let value = segments
                            .iter()
                            .find(|(name, _)| *name == placeholder)
                            .map(|(_, value)| value.as_str())
                            .ok_or_else(|| ForwardError::MissingArgument(placeholder.to_string()))?;
                        path.push(value);
                    }
                    None => {
                        path.push(part);
                    }
                }
            }
        }
        Ok(url)
    }
}

/// A fully laid-out request, ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Per-call bearer token lifted out of the arguments.
    pub bearer_token: Option<String>,
}

fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn path_segment(name: &str, value: &Value) -> ForwardResult<String> {
    let segment = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(ForwardError::InvalidArgument {
                field: name.to_string(),
                reason: "expected a string or number".to_string(),
            })
        }
    };
    if segment.is_empty() {
        return Err(ForwardError::InvalidArgument {
            field: name.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    // the URL parser would resolve these and change the route
    if segment == "." || segment == ".." {
        return Err(ForwardError::InvalidArgument {
            field: name.to_string(),
            reason: "must not be a dot segment".to_string(),
        });
    }
    Ok(segment)
}

fn take_fields(arguments: &mut Map<String, Value>, fields: Fields) -> Map<String, Value> {
    match fields {
        Fields::None => Map::new(),
        Fields::Remaining => std::mem::take(arguments),
        Fields::Only(names) => names
            .iter()
            .filter_map(|name| {
                arguments
                    .remove(*name)
                    .filter(|v| !v.is_null())
                    .map(|v| ((*name).to_string(), v))
            })
            .collect(),
    }
}

fn push_query_pair(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => query.push((name.to_string(), s.clone())),
        Value::Bool(_) | Value::Number(_) => query.push((name.to_string(), value.to_string())),
        Value::Array(items) => {
            for item in items {
                push_query_pair(query, name, item);
            }
        }
        Value::Object(_) => query.push((name.to_string(), value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("http://localhost:8080").unwrap()
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    const GET_BUG: ForwardingRecipe =
        ForwardingRecipe::new("get_bug_report", HttpMethod::Get, "/api/v1/bugs/{bug_id}")
            .path_params(&["bug_id"]);

    #[test]
    fn test_path_substitution_keeps_plain_characters() {
        let prepared = GET_BUG
            .prepare(&base(), args(json!({"bug_id": "abc-123"})))
            .unwrap();

        assert_eq!(prepared.url.path(), "/api/v1/bugs/abc-123");
        assert!(prepared.query.is_empty());
        assert!(prepared.body.is_none());
    }

    #[test]
    fn test_path_substitution_encodes_separators() {
        let prepared = GET_BUG
            .prepare(&base(), args(json!({"bug_id": "a/b c"})))
            .unwrap();

        assert_eq!(prepared.url.path(), "/api/v1/bugs/a%2Fb%20c");
    }

    #[test]
    fn test_numeric_path_param() {
        let prepared = GET_BUG.prepare(&base(), args(json!({"bug_id": 42}))).unwrap();
        assert_eq!(prepared.url.path(), "/api/v1/bugs/42");
    }

    #[test]
    fn test_missing_path_param() {
        let err = GET_BUG.prepare(&base(), Map::new()).unwrap_err();
        assert!(matches!(err, ForwardError::MissingArgument(ref f) if f == "bug_id"));

        let err = GET_BUG
            .prepare(&base(), args(json!({"bug_id": null})))
            .unwrap_err();
        assert!(matches!(err, ForwardError::MissingArgument(_)));
    }

    #[test]
    fn test_invalid_path_param() {
        let err = GET_BUG
            .prepare(&base(), args(json!({"bug_id": {"nested": true}})))
            .unwrap_err();
        assert!(matches!(err, ForwardError::InvalidArgument { ref field, .. } if field == "bug_id"));

        let err = GET_BUG.prepare(&base(), args(json!({"bug_id": ""}))).unwrap_err();
        assert!(matches!(err, ForwardError::InvalidArgument { .. }));
    }

    #[test]
    fn test_dot_segments_rejected() {
        let remove_bug = ForwardingRecipe::new("remove_bug", HttpMethod::Delete, "/api/v1/admin/bugs/{bug_id}")
            .path_params(&["bug_id"]);

        for value in [".", ".."] {
            let err = remove_bug
                .prepare(&base(), args(json!({"bug_id": value})))
                .unwrap_err();
            assert_eq!(err.to_string(), "Invalid argument bug_id: must not be a dot segment");
        }

        // dots inside a segment are ordinary characters
        let prepared = remove_bug
            .prepare(&base(), args(json!({"bug_id": "...x"})))
            .unwrap();
        assert_eq!(prepared.url.path(), "/api/v1/admin/bugs/...x");
    }

    #[test]
    fn test_base_url_prefix_is_kept() {
        let prefixed = Url::parse("https://example.com/relay/").unwrap();
        let prepared = GET_BUG
            .prepare(&prefixed, args(json!({"bug_id": "x"})))
            .unwrap();

        assert_eq!(prepared.url.as_str(), "https://example.com/relay/api/v1/bugs/x");
    }

    #[test]
    fn test_remaining_arguments_become_body() {
        let recipe = ForwardingRecipe::new("create_bug_report", HttpMethod::Post, "/api/v1/bugs")
            .body(Fields::Remaining)
            .required(&["title", "description"]);

        let prepared = recipe
            .prepare(
                &base(),
                args(json!({"title": "Crash", "description": "boom", "auth_token": "t-1"})),
            )
            .unwrap();

        assert_eq!(prepared.body, Some(json!({"title": "Crash", "description": "boom"})));
        assert_eq!(prepared.bearer_token.as_deref(), Some("t-1"));
    }

    #[test]
    fn test_explicit_body_selects_fields_and_applies_defaults() {
        let recipe = ForwardingRecipe::new(
            "add_team_member",
            HttpMethod::Post,
            "/api/v1/companies/{company_id}/members",
        )
        .path_params(&["company_id"])
        .body(Fields::Only(&["user_email", "role"]))
        .defaults(&[("role", "member")]);

        let prepared = recipe
            .prepare(
                &base(),
                args(json!({"company_id": "c-1", "user_email": "a@b.c", "unrelated": 1})),
            )
            .unwrap();

        assert_eq!(prepared.url.path(), "/api/v1/companies/c-1/members");
        assert_eq!(prepared.body, Some(json!({"user_email": "a@b.c", "role": "member"})));
    }

    #[test]
    fn test_optional_body_fields_are_omitted() {
        let recipe = ForwardingRecipe::new("flag_bug", HttpMethod::Post, "/api/v1/admin/bugs/{bug_id}/flag")
            .path_params(&["bug_id"])
            .body(Fields::Only(&["reason", "notes"]))
            .required(&["reason"]);

        let prepared = recipe
            .prepare(&base(), args(json!({"bug_id": "b", "reason": "spam", "notes": null})))
            .unwrap();
        assert_eq!(prepared.body, Some(json!({"reason": "spam"})));

        let err = recipe.prepare(&base(), args(json!({"bug_id": "b"}))).unwrap_err();
        assert!(matches!(err, ForwardError::MissingArgument(ref f) if f == "reason"));
    }

    #[test]
    fn test_query_encoding() {
        let recipe = ForwardingRecipe::new("list_bug_reports", HttpMethod::Get, "/api/v1/bugs")
            .query(Fields::Remaining);

        let prepared = recipe
            .prepare(
                &base(),
                args(json!({"page": 2, "status": "open", "search": null, "verified": true, "tags": ["ui", "crash"]})),
            )
            .unwrap();

        let mut query = prepared.query.clone();
        query.sort();
        assert_eq!(
            query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "open".to_string()),
                ("tags".to_string(), "crash".to_string()),
                ("tags".to_string(), "ui".to_string()),
                ("verified".to_string(), "true".to_string()),
            ]
        );
        assert!(prepared.body.is_none());
    }

    #[test]
    fn test_get_and_delete_never_carry_body() {
        let recipe = ForwardingRecipe::new("odd", HttpMethod::Delete, "/api/v1/things")
            .body(Fields::Remaining);

        let prepared = recipe.prepare(&base(), args(json!({"x": 1}))).unwrap();
        assert!(prepared.body.is_none());
    }

    #[test]
    fn test_post_without_body_fields() {
        let recipe = ForwardingRecipe::new("restore_bug", HttpMethod::Post, "/api/v1/admin/bugs/{bug_id}/restore")
            .path_params(&["bug_id"]);

        let prepared = recipe.prepare(&base(), args(json!({"bug_id": "b"}))).unwrap();
        assert!(prepared.body.is_none());
    }

    #[test]
    fn test_non_string_auth_token_rejected() {
        let err = GET_BUG
            .prepare(&base(), args(json!({"bug_id": "x", "auth_token": 5})))
            .unwrap_err();
        assert!(matches!(err, ForwardError::InvalidArgument { ref field, .. } if field == AUTH_TOKEN_ARG));
    }
}

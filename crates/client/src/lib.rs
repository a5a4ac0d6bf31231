//! # BugRelay Client
//!
//! Request forwarding engine for the BugRelay REST API.
//!
//! A [`ForwardingRecipe`] describes how one logical operation maps onto an HTTP
//! call. [`RelayClient`] applies a recipe to an argument bag, attaches at most one
//! credential, issues exactly one request, and hands back the backend's JSON.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bugrelay_client::{Fields, Forward, ForwardingRecipe, HttpMethod, RelayClient};
//! use serde_json::json;
//!
//! const GET_BUG: ForwardingRecipe =
//!     ForwardingRecipe::new("get_bug_report", HttpMethod::Get, "/api/v1/bugs/{bug_id}")
//!         .path_params(&["bug_id"])
//!         .query(Fields::None);
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RelayClient::builder()
//!     .base_url("https://bugrelay.example.com")
//!     .api_key("br-your-api-key")
//!     .build()?;
//!
//! let args = json!({"bug_id": "abc-123"});
//! let bug = client
//!     .forward(&GET_BUG, args.as_object().cloned().unwrap_or_default())
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&bug)?);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod recipe;
pub mod transport;

pub use auth::{AuthScheme, Credentials, Session};
pub use client::{Forward, RelayClient, RelayClientBuilder};
pub use config::{ClientConfig, USER_AGENT};
pub use error::{normalize, ConfigError, ForwardError, ForwardResult, NormalizedError};
pub use recipe::{Fields, ForwardingRecipe, HttpMethod, PreparedRequest, SessionEffect, AUTH_TOKEN_ARG};
